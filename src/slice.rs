//! Bracketed index/range selector with negative indexing, relative right
//! bounds and pagination.
//!
//! ```text
//! [n]        element n (negative counts from the end, -0 is the end)
//! [a:b]      elements a..b, either side optional or negative
//! [a:+k]     k elements starting at a
//! [...=p]    every index is multiplied by the page size p
//! [=p]       same as [0:1=p], the first page
//! ```
//!
//! Resolved bounds are clamped into `0..=len` and `from` never exceeds `to`,
//! so a well-formed expression never fails on any input; it degrades to an
//! empty or boundary selection instead.

use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::error::ListError;

const PAGE_TOKEN: char = '=';

/// Why a slice expression was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("expression must be enclosed in brackets")]
    Unbracketed,

    #[error("expression is empty")]
    Empty,

    #[error("unexpected character `{0}`")]
    BadChar(char),

    #[error("more than one colon")]
    TooManyColons,

    #[error("`{0}` is not an integer")]
    BadInteger(String),

    #[error("page size must not be negative")]
    NegativePageSize,

    #[error("`+` is only allowed on the right bound")]
    MisplacedPlus,

    #[error("negative indices cannot bound traversal depth")]
    NegativeDepth,
}

/// An index as written. A minus sign counts from the end, so `-0` is the
/// end of the sequence rather than its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Index {
    Start(i128),
    End(i128),
}

/// Right-hand bound of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Abs(Index),
    /// `+k`: k past the resolved left bound.
    Rel(i128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selector {
    Index(Index),
    Range { from: Option<Index>, to: Option<Bound> },
}

/// A parsed slice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceExpr {
    selector: Selector,
    page: i128,
}

impl FromStr for SliceExpr {
    type Err = SliceError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let inner = pattern
            .strip_prefix('[')
            .and_then(|p| p.strip_suffix(']'))
            .ok_or(SliceError::Unbracketed)?;
        if inner.is_empty() {
            return Err(SliceError::Empty);
        }
        if let Some(c) = inner
            .chars()
            .find(|c| !(c.is_ascii_digit() || matches!(*c, '-' | '+' | ':' | PAGE_TOKEN)))
        {
            return Err(SliceError::BadChar(c));
        }

        let (body, page) = match inner.split_once(PAGE_TOKEN) {
            Some((body, page)) => (body, parse_page(page)?),
            None => (inner, 1),
        };

        if body.matches(':').count() > 1 {
            return Err(SliceError::TooManyColons);
        }

        let selector = match body.split_once(':') {
            // `[=p]` is the first page.
            None if body.is_empty() => Selector::Range {
                from: Some(Index::Start(0)),
                to: Some(Bound::Abs(Index::Start(1))),
            },
            None => Selector::Index(parse_index(body)?),
            Some((from, to)) => Selector::Range {
                from: (!from.is_empty()).then(|| parse_index(from)).transpose()?,
                to: (!to.is_empty()).then(|| parse_bound(to)).transpose()?,
            },
        };

        Ok(Self { selector, page })
    }
}

fn parse_digits(s: &str) -> Result<i128, SliceError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SliceError::BadInteger(s.to_string()));
    }
    s.parse()
        .map_err(|_| SliceError::BadInteger(s.to_string()))
}

fn parse_index(s: &str) -> Result<Index, SliceError> {
    if s.starts_with('+') {
        return Err(SliceError::MisplacedPlus);
    }
    match s.strip_prefix('-') {
        Some(rest) => parse_digits(rest).map(Index::End),
        None => parse_digits(s).map(Index::Start),
    }
}

fn parse_bound(s: &str) -> Result<Bound, SliceError> {
    match s.strip_prefix('+') {
        Some(rest) => parse_digits(rest).map(Bound::Rel),
        None => parse_index(s).map(Bound::Abs),
    }
}

fn parse_page(s: &str) -> Result<i128, SliceError> {
    match s.strip_prefix('-') {
        Some(rest) => {
            parse_digits(rest)?;
            Err(SliceError::NegativePageSize)
        }
        None if s.starts_with('+') => Err(SliceError::MisplacedPlus),
        None => parse_digits(s),
    }
}

impl SliceExpr {
    /// Parse `pattern`, wrapping failures in [`ListError::InvalidSlice`].
    pub fn parse(pattern: &str) -> Result<Self, ListError> {
        pattern.parse().map_err(|reason| ListError::InvalidSlice {
            pattern: pattern.to_string(),
            reason,
        })
    }

    pub fn page_size(&self) -> usize {
        usize::try_from(self.page).unwrap_or(usize::MAX)
    }

    /// Unclamped `(from, to)` against a sequence of `len` items.
    fn bounds(&self, len: i128) -> (i128, i128) {
        let p = self.page;
        let abs = |i: Index| match i {
            Index::Start(n) => n.saturating_mul(p),
            Index::End(k) => len.saturating_sub(k.saturating_mul(p)),
        };
        match self.selector {
            Selector::Index(n) => {
                let from = abs(n);
                (from, from.saturating_add(p))
            }
            Selector::Range { from, to } => {
                let from = from.map_or(0, abs);
                let to = match to {
                    None => len,
                    Some(Bound::Rel(k)) => from.saturating_add(k.saturating_mul(p)),
                    Some(Bound::Abs(n)) => abs(n),
                };
                (from, to)
            }
        }
    }

    /// Concrete index range for a sequence of `len` items.
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let l = len as i128;
        let (from, to) = self.bounds(l);
        debug!(from = %from, to = %to, page = %self.page, len, "slice bounds");
        let to = to.clamp(0, l);
        let from = from.clamp(0, to);
        // Both values lie in 0..=len here.
        from as usize..to as usize
    }

    /// Keep only the selected part of `input`.
    pub fn select<T>(&self, mut input: Vec<T>) -> Vec<T> {
        let range = self.resolve(input.len());
        input.truncate(range.end);
        input.drain(..range.start);
        input
    }

    /// Interpret the expression as an inclusive depth window.
    ///
    /// `[a:b]` maps to `a..=b`, `[a:]` leaves the upper end unbounded and
    /// `[n]` selects exactly one page of depths.
    pub fn depth_window(&self) -> Result<(usize, Option<usize>), SliceError> {
        let p = self.page;
        let scaled = |n: i128| to_usize(n.saturating_mul(p));
        let start = |i: Index| match i {
            Index::Start(n) => Ok(scaled(n)),
            Index::End(_) => Err(SliceError::NegativeDepth),
        };
        match self.selector {
            Selector::Index(i) => {
                let from = start(i)?;
                let to = from.saturating_add(self.page_size().saturating_sub(1));
                Ok((from, Some(to)))
            }
            Selector::Range { from, to } => {
                let from = from.map_or(Ok(0), start)?;
                let to = match to {
                    None => None,
                    Some(Bound::Abs(i)) => Some(start(i)?),
                    Some(Bound::Rel(k)) => Some(from.saturating_add(scaled(k))),
                };
                Ok((from, to))
            }
        }
    }
}

fn to_usize(v: i128) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

/// Apply `pattern` to a copy of `input`.
pub fn slice<T: Clone>(pattern: &str, input: &[T]) -> Result<Vec<T>, ListError> {
    let expr = SliceExpr::parse(pattern)?;
    Ok(expr.select(input.to_vec()))
}
