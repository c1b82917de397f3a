use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use crate::element::Element;
use crate::error::ListError;

/// Sort key selected for a run.
///
/// Numeric keys are read into [`Element::vany`] during traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Keep traversal order.
    #[default]
    None,
    Name,
    Modified,
    Size,
    Creation,
}

impl SortBy {
    /// Whether this key needs a numeric value collected per entry.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Modified | Self::Size | Self::Creation)
    }
}

impl FromStr for SortBy {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(Self::None),
            "name" | "n" => Ok(Self::Name),
            "mod" | "time" | "t" | "date" => Ok(Self::Modified),
            "size" | "s" => Ok(Self::Size),
            "creation" | "c" => Ok(Self::Creation),
            other => Err(ListError::InvalidSort(other.to_string())),
        }
    }
}

/// Compare two strings treating embedded digit runs as numbers.
///
/// Other characters compare case-insensitively; strings equal under those
/// rules fall back to plain byte order so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        let ord = match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                cmp_digit_runs(&take_digits(&mut ai), &take_digits(&mut bi))
            }
            (Some(x), Some(y)) => {
                ai.next();
                bi.next();
                x.to_lowercase().cmp(y.to_lowercase())
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(it: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = it.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

// Compares digit runs of any length without parsing them.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort in the base (descending) order for `by`. Stable.
///
/// Every key sorts descending, names included: `file10`, `file2`, `file1`.
/// An a-to-z listing is `Name` followed by a reversal, which is what the
/// `ascending` option adds to the pipeline.
pub fn sort_elements(by: SortBy, elements: &mut [Element]) {
    match by {
        SortBy::None => {}
        SortBy::Name => elements.sort_by(|a, b| natural_cmp(&b.name, &a.name)),
        SortBy::Modified | SortBy::Size | SortBy::Creation => {
            elements.sort_by(|a, b| b.vany.cmp(&a.vany))
        }
    }
}
