//! Traversal-time predicates and their composition.
//!
//! Every configured category contributes one filter; an element survives
//! only if all of them accept it. Unconfigured categories add nothing, so an
//! empty configuration accepts everything.

use crate::builder::Options;
use crate::element::Element;
use crate::error::ListError;
use crate::kind::{as_mask, str_to_mask};
use crate::query::Scorer;
use crate::traits::Filter;

/// All-of combination of filters.
#[derive(Default)]
pub struct FilterSet {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the filters described by `opts`.
    ///
    /// # Errors
    ///
    /// [`ListError::InvalidKind`] for an unknown kind token in the
    /// include/exclude lists or in a `+kind` search term.
    pub fn compose(opts: &Options) -> Result<Self, ListError> {
        let mut set = Self::new();

        // Directory-only wins when both are requested.
        if opts.only_dirs {
            set.push(OnlyDirs);
        } else if opts.only_files {
            set.push(OnlyFiles);
        }

        let include = as_mask(&opts.include)?;
        if include != 0 {
            set.push(IncludeMask(include));
        }
        let exclude = as_mask(&opts.exclude)?;
        if exclude != 0 {
            set.push(ExcludeMask(exclude));
        }

        if !opts.ignore.is_empty() {
            set.push(IgnorePaths(opts.ignore.clone()));
        }

        if !opts.search.is_empty() {
            set.push(Search::new(&opts.search, opts.search_all)?);
        }

        Ok(set)
    }

    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn extend(&mut self, filters: impl IntoIterator<Item = Box<dyn Filter>>) {
        self.filters.extend(filters);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for FilterSet {
    fn is_match(&self, element: &Element) -> bool {
        self.filters.iter().all(|f| f.is_match(element))
    }
}

// ---------------------------------------------------------------------------
// Built-in filters
// ---------------------------------------------------------------------------

pub struct OnlyDirs;

impl Filter for OnlyDirs {
    fn is_match(&self, element: &Element) -> bool {
        element.is_dir
    }
}

pub struct OnlyFiles;

impl Filter for OnlyFiles {
    fn is_match(&self, element: &Element) -> bool {
        !element.is_dir
    }
}

/// Keeps elements sharing at least one kind bit with the mask.
pub struct IncludeMask(pub u32);

impl Filter for IncludeMask {
    fn is_match(&self, element: &Element) -> bool {
        element.mask & self.0 != 0
    }
}

/// Drops elements sharing any kind bit with the mask.
pub struct ExcludeMask(pub u32);

impl Filter for ExcludeMask {
    fn is_match(&self, element: &Element) -> bool {
        element.mask & self.0 == 0
    }
}

/// Drops elements whose path contains any of the substrings.
pub struct IgnorePaths(pub Vec<String>);

impl Filter for IgnorePaths {
    fn is_match(&self, element: &Element) -> bool {
        let path = element.path.to_string_lossy();
        !self.0.iter().any(|sub| path.contains(sub.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TermMatcher {
    Exact(String),
    Fuzzy(Scorer),
    Kind(u32),
    Substring(String),
}

/// One search term with its sigils resolved.
///
/// | term      | matches when                                  |
/// |-----------|-----------------------------------------------|
/// | `abc`     | name contains `abc`                           |
/// | `=abc`    | name equals `abc`                             |
/// | `~abc`    | name shares at least one n-gram with `abc`    |
/// | `+image`  | element has the `image` kind bit              |
/// | `-...`    | any of the above, negated                     |
///
/// Name comparisons ignore case.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    negate: bool,
    matcher: TermMatcher,
}

impl SearchTerm {
    pub fn parse(term: &str) -> Result<Self, ListError> {
        let (negate, rest) = match term.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, term),
        };
        let matcher = if let Some(s) = rest.strip_prefix('=') {
            TermMatcher::Exact(s.to_lowercase())
        } else if let Some(s) = rest.strip_prefix('~') {
            TermMatcher::Fuzzy(Scorer::new(&[s]))
        } else if let Some(s) = rest.strip_prefix('+') {
            TermMatcher::Kind(str_to_mask(s).ok_or_else(|| ListError::InvalidKind(s.to_string()))?)
        } else {
            TermMatcher::Substring(rest.to_lowercase())
        };
        Ok(Self { negate, matcher })
    }

    pub fn is_match(&self, element: &Element) -> bool {
        let hit = match &self.matcher {
            TermMatcher::Exact(s) => element.name.to_lowercase() == *s,
            TermMatcher::Fuzzy(scorer) => scorer.score(&element.name) > 0.0,
            TermMatcher::Kind(mask) => element.mask & mask != 0,
            TermMatcher::Substring(s) => element.name.to_lowercase().contains(s.as_str()),
        };
        hit != self.negate
    }
}

/// Any-of (default) or all-of combination of search terms.
pub struct Search {
    terms: Vec<SearchTerm>,
    all: bool,
}

impl Search {
    pub fn new<S: AsRef<str>>(terms: &[S], all: bool) -> Result<Self, ListError> {
        let terms = terms
            .iter()
            .map(|t| SearchTerm::parse(t.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { terms, all })
    }
}

impl Filter for Search {
    fn is_match(&self, element: &Element) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        if self.all {
            self.terms.iter().all(|t| t.is_match(element))
        } else {
            self.terms.iter().any(|t| t.is_match(element))
        }
    }
}
