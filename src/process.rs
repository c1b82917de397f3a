//! Post-traversal stages and the pipeline that sequences them.
//!
//! Built-in stages are ordered as: query ranking (or key sort), reversal,
//! shuffle, then slice selection, followed by any caller-supplied processes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::builder::Options;
use crate::element::Element;
use crate::query::Scorer;
use crate::slice::SliceExpr;
use crate::sort::{sort_elements, SortBy};
use crate::traits::Process;

/// Ordered sequence of processes.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Process>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in stages described by `opts`.
    ///
    /// A malformed slice expression is logged and skipped, which leaves the
    /// list unchanged at that point of the pipeline.
    pub fn compose(opts: &Options) -> Self {
        let mut pipeline = Self::new();

        let ordered = if !opts.query.is_empty() {
            if opts.sort != SortBy::None {
                debug!(sort = ?opts.sort, "query is set, ignoring sort");
            }
            pipeline.push(QueryRank::new(&opts.query));
            true
        } else if opts.sort != SortBy::None {
            pipeline.push(KeySort(opts.sort));
            true
        } else {
            false
        };

        if ordered && opts.ascending {
            pipeline.push(Reverse);
        }

        if opts.shuffle {
            pipeline.push(Shuffle { seed: opts.seed });
        }

        for pattern in &opts.select {
            match SliceExpr::parse(pattern) {
                Ok(expr) => pipeline.push(Select(expr)),
                Err(e) => warn!(error = %e, "ignoring slice expression"),
            }
        }

        pipeline
    }

    pub fn push(&mut self, process: impl Process + 'static) {
        self.stages.push(Box::new(process));
    }

    pub fn extend(&mut self, processes: impl IntoIterator<Item = Box<dyn Process>>) {
        self.stages.extend(processes);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Process for Pipeline {
    fn apply(&self, elements: Vec<Element>) -> Vec<Element> {
        self.stages
            .iter()
            .fold(elements, |els, stage| stage.apply(els))
    }
}

// ---------------------------------------------------------------------------
// Built-in stages
// ---------------------------------------------------------------------------

/// Sort by a key in descending order.
pub struct KeySort(pub SortBy);

impl Process for KeySort {
    fn apply(&self, mut elements: Vec<Element>) -> Vec<Element> {
        sort_elements(self.0, &mut elements);
        elements
    }
}

pub struct Reverse;

impl Process for Reverse {
    fn apply(&self, mut elements: Vec<Element>) -> Vec<Element> {
        elements.reverse();
        elements
    }
}

/// Random permutation; reproducible when seeded.
pub struct Shuffle {
    pub seed: Option<u64>,
}

impl Process for Shuffle {
    fn apply(&self, mut elements: Vec<Element>) -> Vec<Element> {
        match self.seed {
            Some(seed) => elements.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => elements.shuffle(&mut rand::rng()),
        }
        elements
    }
}

/// Slice-expression selection.
pub struct Select(pub SliceExpr);

impl Process for Select {
    fn apply(&self, elements: Vec<Element>) -> Vec<Element> {
        self.0.select(elements)
    }
}

/// Fuzzy ranking: drops zero-score elements, best match first.
pub struct QueryRank {
    scorer: Scorer,
}

impl QueryRank {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        Self {
            scorer: Scorer::new(terms),
        }
    }
}

impl Process for QueryRank {
    fn apply(&self, elements: Vec<Element>) -> Vec<Element> {
        let mut scored: Vec<(f32, Element)> = elements
            .into_iter()
            .map(|el| (self.scorer.score(&el.name), el))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, el)| el).collect()
    }
}
