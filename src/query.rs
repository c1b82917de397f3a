//! n-gram overlap scoring for fuzzy queries.

use std::collections::HashMap;

/// Default n-gram size.
pub const NGRAM: usize = 3;

/// Scores candidate strings against a fixed set of query terms.
///
/// The score of a candidate is the sum, over every query n-gram it contains,
/// of `occurrences * query_weight / distinct_query_ngrams`. A candidate that
/// shares no n-gram with the query scores exactly `0.0`.
#[derive(Debug, Clone)]
pub struct Scorer {
    grams: HashMap<String, u32>,
    n: usize,
}

impl Scorer {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        Self::with_ngram(terms, NGRAM)
    }

    pub fn with_ngram<S: AsRef<str>>(terms: &[S], n: usize) -> Self {
        let mut grams = HashMap::new();
        for term in terms {
            count_ngrams(&term.as_ref().to_lowercase(), n, &mut grams);
        }
        Self { grams, n }
    }

    /// `true` when the query produced no n-grams (every term shorter than n).
    pub fn is_empty(&self) -> bool {
        self.grams.is_empty()
    }

    pub fn score(&self, candidate: &str) -> f32 {
        if self.grams.is_empty() {
            return 0.0;
        }
        let mut found = HashMap::new();
        count_ngrams(&candidate.to_lowercase(), self.n, &mut found);

        let total = self.grams.len() as f32;
        self.grams
            .iter()
            .filter_map(|(gram, weight)| found.get(gram).map(|hits| (hits * weight) as f32 / total))
            .sum()
    }
}

fn count_ngrams(s: &str, n: usize, into: &mut HashMap<String, u32>) {
    if n == 0 {
        return;
    }
    let chars: Vec<char> = s.chars().collect();
    for window in chars.windows(n) {
        *into.entry(window.iter().collect()).or_insert(0) += 1;
    }
}
