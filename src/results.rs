use std::path::PathBuf;
use std::time::Duration;

use crate::element::Element;
use crate::error::ListError;

/// The output of a completed listing.
pub struct Results {
    /// Elements that survived filtering, in pipeline order.
    pub elements: Vec<Element>,

    /// Traversal statistics.
    pub stats: ScanStats,

    /// Non-fatal errors encountered during traversal (permission denied, etc.).
    /// Only populated if `.collect_errors(true)` was set on the builder.
    pub errors: Vec<ListError>,
}

impl Results {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Paths of the listed elements, in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.elements.iter().map(|e| e.path.clone()).collect()
    }
}

impl IntoIterator for Results {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

/// Statistics for a completed traversal.
#[derive(Debug, Clone, Copy)]
pub struct ScanStats {
    /// Files yielded by the source, before filtering.
    pub files: usize,

    /// Directories yielded by the source, before filtering.
    pub dirs: usize,

    /// Wall-clock time from start to the end of the pipeline.
    pub duration: Duration,

    /// `(files + dirs) / duration`, 0 on zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    pub(crate) fn compute(files: usize, dirs: usize, duration: Duration) -> Self {
        let total = files + dirs;
        let eps = if duration.as_secs_f64() > 0.0 {
            (total as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
        Self {
            files,
            dirs,
            duration,
            entries_per_sec: eps,
        }
    }
}
