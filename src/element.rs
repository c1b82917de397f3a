use std::path::PathBuf;

use crate::kind::{Classifier, ZIP_LIKE};

/// A single item produced by a [`Source`](crate::traits::Source) during traversal.
///
/// `mask` is computed once, from the extension, when the element is created.
/// Pipeline stages reorder and subset elements but never rewrite them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Base name of the entry.
    pub name: String,

    /// Path relative to the root argument that produced it (absolute when
    /// the root was made absolute).
    pub path: PathBuf,

    /// Numeric sort key: modification time, size or creation time,
    /// depending on the active sort mode. `0` when no numeric sort is active.
    pub vany: i64,

    /// Content-kind bitmask, see [`kind`](crate::kind).
    pub mask: u32,

    pub is_dir: bool,

    /// Set for entries read from inside a zip-like archive.
    pub is_archive: bool,

    /// Traversal depth the entry was found at. Children of a root = 0.
    pub depth: usize,
}

impl Element {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        is_dir: bool,
        classifier: &Classifier,
    ) -> Self {
        let name = name.into();
        let mask = classifier.mask_of(&name);
        Self {
            name,
            path: path.into(),
            vany: 0,
            mask,
            is_dir,
            is_archive: false,
            depth: 0,
        }
    }

    /// Mark the element as an archive member. Also sets the zip-like bit.
    pub(crate) fn in_archive(mut self) -> Self {
        self.is_archive = true;
        self.mask |= ZIP_LIKE;
        self
    }

    pub(crate) fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub(crate) fn with_value(mut self, vany: i64) -> Self {
        self.vany = vany;
        self
    }
}
