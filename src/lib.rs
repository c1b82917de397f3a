//! # ldx
//!
//! Breadth-first file lister with content-kind filters, fuzzy ranking and a
//! slice selector.
//!
//! A listing walks one or more roots level by level inside a depth window,
//! optionally treating zip-like archives as directories. Each entry becomes
//! an [`Element`]; [`Filter`]s decide which survive, then a sequence of
//! [`Process`]es (sort, reverse, shuffle, slice) shapes the final list.
//!
//! # Quick Start
//!
//! ```rust
//! use ldx::{Classifier, Element, ListError, Source};
//! use ldx::engine::WalkConfig;
//!
//! struct NameSource(Vec<&'static str>);
//!
//! impl Source for NameSource {
//!     fn walk<'a>(
//!         &'a self,
//!         _config: &'a WalkConfig,
//!         classifier: &'a Classifier,
//!     ) -> Box<dyn Iterator<Item = Result<Element, ListError>> + 'a> {
//!         Box::new(self.0.iter().map(move |name| {
//!             Ok::<_, ListError>(Element::new(*name, *name, false, classifier))
//!         }))
//!     }
//! }
//!
//! let results = ldx::list()
//!     .source(NameSource(vec!["b.jpg", "notes.txt", "a.png", "clip.mp4"]))
//!     .include("image")
//!     .sort(ldx::SortBy::Name)
//!     .ascending(true)
//!     .run()
//!     .unwrap();
//!
//! let names: Vec<_> = results.elements.iter().map(|e| e.name.as_str()).collect();
//! assert_eq!(names, ["a.png", "b.jpg"]);
//! ```
//!
//! # Slice expressions
//!
//! `[n]`, `[a:b]`, `[a:+k]` and a trailing `=p` page size select parts of
//! the final list; see [`slice`] for the grammar.
//!
//! ```rust
//! let pages = ldx::slice::slice("[1=3]", &[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
//! assert_eq!(pages, [3, 4, 5]);
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod filter;
pub mod kind;
pub mod process;
pub mod query;
pub mod slice;
pub mod sort;

mod builder;
mod element;
mod error;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::{ListBuilder, Options};
pub use element::Element;
pub use error::ListError;
pub use kind::Classifier;
pub use results::{Results, ScanStats};
pub use slice::{SliceError, SliceExpr};
pub use sort::SortBy;
pub use traits::{Filter, Process, Source};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`ListBuilder`] to configure and run a listing.
///
/// With no configuration this lists the non-hidden children of `.` in
/// name order.
pub fn list() -> ListBuilder {
    ListBuilder::default()
}
