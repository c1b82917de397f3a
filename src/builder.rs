use std::path::PathBuf;

use tracing::debug;

use crate::engine::{run, EngineOptions, FsSource, WalkConfig};
use crate::error::ListError;
use crate::filter::FilterSet;
use crate::kind::Classifier;
use crate::process::Pipeline;
use crate::results::Results;
use crate::slice::SliceExpr;
use crate::sort::SortBy;
use crate::traits::{Filter, Process, Source};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Plain listing configuration.
///
/// Every field has a neutral default: list the children of `.`, keep
/// everything, leave traversal order alone.
#[derive(Debug, Clone)]
pub struct Options {
    /// Paths to start from. Empty means `.`.
    pub roots:        Vec<PathBuf>,
    pub from_depth:   usize,
    /// Inclusive. `None` recurses without bound.
    pub to_depth:     Option<usize>,
    /// Slice expression overriding both depth fields, e.g. `[1:3]`.
    pub depth_pattern: Option<String>,
    pub archive:      bool,
    pub no_hide:      bool,
    pub max_per_dir:  Option<usize>,

    pub only_files:   bool,
    pub only_dirs:    bool,
    /// Kind tokens; an element must carry at least one.
    pub include:      Vec<String>,
    /// Kind tokens; an element must carry none.
    pub exclude:      Vec<String>,
    /// Name search terms, see [`SearchTerm`](crate::filter::SearchTerm).
    pub search:       Vec<String>,
    pub search_all:   bool,
    /// Path substrings to drop.
    pub ignore:       Vec<String>,

    pub sort:         SortBy,
    pub ascending:    bool,
    pub shuffle:      bool,
    pub seed:         Option<u64>,
    /// Slice expressions applied in order after sorting.
    pub select:       Vec<String>,
    /// Fuzzy ranking terms. Overrides `sort` when non-empty.
    pub query:        Vec<String>,

    pub absolute:     bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            roots:         Vec::new(),
            from_depth:    0,
            to_depth:      Some(0),
            depth_pattern: None,
            archive:       false,
            no_hide:       false,
            max_per_dir:   None,
            only_files:    false,
            only_dirs:     false,
            include:       Vec::new(),
            exclude:       Vec::new(),
            search:        Vec::new(),
            search_all:    false,
            ignore:        Vec::new(),
            sort:          SortBy::None,
            ascending:     false,
            shuffle:       false,
            seed:          None,
            select:        Vec::new(),
            query:         Vec::new(),
            absolute:      false,
        }
    }
}

// ---------------------------------------------------------------------------
// ListBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and running a listing.
///
/// Created via [`ldx::list()`](crate::list). Configure with chained
/// builder methods, then call [`run()`](ListBuilder::run).
///
/// # Example
///
/// ```rust,no_run
/// let results = ldx::list()
///     .root("photos")
///     .recurse()
///     .include("image")
///     .sort(ldx::SortBy::Modified)
///     .select("[:20]")
///     .run()?;
/// # Ok::<(), ldx::ListError>(())
/// ```
#[derive(Default)]
pub struct ListBuilder {
    opts:           Options,
    classifier:     Option<Classifier>,
    source:         Option<Box<dyn Source>>,
    filters:        Vec<Box<dyn Filter>>,
    processes:      Vec<Box<dyn Process>>,
    collect_errors: bool,
}

impl ListBuilder {
    /// Start from a prepared [`Options`] value.
    pub fn from_options(opts: Options) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.roots.push(path.into());
        self
    }

    pub fn roots(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.opts.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    /// First depth whose entries are listed. Children of a root are depth 0.
    pub fn from_depth(mut self, d: usize) -> Self {
        self.opts.from_depth = d;
        self
    }

    /// Last depth traversed, inclusive. Defaults to `0`.
    pub fn to_depth(mut self, d: usize) -> Self {
        self.opts.to_depth = Some(d);
        self
    }

    /// Set the depth window from a slice expression: `[1:3]`, `[2:]`, `[4]`.
    ///
    /// Parsed in [`run()`](ListBuilder::run).
    pub fn depth(mut self, pattern: impl Into<String>) -> Self {
        self.opts.depth_pattern = Some(pattern.into());
        self
    }

    /// Remove the upper depth bound.
    pub fn recurse(mut self) -> Self {
        self.opts.to_depth = None;
        self
    }

    /// Expand `.zip`/`.cbz` files as directories.
    pub fn archive(mut self, yes: bool) -> Self {
        self.opts.archive = yes;
        self
    }

    /// List dotfiles and other hidden names too.
    pub fn no_hide(mut self, yes: bool) -> Self {
        self.opts.no_hide = yes;
        self
    }

    /// Read at most `n` visible entries from each directory or archive.
    pub fn max_per_dir(mut self, n: usize) -> Self {
        self.opts.max_per_dir = Some(n);
        self
    }

    // ── Filters ───────────────────────────────────────────────────────────

    pub fn only_files(mut self) -> Self {
        self.opts.only_files = true;
        self
    }

    /// Takes precedence over [`only_files`](ListBuilder::only_files).
    pub fn only_dirs(mut self) -> Self {
        self.opts.only_dirs = true;
        self
    }

    /// Keep elements of a kind, e.g. `"image"` or `"v"`. Repeatable.
    pub fn include(mut self, kind: impl Into<String>) -> Self {
        self.opts.include.push(kind.into());
        self
    }

    pub fn exclude(mut self, kind: impl Into<String>) -> Self {
        self.opts.exclude.push(kind.into());
        self
    }

    /// Add a name search term. Terms combine with OR unless
    /// [`search_all`](ListBuilder::search_all) is set.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.opts.search.push(term.into());
        self
    }

    pub fn search_all(mut self, yes: bool) -> Self {
        self.opts.search_all = yes;
        self
    }

    /// Drop elements whose path contains `sub`.
    pub fn ignore(mut self, sub: impl Into<String>) -> Self {
        self.opts.ignore.push(sub.into());
        self
    }

    /// Add a custom filter. Runs after the built-in ones.
    pub fn filter(mut self, f: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(f));
        self
    }

    // ── Processing ────────────────────────────────────────────────────────

    pub fn sort(mut self, by: SortBy) -> Self {
        self.opts.sort = by;
        self
    }

    /// Reverse the sort or ranking order.
    pub fn ascending(mut self, yes: bool) -> Self {
        self.opts.ascending = yes;
        self
    }

    /// Shuffle the list. A seed makes the permutation reproducible.
    pub fn shuffle(mut self, seed: Option<u64>) -> Self {
        self.opts.shuffle = true;
        self.opts.seed = seed;
        self
    }

    /// Add a slice expression, e.g. `"[:10]"` or `"[2=25]"`.
    pub fn select(mut self, pattern: impl Into<String>) -> Self {
        self.opts.select.push(pattern.into());
        self
    }

    /// Rank by fuzzy similarity to `term`. Overrides [`sort`](ListBuilder::sort).
    pub fn query(mut self, term: impl Into<String>) -> Self {
        self.opts.query.push(term.into());
        self
    }

    /// Add a custom process. Runs after the built-in stages.
    pub fn process(mut self, p: impl Process + 'static) -> Self {
        self.processes.push(Box::new(p));
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Resolve roots to absolute paths before listing.
    pub fn absolute(mut self, yes: bool) -> Self {
        self.opts.absolute = yes;
        self
    }

    /// Replace the default extension table.
    pub fn classifier(mut self, c: Classifier) -> Self {
        self.classifier = Some(c);
        self
    }

    /// List from a custom [`Source`] instead of the filesystem. Roots are
    /// ignored.
    pub fn source(mut self, s: impl Source + 'static) -> Self {
        self.source = Some(Box::new(s));
        self
    }

    /// Collect non-fatal errors into [`Results::errors`].
    ///
    /// Disabled by default. Recoverable errors are logged either way.
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Run the listing.
    ///
    /// # Errors
    ///
    /// Returns `Err` for configuration errors (bad depth pattern, unknown
    /// kind token) and for fatal traversal errors such as an unreadable
    /// archive. Unreadable directories are skipped and, with
    /// `.collect_errors(true)`, reported in [`Results::errors`].
    pub fn run(self) -> Result<Results, ListError> {
        let mut opts = self.opts;

        if let Some(pattern) = opts.depth_pattern.take() {
            let (from, to) = pattern
                .parse::<SliceExpr>()
                .and_then(|expr| expr.depth_window())
                .map_err(|reason| ListError::InvalidSlice {
                    pattern: pattern.clone(),
                    reason,
                })?;
            opts.from_depth = from;
            opts.to_depth = to;
        }

        let mut filters = FilterSet::compose(&opts)?;
        filters.extend(self.filters);
        let mut pipeline = Pipeline::compose(&opts);
        pipeline.extend(self.processes);

        let source = match self.source {
            Some(s) => s,
            None => Box::new(FsSource::new(resolve_roots(&opts)?)),
        };

        debug!(
            from = opts.from_depth,
            to = ?opts.to_depth,
            filters = filters.len(),
            stages = pipeline.len(),
            "starting listing"
        );

        run(EngineOptions {
            config: WalkConfig {
                from_depth:  opts.from_depth,
                to_depth:    opts.to_depth,
                archive:     opts.archive,
                no_hide:     opts.no_hide,
                max_per_dir: opts.max_per_dir,
                key:         opts.sort,
            },
            source,
            classifier: self.classifier.unwrap_or_default(),
            filters,
            pipeline,
            collect_errors: self.collect_errors,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_roots(opts: &Options) -> Result<Vec<PathBuf>, ListError> {
    let roots = if opts.roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        opts.roots.clone()
    };
    if !opts.absolute {
        return Ok(roots);
    }
    roots
        .into_iter()
        .map(|root| {
            std::path::absolute(&root).map_err(|source| ListError::Io { path: root, source })
        })
        .collect()
}
