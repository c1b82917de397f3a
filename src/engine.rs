use std::collections::VecDeque;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use ignore::{DirEntry, WalkBuilder};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::element::Element;
use crate::error::ListError;
use crate::filter::FilterSet;
use crate::kind::Classifier;
use crate::process::Pipeline;
use crate::results::{Results, ScanStats};
use crate::sort::SortBy;
use crate::traits::{Filter, Process, Source};

/// Names skipped during traversal unless hiding is disabled.
/// Anything starting with `.` is hidden as well.
const HIDDEN_NAMES: &[&str] = &[
    "node_modules",
    "lost+found",
    "__MACOSX",
    "__pycache__",
    "$RECYCLE.BIN",
    "System Volume Information",
    "Thumbs.db",
    "desktop.ini",
];

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || HIDDEN_NAMES.contains(&name)
}

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Traversal parameters passed from the builder to a [`Source`].
#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// First depth whose entries are yielded.
    pub from_depth: usize,
    /// Last depth traversed, inclusive. `None` is unbounded.
    pub to_depth: Option<usize>,
    /// Expand zip-like files as directories.
    pub archive: bool,
    /// Disable hiding of dotfiles and [`HIDDEN_NAMES`].
    pub no_hide: bool,
    /// Cap on entries considered per directory listing.
    pub max_per_dir: Option<usize>,
    /// Which numeric value to read into [`Element::vany`].
    pub key: SortBy,
}

impl WalkConfig {
    fn past_end(&self, depth: usize) -> bool {
        self.to_depth.is_some_and(|to| depth > to)
    }

    fn limit_reached(&self, considered: usize) -> bool {
        self.max_per_dir.is_some_and(|max| considered >= max)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One member of a zip-like archive, read while the archive was open.
#[derive(Debug, Clone)]
struct ArchiveMember {
    /// Normalised path inside the archive, `/`-separated, no trailing `/`.
    name: String,
    is_dir: bool,
    size: u64,
    modified: i64,
}

/// Directory-listing or archive entry, seen through the same surface.
enum Item {
    Real(DirEntry),
    Archive(ArchiveMember),
}

impl Item {
    fn name(&self) -> String {
        match self {
            Self::Real(entry) => entry.file_name().to_string_lossy().into_owned(),
            Self::Archive(member) => member
                .name
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn is_dir(&self) -> bool {
        match self {
            Self::Real(entry) => entry.file_type().is_some_and(|ft| ft.is_dir()),
            Self::Archive(member) => member.is_dir,
        }
    }

    fn value(&self, key: SortBy) -> i64 {
        match self {
            Self::Real(entry) => real_value(entry, key),
            Self::Archive(member) => match key {
                SortBy::Modified => member.modified,
                SortBy::Size => i64::try_from(member.size).unwrap_or(i64::MAX),
                SortBy::Creation | SortBy::Name | SortBy::None => 0,
            },
        }
    }
}

fn real_value(entry: &DirEntry, key: SortBy) -> i64 {
    if !key.is_numeric() {
        return 0;
    }
    let meta = match entry.metadata() {
        Ok(meta) => meta,
        Err(err) => {
            debug!(path = %entry.path().display(), error = %err, "no metadata");
            return 0;
        }
    };
    let time = match key {
        SortBy::Size => return i64::try_from(meta.len()).unwrap_or(i64::MAX),
        SortBy::Modified => meta.modified(),
        _ => meta.created(),
    };
    match time {
        Ok(t) => unix_seconds(t),
        Err(err) => {
            debug!(path = %entry.path().display(), error = %err, "timestamp unavailable");
            0
        }
    }
}

fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

fn zip_timestamp(dt: zip::DateTime) -> Option<i64> {
    NaiveDate::from_ymd_opt(dt.year().into(), dt.month().into(), dt.day().into())?
        .and_hms_opt(dt.hour().into(), dt.minute().into(), dt.second().into())
        .map(|t| t.and_utc().timestamp())
}

/// Read every member record of a zip-like archive. The archive is closed on
/// return.
fn read_archive(path: &Path) -> Result<Vec<ArchiveMember>, ListError> {
    let fail = |source: ZipError| ListError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| fail(e.into()))?;
    let mut archive = ZipArchive::new(file).map_err(fail)?;

    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(fail)?;
        let Some(name) = file.enclosed_name().as_deref().and_then(member_name) else {
            debug!(archive = %path.display(), member = file.name(), "skipping unsafe member name");
            continue;
        };
        members.push(ArchiveMember {
            name,
            is_dir: file.is_dir(),
            size: file.size(),
            modified: file.last_modified().and_then(zip_timestamp).unwrap_or(0),
        });
    }
    Ok(members)
}

/// Join the normal components of an in-archive path with `/`.
///
/// `..` pops a component; climbing above the archive root, or a name with
/// no components left, yields `None`.
fn member_name(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Drop a leading `./` so listings of `.` read `a.jpg`, not `./a.jpg`.
fn clean_path(path: &Path) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// FsSource
// ---------------------------------------------------------------------------

/// Breadth-first filesystem traversal over one or more roots.
pub struct FsSource {
    roots: Vec<PathBuf>,
}

impl FsSource {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }
}

impl Source for FsSource {
    fn walk<'a>(
        &'a self,
        config: &'a WalkConfig,
        classifier: &'a Classifier,
    ) -> Box<dyn Iterator<Item = Result<Element, ListError>> + 'a> {
        Box::new(FsWalk {
            config,
            classifier,
            depth: 0,
            frontier: self.roots.iter().cloned().collect(),
            next: Vec::new(),
            pending: VecDeque::new(),
            done: false,
        })
    }
}

/// Level-by-level walk state.
///
/// Each step expands one frontier path into `pending`; children that are
/// directories (or zip-like files in archive mode) join the next level.
struct FsWalk<'a> {
    config: &'a WalkConfig,
    classifier: &'a Classifier,
    depth: usize,
    frontier: VecDeque<PathBuf>,
    next: Vec<PathBuf>,
    pending: VecDeque<Result<Element, ListError>>,
    done: bool,
}

impl Iterator for FsWalk<'_> {
    type Item = Result<Element, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.done {
                return None;
            }
            self.step();
        }
    }
}

impl FsWalk<'_> {
    fn step(&mut self) {
        let Some(path) = self.frontier.pop_front() else {
            if self.next.is_empty() {
                self.done = true;
                return;
            }
            self.frontier.extend(self.next.drain(..));
            self.depth += 1;
            if self.config.past_end(self.depth) {
                debug!(depth = self.depth, "depth window exhausted");
                self.done = true;
            }
            return;
        };

        let is_archive = self.config.archive && self.classifier.is_zip_like(&path);
        debug!(dir = %path.display(), depth = self.depth, is_archive, "traversing");

        if is_archive {
            // Archive failures end the walk.
            if let Err(err) = self.expand_archive(&path) {
                self.pending.push_back(Err(err));
                self.done = true;
            }
        } else {
            self.expand_dir(&path);
        }
    }

    fn element(&self, item: &Item, path: PathBuf, depth: usize) -> Element {
        let el = Element::new(item.name(), path, item.is_dir(), self.classifier)
            .at_depth(depth)
            .with_value(item.value(self.config.key));
        match item {
            Item::Archive(_) => el.in_archive(),
            Item::Real(_) => el,
        }
    }

    fn expand_dir(&mut self, dir: &Path) {
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .hidden(false)
            .parents(false)
            .ignore(false)
            .follow_links(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut considered = 0;
        for res in walker {
            let entry = match res {
                Ok(entry) => entry,
                Err(err) => {
                    self.pending.push_back(Err(map_ignore_error(err)));
                    continue;
                }
            };

            if entry.depth() == 0 {
                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    self.pending
                        .push_back(Err(ListError::NotADirectory(dir.to_path_buf())));
                }
                continue;
            }

            let path = clean_path(entry.path());
            let item = Item::Real(entry);
            if !self.config.no_hide && is_hidden(&item.name()) {
                continue;
            }
            if self.config.limit_reached(considered) {
                debug!(dir = %dir.display(), considered, "per-directory limit reached");
                break;
            }
            considered += 1;

            if item.is_dir() {
                self.next.push(path.clone());
            } else if self.config.archive && self.classifier.is_zip_like(&path) {
                // Expanded on the next level, never a leaf.
                self.next.push(path);
                continue;
            }

            if self.depth < self.config.from_depth {
                continue;
            }
            let el = self.element(&item, path, self.depth);
            self.pending.push_back(Ok(el));
        }
    }

    fn expand_archive(&mut self, archive: &Path) -> Result<(), ListError> {
        let members = read_archive(archive)?;
        debug!(archive = %archive.display(), members = members.len(), "archive read");

        let mut considered = 0;
        for member in members {
            let inner = member.name.as_str();
            if !self.config.no_hide && inner.split('/').any(is_hidden) {
                continue;
            }
            if self.config.limit_reached(considered) {
                debug!(archive = %archive.display(), considered, "per-archive limit reached");
                break;
            }
            considered += 1;

            let depth = self.depth + inner.matches('/').count();
            if depth < self.config.from_depth || self.config.past_end(depth) {
                continue;
            }
            let path = archive.join(inner);
            let item = Item::Archive(member);
            let el = self.element(&item, path, depth);
            self.pending.push_back(Ok(el));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions {
    pub config: WalkConfig,
    pub source: Box<dyn Source>,
    pub classifier: Classifier,
    pub filters: FilterSet,
    pub pipeline: Pipeline,
    pub collect_errors: bool,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Walk the source, filter every element, then run the pipeline over the
/// survivors.
///
/// Recoverable errors are logged and skipped; the first fatal error aborts.
pub(crate) fn run(opts: EngineOptions) -> Result<Results, ListError> {
    let start = Instant::now();

    let mut elements = Vec::new();
    let mut errors = Vec::new();
    let mut files = 0;
    let mut dirs = 0;

    for item in opts.source.walk(&opts.config, &opts.classifier) {
        let element = match item {
            Ok(el) => el,
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "skipping");
                if opts.collect_errors {
                    errors.push(err);
                }
                continue;
            }
            Err(err) => return Err(err),
        };

        if element.is_dir {
            dirs += 1;
        } else {
            files += 1;
        }

        if opts.filters.is_match(&element) {
            elements.push(element);
        }
    }

    debug!(kept = elements.len(), files, dirs, "traversal done");
    let elements = opts.pipeline.apply(elements);

    Ok(Results {
        elements,
        stats: ScanStats::compute(files, dirs, start.elapsed()),
        errors,
    })
}

// ---------------------------------------------------------------------------
// Map ignore::Error to ListError
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error) -> ListError {
    map_with_path(e, None)
}

fn map_with_path(e: ignore::Error, path: Option<PathBuf>) -> ListError {
    match e {
        ignore::Error::WithPath { path, err } => map_with_path(*err, Some(path)),
        ignore::Error::WithDepth { err, .. } => map_with_path(*err, path),
        ignore::Error::Loop { child, .. } => ListError::SymlinkLoop(child),
        ignore::Error::Io(io_err) => {
            let path = path.unwrap_or_default();
            match io_err.kind() {
                std::io::ErrorKind::PermissionDenied => ListError::PermissionDenied(path),
                std::io::ErrorKind::NotFound => ListError::NotFound(path),
                _ => ListError::Io {
                    path,
                    source: io_err,
                },
            }
        }
        other => ListError::Walk(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_names() {
        assert!(is_hidden(".git"));
        assert!(is_hidden("node_modules"));
        assert!(is_hidden("Thumbs.db"));
        assert!(!is_hidden("src"));
        assert!(!is_hidden("node_modules_backup"));
    }

    #[test]
    fn zip_dates_convert_to_unix_seconds() {
        let dt = zip::DateTime::from_date_and_time(2020, 1, 2, 3, 4, 6).unwrap();
        assert_eq!(zip_timestamp(dt), Some(1_577_934_246));
    }

    #[test]
    fn member_names_stay_inside_the_archive() {
        assert_eq!(member_name(Path::new("ch1/p2.jpg")).as_deref(), Some("ch1/p2.jpg"));
        assert_eq!(member_name(Path::new("ch1/")).as_deref(), Some("ch1"));
        assert_eq!(member_name(Path::new("a/../b.txt")).as_deref(), Some("b.txt"));
        assert_eq!(member_name(Path::new("./c.txt")).as_deref(), Some("c.txt"));
        assert_eq!(member_name(Path::new("../escape.txt")), None);
        assert_eq!(member_name(Path::new("/etc/passwd")), None);
    }

    #[test]
    fn leading_current_dir_is_dropped() {
        assert_eq!(clean_path(Path::new("./a.jpg")), PathBuf::from("a.jpg"));
        assert_eq!(clean_path(Path::new("./sub/c.png")), PathBuf::from("sub/c.png"));
        assert_eq!(clean_path(Path::new("/tmp/a.jpg")), PathBuf::from("/tmp/a.jpg"));
        assert_eq!(clean_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn io_errors_keep_their_path() {
        let err = ignore::Error::WithPath {
            path: "/secret".into(),
            err: Box::new(ignore::Error::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            ))),
        };
        assert!(matches!(
            map_ignore_error(err),
            ListError::PermissionDenied(p) if p == Path::new("/secret")
        ));
    }
}
