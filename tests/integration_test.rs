use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use ldx::engine::WalkConfig;
use ldx::kind::{ARCHIVE, IMAGE, ZIP_LIKE};
use ldx::{list, Classifier, Element, ListError, SortBy, Source};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory tree for testing.
///
/// Structure:
/// ```text
/// tmp/
///   a.jpg
///   b.txt
///   sub/
///     c.png
/// ```
fn setup_test_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("a.jpg"), "jpeg").unwrap();
    fs::write(root.join("b.txt"), "text").unwrap();

    let sub = root.join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("c.png"), "png").unwrap();

    dir
}

/// `d0.txt`, `one/d1.txt`, `one/two/d2.txt`, `one/two/three/d3.txt`.
fn setup_deep_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut level = dir.path().to_path_buf();
    for (i, name) in ["one", "two", "three", ""].iter().enumerate() {
        fs::write(level.join(format!("d{i}.txt")), "x").unwrap();
        if !name.is_empty() {
            level = level.join(name);
            fs::create_dir(&level).unwrap();
        }
    }
    dir
}

/// Write a zip archive. Names ending in `/` become directory records.
fn write_zip(path: &Path, members: &[&str]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for name in members {
        match name.strip_suffix('/') {
            Some(dir) => zip.add_directory(dir, SimpleFileOptions::default()).unwrap(),
            None => {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(name.as_bytes()).unwrap();
            }
        }
    }
    zip.finish().unwrap();
}

fn names(elements: &[Element]) -> Vec<&str> {
    elements.iter().map(|e| e.name.as_str()).collect()
}

/// In-memory source replaying a fixed sequence. Errors other than
/// `PermissionDenied` are replayed as a fatal archive error.
struct ReplaySource(Vec<Result<&'static str, ListError>>);

impl Source for ReplaySource {
    fn walk<'a>(
        &'a self,
        _config: &'a WalkConfig,
        classifier: &'a Classifier,
    ) -> Box<dyn Iterator<Item = Result<Element, ListError>> + 'a> {
        Box::new(self.0.iter().map(move |item| match item {
            Ok(name) => Ok(Element::new(*name, *name, false, classifier)),
            Err(ListError::PermissionDenied(p)) => Err(ListError::PermissionDenied(p.clone())),
            Err(_) => Err(ListError::Archive {
                path: PathBuf::from("broken.zip"),
                source: zip::result::ZipError::FileNotFound,
            }),
        }))
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[test]
fn test_default_lists_root_children_by_name() {
    let dir = setup_test_dir();
    let results = list().root(dir.path()).run().unwrap();

    assert_eq!(names(&results.elements), ["a.jpg", "b.txt", "sub"]);
    assert!(results.elements.iter().all(|e| e.depth == 0));
    assert!(results.elements[2].is_dir);
    assert_eq!(results.elements[0].path, dir.path().join("a.jpg"));
}

#[test]
fn test_include_images_one_level_down() {
    let dir = setup_test_dir();
    let results = list()
        .root(dir.path())
        .to_depth(1)
        .include("image")
        .run()
        .unwrap();

    assert_eq!(
        results.paths(),
        [dir.path().join("a.jpg"), dir.path().join("sub").join("c.png")]
    );
    assert_eq!(results.elements[1].depth, 1);
    assert_eq!(results.elements[1].mask & IMAGE, IMAGE);
    assert_eq!(results.stats.files, 3);
    assert_eq!(results.stats.dirs, 1);
}

#[test]
fn test_depth_window() {
    let dir = setup_deep_dir();
    let run = |b: ldx::ListBuilder| {
        let r = b.root(dir.path()).only_files().run().unwrap();
        r.elements.into_iter().map(|e| e.name).collect::<Vec<_>>()
    };

    assert_eq!(run(list().depth("[1:2]")), ["d1.txt", "d2.txt"]);
    assert_eq!(run(list().recurse()), ["d0.txt", "d1.txt", "d2.txt", "d3.txt"]);
    assert_eq!(run(list().from_depth(2).recurse()), ["d2.txt", "d3.txt"]);
    assert_eq!(run(list().depth("[3]")), ["d3.txt"]);
    assert_eq!(run(list().depth("[2:]")), ["d2.txt", "d3.txt"]);
}

#[test]
fn test_multiple_roots_in_order() {
    let a = setup_test_dir();
    let b = setup_deep_dir();
    let results = list().root(b.path()).root(a.path()).only_files().run().unwrap();
    assert_eq!(names(&results.elements), ["d0.txt", "a.jpg", "b.txt"]);
}

#[test]
fn test_hidden_entries() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join(".secret"), "").unwrap();
    fs::write(root.join("visible.txt"), "").unwrap();
    fs::create_dir(root.join("node_modules")).unwrap();
    fs::write(root.join("node_modules").join("pkg.js"), "").unwrap();

    let results = list().root(root).recurse().run().unwrap();
    assert_eq!(names(&results.elements), ["visible.txt"]);

    let results = list().root(root).recurse().no_hide(true).run().unwrap();
    assert_eq!(
        names(&results.elements),
        [".secret", "node_modules", "visible.txt", "pkg.js"]
    );
}

#[test]
fn test_max_per_dir() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join(".hidden"), "").unwrap();
    fs::write(root.join("a.txt"), "").unwrap();
    fs::write(root.join("b.txt"), "").unwrap();
    fs::create_dir(root.join("c_dir")).unwrap();
    fs::write(root.join("c_dir").join("inner.txt"), "").unwrap();

    let results = list().root(root).recurse().max_per_dir(2).run().unwrap();
    assert_eq!(names(&results.elements), ["a.txt", "b.txt"]);
}

#[test]
fn test_file_root_is_recoverable() {
    let dir = setup_test_dir();
    let results = list()
        .root(dir.path().join("b.txt"))
        .root(dir.path().join("sub"))
        .collect_errors(true)
        .run()
        .unwrap();

    assert_eq!(names(&results.elements), ["c.png"]);
    assert_eq!(results.errors.len(), 1);
    assert!(matches!(results.errors[0], ListError::NotADirectory(_)));
}

#[test]
fn test_missing_root_is_recoverable() {
    let dir = setup_test_dir();
    let results = list()
        .root(dir.path().join("missing"))
        .collect_errors(true)
        .run()
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(results.errors.len(), 1);
    assert!(results.errors[0].is_recoverable());

    let results = list().root(dir.path().join("missing")).run().unwrap();
    assert!(results.errors.is_empty());
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

#[test]
fn test_archive_expansion() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("plain.txt"), "").unwrap();
    write_zip(
        &root.join("comics.cbz"),
        &["p1.jpg", "ch1/", "ch1/p2.jpg", ".hidden.jpg", "__MACOSX/p1.jpg"],
    );

    let results = list().root(root).recurse().archive(true).run().unwrap();
    assert_eq!(names(&results.elements), ["plain.txt", "p1.jpg", "ch1", "p2.jpg"]);

    let members = &results.elements[1..];
    assert!(members.iter().all(|e| e.is_archive && e.mask & ZIP_LIKE != 0));
    assert_eq!(members[0].path, root.join("comics.cbz").join("p1.jpg"));
    assert_eq!(members[0].depth, 1);
    assert!(members[1].is_dir);
    assert_eq!(members[2].depth, 2);
    assert_eq!(members[2].path, root.join("comics.cbz").join("ch1/p2.jpg"));
}

#[test]
fn test_archive_members_respect_depth_window() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("pack.zip"), &["top.png", "deep/nested.png"]);

    let results = list().root(dir.path()).to_depth(1).archive(true).run().unwrap();
    assert_eq!(names(&results.elements), ["top.png"]);

    // Default depth window never reaches inside the archive.
    let results = list().root(dir.path()).archive(true).run().unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_archive_is_a_file_without_archive_mode() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("pack.zip"), &["top.png"]);

    let results = list().root(dir.path()).recurse().run().unwrap();
    assert_eq!(names(&results.elements), ["pack.zip"]);
    let el = &results.elements[0];
    assert!(!el.is_dir && !el.is_archive);
    assert_eq!(el.mask, ARCHIVE | ZIP_LIKE);
}

#[test]
fn test_corrupt_archive_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.zip"), "definitely not a zip").unwrap();

    let err = list()
        .root(dir.path())
        .recurse()
        .archive(true)
        .run()
        .err()
        .unwrap();
    assert!(matches!(err, ListError::Archive { .. }));
    assert_eq!(err.path(), Some(&dir.path().join("bad.zip")));
    assert!(!err.is_recoverable());
}

#[test]
fn test_archive_size_key() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(&dir.path().join("pack.zip"), &["a.txt", "bbbbbbbb.txt"]);

    let results = list()
        .root(dir.path())
        .to_depth(1)
        .archive(true)
        .sort(SortBy::Size)
        .run()
        .unwrap();
    // Member content is its own name, so the longer name is larger.
    assert_eq!(names(&results.elements), ["bbbbbbbb.txt", "a.txt"]);
    assert_eq!(results.elements[0].vany, "bbbbbbbb.txt".len() as i64);
}

#[test]
fn test_archive_member_names_stay_inside_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("pack.zip");
    write_zip(&archive, &["/abs.txt", "/etc/passwd.txt", "ok.txt"]);

    let results = list()
        .root(dir.path())
        .recurse()
        .archive(true)
        .no_hide(true)
        .run()
        .unwrap();

    assert!(results.elements.iter().any(|e| e.name == "ok.txt"));
    for el in &results.elements {
        assert!(el.path.starts_with(&archive), "{} escaped", el.path.display());
    }
    // Absolute members are either dropped or re-rooted under the archive.
    if let Some(el) = results.elements.iter().find(|e| e.name == "passwd.txt") {
        assert_eq!(el.path, archive.join("etc").join("passwd.txt"));
        assert_eq!(el.depth, 2);
    }
}

#[test]
fn test_archive_max_per_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_zip(
        &dir.path().join("pack.zip"),
        &["one.txt", ".skipped.txt", "two.txt", "three.txt"],
    );

    let results = list()
        .root(dir.path())
        .to_depth(1)
        .archive(true)
        .max_per_dir(2)
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["one.txt", "two.txt"]);
}

#[test]
fn test_archive_modified_key() {
    let dir = tempfile::tempdir().unwrap();
    let at = |y, m, d| zip::DateTime::from_date_and_time(y, m, d, 12, 0, 0).unwrap();

    let mut zip = ZipWriter::new(File::create(dir.path().join("pack.zip")).unwrap());
    for (name, time) in [
        ("old.txt", at(2001, 2, 3)),
        ("new.txt", at(2022, 7, 8)),
        ("mid.txt", at(2010, 1, 1)),
    ] {
        let options = SimpleFileOptions::default().last_modified_time(time);
        zip.start_file(name, options).unwrap();
        zip.write_all(b"x").unwrap();
    }
    zip.finish().unwrap();

    let results = list()
        .root(dir.path())
        .to_depth(1)
        .archive(true)
        .sort(SortBy::Modified)
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["new.txt", "mid.txt", "old.txt"]);
    let values: Vec<i64> = results.elements.iter().map(|e| e.vany).collect();
    assert_eq!(values, [1_657_281_600, 1_262_347_200, 981_201_600]);
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_sort_by_modified() {
    let dir = tempfile::tempdir().unwrap();
    for (name, secs) in [
        ("a.txt", 1_000_000_000u64),
        ("b.txt", 1_600_000_000),
        ("c.txt", 1_300_000_000),
    ] {
        let file = File::create(dir.path().join(name)).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    let results = list().root(dir.path()).sort(SortBy::Modified).run().unwrap();
    assert_eq!(names(&results.elements), ["b.txt", "c.txt", "a.txt"]);
    assert_eq!(results.elements[0].vany, 1_600_000_000);

    let results = list()
        .root(dir.path())
        .sort(SortBy::Modified)
        .ascending(true)
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["a.txt", "c.txt", "b.txt"]);
}

#[test]
fn test_sort_by_creation() {
    let dir = setup_test_dir();
    let results = list().root(dir.path()).sort(SortBy::Creation).run().unwrap();

    assert_eq!(results.len(), 3);
    // Platforms without birth times report 0 for every entry.
    assert!(results.elements.iter().all(|e| e.vany >= 0));
    assert!(results.elements.windows(2).all(|w| w[0].vany >= w[1].vany));
}

#[test]
fn test_sort_by_size_then_slice() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("small"), vec![0u8; 10]).unwrap();
    fs::write(root.join("large"), vec![0u8; 30]).unwrap();
    fs::write(root.join("medium"), vec![0u8; 20]).unwrap();

    let results = list()
        .root(root)
        .sort(SortBy::Size)
        .select("[:2]")
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["large", "medium"]);
    assert_eq!(results.elements[0].vany, 30);

    let results = list()
        .root(root)
        .sort(SortBy::Size)
        .ascending(true)
        .select("[-1]")
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["large"]);
}

#[test]
fn test_values_stay_zero_without_numeric_sort() {
    let dir = setup_test_dir();
    let results = list().root(dir.path()).sort(SortBy::Name).run().unwrap();
    assert!(results.elements.iter().all(|e| e.vany == 0));
    assert_eq!(names(&results.elements), ["sub", "b.txt", "a.jpg"]);
}

#[test]
fn test_query_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["holiday_2023.jpg", "holly.txt", "budget.xlsx"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    let results = list().root(dir.path()).query("holiday").run().unwrap();
    assert_eq!(names(&results.elements), ["holiday_2023.jpg", "holly.txt"]);
}

#[test]
fn test_custom_filter_and_process() {
    let dir = setup_test_dir();
    let results = list()
        .root(dir.path())
        .to_depth(1)
        .filter(|e: &Element| !e.is_dir)
        .process(|mut els: Vec<Element>| {
            els.retain(|e| e.name != "b.txt");
            els
        })
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["a.jpg", "c.png"]);
}

#[test]
fn test_custom_source_errors() {
    let results = list()
        .source(ReplaySource(vec![
            Ok("one.txt"),
            Err(ListError::PermissionDenied("locked".into())),
            Ok("two.png"),
        ]))
        .collect_errors(true)
        .run()
        .unwrap();
    assert_eq!(names(&results.elements), ["one.txt", "two.png"]);
    assert_eq!(results.errors.len(), 1);

    let err = list()
        .source(ReplaySource(vec![
            Ok("one.txt"),
            Err(ListError::Walk("fatal".into())),
            Ok("never.txt"),
        ]))
        .run()
        .err()
        .unwrap();
    assert!(matches!(err, ListError::Archive { .. }));
}

#[test]
fn test_unknown_kind_fails_before_io() {
    let err = list()
        .root("/definitely/not/here")
        .include("pictures")
        .run()
        .err()
        .unwrap();
    assert!(matches!(err, ListError::InvalidKind(_)));
}
