//! Content-kind classification by file extension.
//!
//! Every kind owns one bit of a `u32` mask. The zip-like extensions are also
//! listed under [`ARCHIVE`], so a `.zip` carries both bits.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ListError;

pub const IMAGE: u32 = 1 << 0;
pub const VIDEO: u32 = 1 << 1;
pub const AUDIO: u32 = 1 << 2;
pub const ARCHIVE: u32 = 1 << 3;
pub const ZIP_LIKE: u32 = 1 << 4;
pub const CODE: u32 = 1 << 5;
pub const CONF: u32 = 1 << 6;
pub const DOCS: u32 = 1 << 7;
pub const ODEV: u32 = 1 << 8;

pub const MEDIA: u32 = IMAGE | VIDEO | AUDIO;

/// Kind bit -> extensions (lowercase, with the leading dot).
const KIND_EXTENSIONS: &[(u32, &[&str])] = &[
    (
        IMAGE,
        &[
            ".jpg", ".jpeg", ".png", ".apng", ".gif", ".bmp", ".webp", ".avif", ".jxl", ".tiff",
            ".tif", ".svg", ".ico", ".heic",
        ],
    ),
    (
        VIDEO,
        &[".mp4", ".m4v", ".webm", ".mkv", ".avi", ".mov", ".mpg", ".mpeg", ".wmv", ".flv"],
    ),
    (
        AUDIO,
        &[".m4a", ".opus", ".ogg", ".mp3", ".flac", ".wav", ".aac", ".wma"],
    ),
    (
        ARCHIVE,
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".lz4", ".zst", ".lzma", ".lzip",
            ".lz", ".cbz", ".cbr", ".tgz",
        ],
    ),
    (ZIP_LIKE, &[".zip", ".cbz"]),
    (
        CODE,
        &[
            ".rs", ".go", ".c", ".h", ".cpp", ".hpp", ".cc", ".py", ".js", ".mjs", ".ts", ".jsx",
            ".tsx", ".java", ".kt", ".swift", ".rb", ".php", ".lua", ".sh", ".bash", ".zsh",
            ".ps1", ".zig", ".cs", ".hs", ".ml", ".ex", ".exs", ".scala", ".dart", ".html",
            ".css", ".scss", ".vue", ".svelte",
        ],
    ),
    (
        CONF,
        &[
            ".toml", ".yaml", ".yml", ".json", ".ini", ".cfg", ".conf", ".xml", ".env",
            ".properties", ".editorconfig",
        ],
    ),
    (
        DOCS,
        &[
            ".md", ".txt", ".pdf", ".doc", ".docx", ".odt", ".rtf", ".epub", ".tex", ".org",
            ".rst", ".adoc", ".xls", ".xlsx", ".ppt", ".pptx",
        ],
    ),
    (
        ODEV,
        &[
            ".lock", ".sum", ".mod", ".log", ".csv", ".sql", ".proto", ".diff", ".patch", ".o",
            ".a", ".so", ".dll", ".exe", ".wasm", ".mk", ".cmake", ".gradle",
        ],
    ),
];

/// Resolve a user-supplied kind token to its mask. Case-insensitive.
///
/// Returns `None` for unknown tokens.
pub fn str_to_mask(token: &str) -> Option<u32> {
    let mask = match token.to_ascii_lowercase().as_str() {
        "image" | "images" | "i" => IMAGE,
        "video" | "videos" | "v" => VIDEO,
        "audio" | "a" => AUDIO,
        "media" | "m" => MEDIA,
        "archive" | "archives" => ARCHIVE,
        "zip" => ZIP_LIKE,
        "code" => CODE,
        "conf" | "config" => CONF,
        "docs" | "doc" => DOCS,
        "odev" => ODEV,
        _ => return None,
    };
    Some(mask)
}

/// OR together the masks of several kind tokens.
///
/// An empty list yields `0`, which filters treat as "no restriction".
pub fn as_mask<S: AsRef<str>>(tokens: &[S]) -> Result<u32, ListError> {
    tokens.iter().try_fold(0, |acc, token| {
        let token = token.as_ref();
        str_to_mask(token)
            .map(|mask| acc | mask)
            .ok_or_else(|| ListError::InvalidKind(token.to_string()))
    })
}

/// Immutable extension -> mask table.
///
/// Build it once and hand it to the traversal by reference.
#[derive(Debug, Clone)]
pub struct Classifier {
    masks: HashMap<&'static str, u32>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        let mut masks = HashMap::new();
        for (bit, exts) in KIND_EXTENSIONS {
            for ext in *exts {
                *masks.entry(*ext).or_insert(0) |= bit;
            }
        }
        Self { masks }
    }

    /// Mask for an extension given with its leading dot, e.g. `".png"`.
    pub fn mask_for_ext(&self, ext: &str) -> u32 {
        self.masks
            .get(ext.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Mask for a file name or path, derived from its extension.
    pub fn mask_of(&self, path: impl AsRef<Path>) -> u32 {
        match path.as_ref().extension() {
            Some(ext) => self.mask_for_ext(&format!(".{}", ext.to_string_lossy())),
            None => 0,
        }
    }

    pub fn is_zip_like(&self, path: impl AsRef<Path>) -> bool {
        self.mask_of(path) & ZIP_LIKE != 0
    }
}
