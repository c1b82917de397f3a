use std::path::PathBuf;
use thiserror::Error;

use crate::slice::SliceError;

#[derive(Error, Debug)]
pub enum ListError {
    // Traversal
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("symlink loop: {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("IO error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(String),

    // Archives
    #[error("failed to open archive {}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    // Config
    #[error("invalid slice expression `{pattern}`")]
    InvalidSlice {
        pattern: String,
        #[source]
        reason: SliceError,
    },

    #[error("unknown content kind `{0}`")]
    InvalidKind(String),

    #[error("unknown sort mode `{0}`")]
    InvalidSort(String),
}

impl ListError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "Skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::NotADirectory(p)
            | Self::SymlinkLoop(p)
            | Self::Io { path: p, .. }
            | Self::Archive { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the listing can continue after this error.
    ///
    /// Unreadable directories are skipped and the walk keeps going. An archive
    /// that cannot be opened aborts the whole run, as do configuration errors.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_)
                | Self::NotFound(_)
                | Self::NotADirectory(_)
                | Self::SymlinkLoop(_)
                | Self::Io { .. }
                | Self::Walk(_)
        )
    }
}
