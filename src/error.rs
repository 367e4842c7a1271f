use std::io;
use std::path::{Path, PathBuf};

/// Result alias used by every session operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by a command handler or by the directory changer.
///
/// Every variant is recoverable: the dispatcher turns it into an
/// `Operation failed: ...` line and the session keeps running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Navigation attempted from the root to somewhere above it.
    #[error("already at root {}", .0.display())]
    AlreadyAtRoot(PathBuf),

    #[error("{} is outside of root {}", target.display(), root.display())]
    OutsideRoot { target: PathBuf, root: PathBuf },

    /// Missing, extra or ill-formed arguments.
    #[error("invalid input for `{command}`: {reason}")]
    Malformed { command: String, reason: String },

    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("{0} is not available on this system")]
    Unavailable(&'static str),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of an [`Error`], used for reporting and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    InvalidBoundary,
    MalformedCommand,
    Unknown,
    Other,
}

impl Error {
    /// Attach `path` to an I/O error, folding the common kinds into
    /// dedicated variants.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(path),
            _ => Error::Io { path, source },
        }
    }

    pub fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Malformed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::AlreadyAtRoot(_) | Error::OutsideRoot { .. } => ErrorKind::InvalidBoundary,
            Error::Malformed { .. } => ErrorKind::MalformedCommand,
            Error::Unknown(_) => ErrorKind::Unknown,
            Error::NotADirectory(_)
            | Error::NotAFile(_)
            | Error::Unavailable(_)
            | Error::Panicked(_)
            | Error::Io { .. } => ErrorKind::Other,
        }
    }
}
