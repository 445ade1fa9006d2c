#![forbid(unsafe_code)]

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("source path is not a directory: {0}")]
    NotADirectory(String),

    #[error("file {0} not found in packed file")]
    NotFound(String),

    #[error("refusing to follow symlink: {0}")]
    Symlink(String),

    #[error("path cannot be stored in container: {0:?}")]
    InvalidPath(String),

    #[error("path is outside output dir: {0}")]
    Outside(String),

    #[error("duplicate entry in container: {0}")]
    DuplicatePath(String),

    #[error("bad base64 payload for {path}: {source}")]
    Base64 {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("container ends inside entry: {0}")]
    Truncated(String),

    #[error("malformed container: {0}")]
    Malformed(String),
}

pub type PackResult<T> = Result<T, PackError>;

/// Non-fatal findings while reading a container. Logged, never thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatWarning {
    /// Header does not carry the expected version marker.
    VersionMismatch { found: String },
    /// Input ended while this entry was still open; it was kept as-is.
    Truncated { path: String },
    /// A new entry started before this one was closed; it was kept as-is.
    UnterminatedEntry { path: String },
    /// `Total files` metadata disagrees with the parsed entries.
    CountMismatch { declared: usize, parsed: usize },
    /// Non-blank line outside any entry (1-based line number).
    StrayLine { line: usize },
}

impl fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatWarning::VersionMismatch { found } => write!(
                f,
                "file might be in another format version (header: {found:?}), parsing anyway"
            ),
            FormatWarning::Truncated { path } => {
                write!(f, "container ends inside entry {path}, keeping partial content")
            }
            FormatWarning::UnterminatedEntry { path } => {
                write!(f, "entry {path} has no end marker, keeping partial content")
            }
            FormatWarning::CountMismatch { declared, parsed } => {
                write!(f, "header declares {declared} files but {parsed} were found")
            }
            FormatWarning::StrayLine { line } => write!(f, "ignoring stray line {line}"),
        }
    }
}
