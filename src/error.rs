use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while building a network or feeding it.
///
/// Construction errors carry the numeric codes the command-line tool exits
/// with (see [`Error::code`]). Once a `Network` exists, a forward pass can
/// only fail on an input of the wrong length.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The single arena allocation could not be satisfied.
    #[error("arena allocation of {requested} floats failed")]
    AllocationFailed { requested: usize },

    /// Layout assignment tried to hand out a span past the end of the arena.
    #[error("memory region exceeded: need {requested} floats, arena holds {capacity}")]
    RegionExceeded { requested: usize, capacity: usize },

    /// A description, parameter, label or image file could not be opened.
    #[error("file ({path}) is not readable: {source}")]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The network description or parameter stream is inconsistent.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// The image tensor handed to `infer` does not match the input shape.
    #[error("input has {actual} values, network expects {expected}")]
    InputMismatch { expected: usize, actual: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub const SUCCESS: i32 = 0;
pub const MEMORY_ALLOCATION_FAILED: i32 = -1;
pub const MEMORY_REGION_EXCEEDED: i32 = -2;
pub const FILE_NOT_READABLE: i32 = -3;
pub const MALFORMED_CONFIG: i32 = -4;

impl Error {
    /// Numeric status code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::AllocationFailed { .. } => MEMORY_ALLOCATION_FAILED,
            Error::RegionExceeded { .. } => MEMORY_REGION_EXCEEDED,
            Error::FileNotReadable { .. } | Error::Io(_) => FILE_NOT_READABLE,
            Error::Malformed(_)
            | Error::InputMismatch { .. }
            | Error::Image(_)
            | Error::Json(_) => MALFORMED_CONFIG,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Error {
        Error::Malformed(msg.into())
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::FileNotReadable { path: path.into(), source }
    }
}
