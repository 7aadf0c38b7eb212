//! Error types for scene loading

use thiserror::Error;

/// Result type for scene loading operations
pub type DataResult<T> = Result<T, LoadError>;

/// Errors that can occur while fetching or decoding a splat scene
///
/// Any of these leaves the caller's previously loaded scene untouched:
/// decode and transport run to completion before a scene is swapped in.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("scene length {len} bytes is not a multiple of the {record}-byte record size")]
    Format { len: usize, record: usize },

    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("response has no Content-Length header")]
    MissingContentLength,

    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("response body ran past the advertised length of {expected} bytes")]
    Overrun { expected: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
