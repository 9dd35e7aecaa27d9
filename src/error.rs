use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected construction parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A [`WriteError`] folded into this type with `?` by library callers
    /// that don't need the byte count.
    #[error("sink write failed: {0}")]
    SinkWrite(#[source] io::Error),

    #[error("sink close failed: {0}")]
    SinkClose(#[source] io::Error),

    #[error("failed to start flush thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("invalid config: {0}")]
    Config(String),
}

/// Error from a write or flush that reached the sink.
/// `written` is the number of bytes known to have left the staging buffer
/// (or been accepted by the sink) before the failure.
#[derive(Debug, Error)]
#[error("sink error after {written} bytes: {source}")]
pub struct WriteError {
    pub written: usize,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    pub(crate) fn new(written: usize, source: io::Error) -> Self {
        Self { written, source }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// Drops the byte count, keeping only the sink's error.
impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        Error::SinkWrite(err.source)
    }
}

impl From<WriteError> for io::Error {
    fn from(err: WriteError) -> Self {
        err.source
    }
}
