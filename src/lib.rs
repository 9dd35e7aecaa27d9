//! Thread safe buffered writer that batches small writes in front of a byte sink.
//! Staged bytes are flushed when the buffer overflows, when asked to, or
//! periodically by a background thread.

pub mod config;
pub mod error;
mod flusher;
pub mod sink;
pub mod writer;

pub use config::WriterConfig;
pub use error::{Error, Result, WriteError};
pub use sink::{NoClose, Sink};
pub use writer::{BufferedWriter, Builder, FlushErrorHook};
