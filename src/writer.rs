//! Size and time bounded buffered writer.
//!
//! Small writes are staged in memory and handed to the sink in larger chunks.
//! The stage is drained when a write would overflow it, when the caller asks,
//! or on a fixed period by a background thread.
//! Writes bigger than the whole stage skip it and go straight to the sink,
//! after whatever was already staged.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    config::WriterConfig,
    error::{Error, Result, WriteError},
    flusher::Flusher,
    sink::Sink,
};

/// Callback for flush errors that would otherwise be dropped.
pub type FlushErrorHook = Arc<dyn Fn(&io::Error) + Send + Sync>;

/// Thread safe buffered writer.
/// All staging and draining goes through one lock, so bytes reach the sink
/// in the order the writes took that lock.
pub struct BufferedWriter<S: Sink> {
    shared: Arc<Shared<S>>,
    capacity: usize,
    flush_interval: Duration,
    flusher: Mutex<Option<Flusher>>,
}

struct Shared<S> {
    state: Mutex<State<S>>,
    on_flush_error: Option<FlushErrorHook>,
}

struct State<S> {
    buf: Vec<u8>,
    sink: S,
}

pub struct Builder<S: Sink> {
    sink: Option<S>,
    config: WriterConfig,
    on_flush_error: Option<FlushErrorHook>,
}

impl<S: Sink + 'static> BufferedWriter<S> {
    /// Create a writer around `sink`.
    /// `flush_interval_ms` of 0 disables the periodic flush.
    pub fn new(sink: S, capacity: usize, flush_interval_ms: i64) -> Result<Self> {
        Self::builder()
            .sink(sink)
            .capacity(capacity)
            .flush_interval_ms(flush_interval_ms)
            .build()
    }

    pub fn from_config(sink: S, config: &WriterConfig) -> Result<Self> {
        Self::builder().sink(sink).config(config).build()
    }

    pub fn builder() -> Builder<S> {
        Builder {
            sink: None,
            config: WriterConfig::default(),
            on_flush_error: None,
        }
    }
}

impl<S: Sink> BufferedWriter<S> {
    /// Stage `bytes`, draining the stage first if they don't fit.
    ///
    /// Returns `bytes.len()` for a staged write. A write larger than the
    /// capacity drains the stage and then goes to the sink directly; it
    /// returns the drained count plus `bytes.len()`.
    /// On error, [`WriteError::written`] holds what is known to have moved.
    pub fn write(&self, bytes: &[u8]) -> std::result::Result<usize, WriteError> {
        let mut state = self.shared.state.lock();

        if bytes.len() > self.capacity {
            let flushed = state.drain()?;
            debug!(
                len = bytes.len(),
                capacity = self.capacity,
                "oversized write bypassing buffer"
            );

            // The stage stays empty, so later flushes never reach the sink for these bytes
            let (written, result) = write_through(&mut state.sink, bytes);
            return match result.and_then(|_| state.sink.flush()) {
                Ok(()) => Ok(flushed + written),
                Err(e) => Err(WriteError::new(flushed + written, e)),
            };
        }

        if bytes.len() > self.capacity - state.buf.len() {
            state.drain()?;
        }

        state.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Drain the stage into the sink.
    /// Returns how many bytes are no longer pending. If the sink fails part
    /// way, the rest stays staged and the error carries the drained count.
    pub fn try_flush(&self) -> std::result::Result<usize, WriteError> {
        self.shared.state.lock().drain()
    }

    /// Best effort flush.
    /// Errors go to the flush error hook (if any) instead of the caller.
    pub fn flush(&self) {
        self.shared.flush_quietly();
    }

    /// Stop the periodic flush and close the sink.
    /// Staged bytes are **not** flushed, call [`BufferedWriter::try_flush`] first.
    pub fn close(&self) -> Result<()> {
        self.shutdown();
        self.shared
            .state
            .lock()
            .sink
            .close()
            .map_err(Error::SinkClose)
    }

    /// Stop the periodic flush thread, if there is one, and wait for it.
    pub fn shutdown(&self) {
        if let Some(flusher) = self.flusher.lock().take() {
            flusher.stop();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Bytes currently staged.
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().buf.len()
    }
}

impl<S: Sink> Drop for BufferedWriter<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: Sink> fmt::Display for BufferedWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BufferedWriter capacity: {}, flush interval: {}ms",
            self.capacity,
            self.flush_interval.as_millis()
        )
    }
}

impl<S: Sink> fmt::Debug for BufferedWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedWriter")
            .field("capacity", &self.capacity)
            .field("flush_interval", &self.flush_interval)
            .field("buffered", &self.buffered())
            .finish()
    }
}

// The io::Write impls only ever report the caller's own bytes,
// never the extra drained count from an oversized write.
impl<S: Sink> Write for &BufferedWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        BufferedWriter::write(*self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.try_flush()?;
        Ok(())
    }
}

impl<S: Sink> Write for BufferedWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}

impl<S: Sink> Shared<S> {
    fn flush_quietly(&self) {
        let result = self.state.lock().drain();
        if let Err(err) = result {
            warn!(written = err.written, "flush failed: {}", err.source);
            if let Some(hook) = &self.on_flush_error {
                hook(&err.source);
            }
        }
    }
}

impl<S: Sink> State<S> {
    fn drain(&mut self) -> std::result::Result<usize, WriteError> {
        if self.buf.is_empty() {
            return Ok(0);
        }

        let (written, result) = write_through(&mut self.sink, &self.buf);
        self.buf.drain(..written);
        trace!(drained = written, pending = self.buf.len(), "drained buffer");

        result
            .and_then(|_| self.sink.flush())
            .map_err(|e| WriteError::new(written, e))?;
        Ok(written)
    }
}

/// Push all of `bytes` into the sink.
/// Returns how many were accepted along with the first hard error.
fn write_through<W: Write + ?Sized>(sink: &mut W, bytes: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < bytes.len() {
        match sink.write(&bytes[written..]) {
            Ok(0) => {
                let err = io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes");
                return (written, Err(err));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }

    (written, Ok(()))
}

impl<S: Sink + 'static> Builder<S> {
    pub fn sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = i64::try_from(capacity).unwrap_or(i64::MAX);
        self
    }

    pub fn flush_interval_ms(mut self, flush_interval_ms: i64) -> Self {
        self.config.flush_interval_ms = flush_interval_ms;
        self
    }

    pub fn config(mut self, config: &WriterConfig) -> Self {
        self.config = *config;
        self
    }

    /// Called with every error swallowed by [`BufferedWriter::flush`]
    /// or the periodic flush.
    pub fn on_flush_error(mut self, hook: impl Fn(&io::Error) + Send + Sync + 'static) -> Self {
        self.on_flush_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<BufferedWriter<S>> {
        let sink = self.sink.ok_or(Error::InvalidArgument("sink is nil"))?;
        let (capacity, flush_interval) = self.config.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                buf: Vec::with_capacity(capacity),
                sink,
            }),
            on_flush_error: self.on_flush_error,
        });

        let flusher = if flush_interval.is_zero() {
            None
        } else {
            let ticking = shared.clone();
            let flusher = Flusher::spawn(flush_interval, move || ticking.flush_quietly())
                .map_err(Error::Spawn)?;
            Some(flusher)
        };

        debug!(capacity, ?flush_interval, "buffered writer created");
        Ok(BufferedWriter {
            shared,
            capacity,
            flush_interval,
            flusher: Mutex::new(flusher),
        })
    }
}
