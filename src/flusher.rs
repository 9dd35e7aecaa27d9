//! Background thread that forces a flush on a fixed period.

use std::{
    io,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, select, Sender};
use tracing::debug;

/// Owned handle to the periodic flush thread.
/// The thread runs until [`Flusher::stop`] is called or the handle is dropped.
pub(crate) struct Flusher {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Flusher {
    pub fn spawn<F>(interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = channel::bounded::<()>(1);
        let ticker = channel::tick(interval);

        let handle = thread::Builder::new()
            .name("bufwriter-flush".into())
            .spawn(move || {
                debug!(?interval, "periodic flush started");
                loop {
                    select! {
                        recv(ticker) -> _ => tick(),
                        // Either an explicit stop or the handle going away
                        recv(stopped) -> _ => break,
                    }
                }
                debug!("periodic flush stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        let _ = self.stop.try_send(());
        let Some(handle) = self.handle.take() else {
            return;
        };

        // A flush error hook that owns the writer can drop it from this thread
        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
    }
}

impl Drop for Flusher {
    fn drop(&mut self) {
        self.halt();
    }
}
