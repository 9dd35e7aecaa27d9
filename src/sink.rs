//! Downstream byte sinks.
//!
//! A sink is anything that can take bytes ([`Write`]) and may optionally be
//! closed. Types with nothing to close just use the default [`Sink::close`].

use std::{
    fs::File,
    io::{self, Write},
    net::{Shutdown, TcpStream},
};

pub trait Sink: Write + Send {
    /// Release the sink. Staged data in a writer wrapping this sink is not
    /// flushed by this call.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Wraps any writer as a sink without a close capability.
pub struct NoClose<W: Write + Send>(pub W);

impl<W: Write + Send> NoClose<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write + Send> Write for NoClose<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> Sink for NoClose<W> {}

impl Sink for Vec<u8> {}
impl Sink for io::Sink {}

impl Sink for io::Stdout {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for io::Stderr {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for File {
    fn close(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl Sink for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
