use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use timed_bufwriter::WriterConfig;

/// Copies stdin to a file or stdout through a size and time bounded buffer.
#[derive(Parser, Debug)]
#[command(name = "bufpipe", version)]
pub struct Args {
    /// Staging buffer size in bytes.
    #[arg(short, long, allow_negative_numbers = true)]
    pub capacity: Option<i64>,

    /// Periodic flush interval in milliseconds, 0 to disable.
    #[arg(short = 'i', long, allow_negative_numbers = true)]
    pub flush_interval: Option<i64>,

    /// JSON file with `capacity` and `flush_interval_ms`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file, defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Bytes read from stdin per write.
    #[arg(long, default_value_t = 512)]
    pub chunk: usize,
}

impl Args {
    /// Config file values, overridden by any flags given.
    pub fn writer_config(&self) -> Result<WriterConfig> {
        let mut config = match &self.config {
            Some(path) => WriterConfig::load(path)?,
            None => WriterConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }

        if let Some(interval) = self.flush_interval {
            config.flush_interval_ms = interval;
        }

        Ok(config)
    }
}
