//! Construction parameters that can be loaded from a JSON file.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    /// Max bytes staged in memory before a forced flush.
    /// Zero and negative values parse and are rejected at build time.
    pub capacity: i64,
    /// Period between forced flushes in milliseconds.
    /// `0` disables the periodic flush, negative values are rejected at build time.
    pub flush_interval_ms: i64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            flush_interval_ms: 1000,
        }
    }
}

impl WriterConfig {
    pub fn new(capacity: i64, flush_interval_ms: i64) -> Self {
        Self {
            capacity,
            flush_interval_ms,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Checks the parameters in the same order the writer does.
    /// Returns the capacity in bytes and the flush interval.
    pub fn validate(&self) -> Result<(usize, Duration)> {
        if self.flush_interval_ms < 0 {
            return Err(Error::InvalidArgument("flushInterval negative"));
        }

        if self.capacity <= 0 {
            return Err(Error::InvalidArgument("capacity must be positive"));
        }

        let capacity = usize::try_from(self.capacity)
            .map_err(|_| Error::InvalidArgument("capacity too large"))?;
        Ok((capacity, Duration::from_millis(self.flush_interval_ms as u64)))
    }
}
