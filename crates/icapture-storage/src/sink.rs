//! Payload sinks.
//!
//! A sink receives finished [`LogEntry`] values from every connection task.
//! Appends must not interleave, so each implementation serialises writers
//! behind its own lock.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::entry::LogEntry;
use crate::error::Result;

/// Default audit log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "payload.log";

/// Destination for extracted payloads.
///
/// `append` may block on file I/O; async callers run it on the blocking pool.
pub trait PayloadSink: Send + Sync {
    /// Appends one entry. A successful return means the entry was written.
    fn append(&self, entry: &LogEntry) -> Result<()>;
}

/// Append-only file sink.
///
/// The file is opened (and created if missing) for every append and closed
/// afterwards, so external rotation of the file is picked up without a
/// restart.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSink {
    /// Creates a sink writing to `payload.log` in the working directory.
    pub fn new() -> Result<Self> {
        Self::with_path(DEFAULT_LOG_FILE)
    }

    /// Creates a sink writing to a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Writing payload log to: {:?}", path);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PayloadSink for FileSink {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let block = entry.render();
        let _guard = self.write_lock.lock();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.sync_data()?;

        debug!("Appended {} bytes to {:?}", block.len(), self.path);
        Ok(())
    }
}

/// In-memory sink (for testing).
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry appended so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PayloadSink for MemorySink {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
