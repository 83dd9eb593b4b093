//! icapture Storage - append-only payload audit log.
//!
//! Extracted payloads are rendered into fixed text blocks ([`LogEntry`]) and
//! handed to a [`PayloadSink`]. Entries are never read back.
//!
//! # Example
//!
//! ```no_run
//! use icapture_core::ExtractedContent;
//! use icapture_storage::{FileSink, LogEntry, PayloadSink};
//!
//! let sink = FileSink::with_path("payload.log").unwrap();
//! let content = ExtractedContent::classify("application/json", br#"{"password":"x"}"#).unwrap();
//!
//! if let Some(entry) = LogEntry::from_content("https://site/login", &content).unwrap() {
//!     sink.append(&entry).unwrap();
//! }
//! ```

mod entry;
pub mod error;
mod json_text;
mod sink;

pub use entry::{LogEntry, PayloadLayout, SEPARATOR, TIMESTAMP_FORMAT};
pub use error::{Result, StorageError};
pub use sink::{FileSink, MemorySink, PayloadSink, DEFAULT_LOG_FILE};
