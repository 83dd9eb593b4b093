//! POST body extraction and audit logging.

use std::sync::Arc;

use icapture_core::{
    extract_chunk_payload, ContentKind, ExtractError, SensitivityHeuristic, Signal,
};
use icapture_storage::{LogEntry, PayloadSink, StorageError};

use crate::framer::BodyLocation;
use tracing::{debug, error, info, warn};

/// What happened to one intercepted body.
#[derive(Debug)]
pub enum ExtractOutcome {
    /// The payload was written to the sink.
    Logged(Signal),
    /// The terminal chunk was not found.
    Incomplete,
    /// No `Referer` header to attribute the payload to.
    NoTargetUrl,
    /// The content type is not one the classifier handles.
    Rejected,
    /// The sensitivity gate declined the payload.
    NotSensitive(Signal),
    /// The payload did not parse as its declared type.
    Invalid(ExtractError),
    /// The sink refused the entry.
    SinkFailed(StorageError),
}

impl ExtractOutcome {
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::Logged(_))
    }
}

/// Runs the extraction pipeline for POST bodies and feeds the sink.
#[derive(Clone)]
pub struct PayloadExtractor {
    heuristic: SensitivityHeuristic,
    sink: Arc<dyn PayloadSink>,
}

impl std::fmt::Debug for PayloadExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadExtractor")
            .field("heuristic", &self.heuristic)
            .field("sink", &"PayloadSink")
            .finish()
    }
}

impl PayloadExtractor {
    /// Creates an extractor writing to `sink`.
    pub fn new(sink: Arc<dyn PayloadSink>) -> Self {
        Self {
            heuristic: SensitivityHeuristic::new(),
            sink,
        }
    }

    /// Extracts, classifies, and logs the body of a buffered message.
    ///
    /// `location` comes from the framer. Failures never propagate: the proxy
    /// gets its `204` either way.
    pub fn extract(&self, buffer: &[u8], location: BodyLocation) -> ExtractOutcome {
        let body = buffer.get(location.body_start..).unwrap_or(&[]);
        let Some(payload) = extract_chunk_payload(body) else {
            debug!("Terminal chunk not found; skipping extraction");
            return ExtractOutcome::Incomplete;
        };

        let headers = location.headers(buffer);
        let Some(target_url) = headers.target_url() else {
            debug!("No Referer header; skipping extraction");
            return ExtractOutcome::NoTargetUrl;
        };

        let text = String::from_utf8_lossy(payload);
        let decision = self.heuristic.decide(target_url, &text);

        let content_type = headers.content_type.as_deref();
        let Some(kind) = content_type.and_then(ContentKind::from_content_type) else {
            debug!("Unhandled content type {:?} for {}", content_type, target_url);
            return ExtractOutcome::Rejected;
        };

        if !decision.extract {
            debug!(
                "Payload to {} not sensitive (signal: {:?})",
                target_url, decision.signal
            );
            return ExtractOutcome::NotSensitive(decision.signal);
        }

        let content = match kind.parse(payload) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to parse {} payload for {}: {}", kind.name(), target_url, e);
                return ExtractOutcome::Invalid(e);
            }
        };

        let entry = match LogEntry::from_content(target_url, &content) {
            Ok(Some(entry)) => entry,
            Ok(None) => return ExtractOutcome::Rejected,
            Err(e) => {
                error!("Failed to render payload for {}: {}", target_url, e);
                return ExtractOutcome::SinkFailed(e);
            }
        };

        match self.sink.append(&entry) {
            Ok(()) => {
                info!(
                    "Logged {} payload for {} (signal: {:?}, key: {:?})",
                    kind.name(),
                    target_url,
                    decision.signal,
                    self.heuristic.matched_key(&text).unwrap_or_default()
                );
                ExtractOutcome::Logged(decision.signal)
            }
            Err(e) => {
                error!("Failed to write payload log: {}", e);
                ExtractOutcome::SinkFailed(e)
            }
        }
    }
}
