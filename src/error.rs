//! Error types for the paper-extract library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extractor cannot be constructed at all
//!   (invalid configuration, HTTP client build failure). Returned as
//!   `Err(ExtractError)` from [`crate::extract::ContentExtractor::new`] and
//!   never from an extraction call.
//!
//! * [`FetchError`] — **Non-fatal network failure**: a probe, document, or
//!   image fetch did not produce a usable response. Absorbed by the
//!   orchestrator and converted into a fallback transition; exhausted
//!   transient failures are reclassified as [`FetchError::Unavailable`].
//!
//! * [`ParseError`] — **Non-fatal structure failure**: a document downloaded
//!   fine but the parser found no usable structure in it. Also absorbed and
//!   routed to the fallback path.
//!
//! The separation keeps the batch contract honest: a single paper's failure
//! is reported through empty result fields and diagnostics, never as an
//! exception to the caller.

use thiserror::Error;

/// Fatal errors raised at extractor construction.
///
/// This is the only error class a caller of the library ever sees.
/// Everything that can go wrong during an extraction run is degraded into
/// an empty or partial [`crate::output::ExtractionResult`] instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Builder validation failed (zero timeout, empty pool, …).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {reason}")]
    HttpClientBuild { reason: String },
}

/// A non-fatal network failure for a single request.
///
/// Produced by [`crate::pipeline::fetch::Fetcher`] and consumed by the
/// orchestrator, which treats every variant as a reason to fall back.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status, or a transient
    /// failure persisted through the whole retry budget.
    ///
    /// This is the *expected* failure mode for papers without a structured
    /// document variant. It is logged at info level, not as an error.
    #[error("'{url}' is unavailable{}", fmt_status(.status))]
    Unavailable { url: String, status: Option<u16> },

    /// A timeout or connection-level failure that is worth retrying.
    ///
    /// Never escapes the retry loop: after the budget is exhausted it is
    /// reclassified as [`FetchError::Unavailable`].
    #[error("Transient failure fetching '{url}': {reason}")]
    Transient { url: String, reason: String },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {s})"),
        None => String::new(),
    }
}

impl FetchError {
    /// Collapse an exhausted transient failure into the unavailable class.
    pub fn into_unavailable(self) -> FetchError {
        match self {
            FetchError::Transient { url, .. } => FetchError::Unavailable { url, status: None },
            other => other,
        }
    }
}

/// A non-fatal document-structure failure.
///
/// The document was downloaded but could not be turned into sections or
/// figures. The orchestrator treats this exactly like an unavailable
/// document: fall back to the other format.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The structured document contains no recognisable section headings.
    #[error("Document has no recognisable section structure: {detail}")]
    NoStructure { detail: String },

    /// The PDF bytes could not be parsed at all.
    #[error("Malformed PDF: {0}")]
    MalformedPdf(#[from] lopdf::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_with_status() {
        let e = FetchError::Unavailable {
            url: "https://arxiv.org/html/2401.00001".into(),
            status: Some(404),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 404"), "got: {msg}");
        assert!(msg.contains("2401.00001"));
    }

    #[test]
    fn unavailable_display_without_status() {
        let e = FetchError::Unavailable {
            url: "https://arxiv.org/html/2401.00001".into(),
            status: None,
        };
        assert!(!e.to_string().contains("HTTP"));
    }

    #[test]
    fn transient_reclassifies_to_unavailable() {
        let e = FetchError::Transient {
            url: "https://arxiv.org/pdf/2401.00001.pdf".into(),
            reason: "connect timeout".into(),
        };
        match e.into_unavailable() {
            FetchError::Unavailable { url, status } => {
                assert_eq!(url, "https://arxiv.org/pdf/2401.00001.pdf");
                assert!(status.is_none());
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_display() {
        let e = ExtractError::InvalidConfig("probe timeout must be > 0".into());
        assert!(e.to_string().contains("probe timeout"));
    }
}
