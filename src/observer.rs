//! Diagnostics-callback trait for per-paper extraction events.
//!
//! Inject an [`Arc<dyn ExtractionObserver>`] via
//! [`crate::config::ExtractionConfigBuilder::observer`] to receive
//! real-time events as the pipeline works through a paper.
//!
//! # Why callbacks instead of a global logger?
//!
//! The pipeline also logs through `tracing`, but tests and batch operators
//! need to *assert* on degraded extractions (probe failed, fell back, no
//! introduction found) without capturing a global subscriber. The callback
//! is the least-invasive integration point: callers can forward events to a
//! channel, a metrics sink, or a terminal progress bar without the library
//! knowing how the host application communicates. The trait is
//! `Send + Sync` so it works when many papers are extracted concurrently.

use crate::output::ExtractionMethod;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each paper.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. When papers are extracted concurrently via
/// [`crate::stream::extract_batch`], methods may be called from different
/// tasks; implementations must synchronise shared mutable state.
pub trait ExtractionObserver: Send + Sync {
    /// Called after the structured-document availability probe.
    fn on_probe(&self, paper_id: &str, available: bool) {
        let _ = (paper_id, available);
    }

    /// Called when the structured document parsed successfully.
    fn on_structured_parsed(&self, paper_id: &str, sections: usize, figures: usize) {
        let _ = (paper_id, sections, figures);
    }

    /// Called when the pipeline abandons the structured path.
    ///
    /// `reason` is a human-readable description (probe failure, download
    /// failure, parse failure, empty introduction, cancellation).
    fn on_fallback(&self, paper_id: &str, reason: &str) {
        let _ = (paper_id, reason);
    }

    /// Called when a canonical section slot ends up empty.
    ///
    /// The caller is expected to substitute the paper's abstract outside
    /// this subsystem; this event is how it learns that it must.
    fn on_section_missing(&self, paper_id: &str, section: &str) {
        let _ = (paper_id, section);
    }

    /// Called when a figure's image download fails (the figure itself is
    /// kept with its reference URL unless configured otherwise).
    fn on_figure_image_failed(&self, paper_id: &str, index: usize, error: &str) {
        let _ = (paper_id, index, error);
    }

    /// Called once per paper when a terminal result has been produced.
    fn on_complete(&self, paper_id: &str, method: ExtractionMethod) {
        let _ = (paper_id, method);
    }
}

/// A no-op implementation for callers that don't need diagnostics events.
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type Observer = Arc<dyn ExtractionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingObserver {
        probes: AtomicUsize,
        fallbacks: Mutex<Vec<String>>,
        completes: AtomicUsize,
    }

    impl ExtractionObserver for TrackingObserver {
        fn on_probe(&self, _paper_id: &str, _available: bool) {
            self.probes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_fallback(&self, _paper_id: &str, reason: &str) {
            self.fallbacks.lock().unwrap().push(reason.to_string());
        }

        fn on_complete(&self, _paper_id: &str, _method: ExtractionMethod) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_probe("2401.00001", false);
        obs.on_structured_parsed("2401.00001", 5, 2);
        obs.on_fallback("2401.00001", "probe failed");
        obs.on_section_missing("2401.00001", "conclusion");
        obs.on_figure_image_failed("2401.00001", 1, "timeout");
        obs.on_complete("2401.00001", ExtractionMethod::Fallback);
    }

    #[test]
    fn tracking_observer_receives_events() {
        let obs = TrackingObserver::default();
        obs.on_probe("a", false);
        obs.on_fallback("a", "structured document unavailable");
        obs.on_complete("a", ExtractionMethod::Fallback);

        assert_eq!(obs.probes.load(Ordering::SeqCst), 1);
        assert_eq!(obs.completes.load(Ordering::SeqCst), 1);
        assert_eq!(
            obs.fallbacks.lock().unwrap().as_slice(),
            ["structured document unavailable"]
        );
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: Arc<dyn ExtractionObserver> = Arc::new(NoopObserver);
        obs.on_probe("x", true);
        obs.on_complete("x", ExtractionMethod::Structured);
    }
}
