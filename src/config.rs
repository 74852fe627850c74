//! Configuration types for content extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share configs across tasks and to diff two
//! runs to understand why their outputs differ.
//!
//! Validation happens once, in [`ExtractionConfigBuilder::build`]: an
//! invalid configuration is the *only* error the library ever raises, and
//! it is raised before any paper is touched — never mid-batch.

use crate::error::ExtractError;
use crate::observer::Observer;
use std::fmt;
use std::sync::Arc;

/// Category-specific network timeouts, in milliseconds.
///
/// The availability probe, the document download, and individual image
/// downloads have very different latency profiles: a probe should answer
/// fast or not at all, while an HTML document for a figure-heavy paper can
/// legitimately take tens of seconds. One shared timeout forces the worst
/// case onto every category, which is exactly the bug the independent
/// fields exist to avoid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Availability probe (HEAD). Default: 10 000.
    pub probe_ms: u64,
    /// Full document fetch (HTML or PDF). Default: 30 000.
    pub document_ms: u64,
    /// Per-image fetch. Default: 15 000.
    pub image_ms: u64,
    /// TCP connection establishment. Default: 10 000.
    pub connect_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_ms: 10_000,
            document_ms: 30_000,
            image_ms: 15_000,
            connect_ms: 10_000,
        }
    }
}

/// Bounded retry with exponential backoff for transient network failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Master switch. When off, every request gets exactly one attempt.
    pub enabled: bool,
    /// Additional attempts after the first. Default: 3.
    pub max_retries: u32,
    /// Initial backoff in milliseconds; doubles after each attempt
    /// (500 ms → 1 s → 2 s). Default: 500.
    pub backoff_ms: u64,
    /// Status codes worth retrying. 4xx not-found responses are never
    /// retried — a missing structured document stays missing.
    /// Default: 429, 500, 502, 503, 504.
    pub retryable_status: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            backoff_ms: 500,
            retryable_status: vec![429, 500, 502, 503, 504],
        }
    }
}

/// Connection-pool bounds for the shared HTTP client.
///
/// The pool is the only state shared across concurrent extractions and
/// its ceiling doubles as backpressure: requests past `max_pool_size`
/// wait for a slot instead of opening unbounded sockets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle connections kept warm per host for reuse. Default: 10.
    pub pool_size: usize,
    /// Hard ceiling on concurrent in-flight requests. Default: 20.
    pub max_pool_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            max_pool_size: 20,
        }
    }
}

/// Configuration for a [`crate::extract::ContentExtractor`].
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use paper_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_figures(5)
///     .download_figure_bytes(true)
///     .timeout_ms(20_000) // legacy scalar: broadcast to all four timeouts
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Try the structured (HTML) path first. Default: true.
    ///
    /// When false, the probe is never issued and every paper goes straight
    /// to the fallback parser.
    pub prefer_structured: bool,

    /// Download figure image bytes on the structured path. Default: false.
    ///
    /// Reference-only extraction is the default because most consumers
    /// (summaries, sync writers) only need the URL; bytes multiply the
    /// per-paper network cost by the figure count.
    pub download_figure_bytes: bool,

    /// Drop a figure whose image download failed instead of keeping it
    /// reference-only. Default: false — downstream consumers can still use
    /// the URL, so discarding the caption too loses information.
    pub drop_unfetched_figures: bool,

    /// Figure cap shared by both parsers. Default: 3.
    pub max_figures: usize,

    /// Category-specific network timeouts.
    pub timeouts: Timeouts,

    /// Retry policy for transient network failures.
    pub retry: RetryPolicy,

    /// Connection-pool bounds.
    pub pool: PoolConfig,

    /// User-Agent header. arXiv throttles unidentified clients, so the
    /// default is a browser-like string with a bot marker.
    pub user_agent: String,

    /// Optional diagnostics observer (see [`crate::observer`]).
    pub observer: Option<Observer>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            prefer_structured: true,
            download_figure_bytes: false,
            drop_unfetched_figures: false,
            max_figures: 3,
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            pool: PoolConfig::default(),
            user_agent: "Mozilla/5.0 (compatible; paper-extract/0.1)".to_string(),
            observer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("prefer_structured", &self.prefer_structured)
            .field("download_figure_bytes", &self.download_figure_bytes)
            .field("drop_unfetched_figures", &self.drop_unfetched_figures)
            .field("max_figures", &self.max_figures)
            .field("timeouts", &self.timeouts)
            .field("retry", &self.retry)
            .field("pool", &self.pool)
            .field("user_agent", &self.user_agent)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ExtractionObserver>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Validate invariants shared by the builder and the extractor
    /// constructor.
    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        let t = &self.timeouts;
        for (name, value) in [
            ("probe", t.probe_ms),
            ("document", t.document_ms),
            ("image", t.image_ms),
            ("connect", t.connect_ms),
        ] {
            if value == 0 {
                return Err(ExtractError::InvalidConfig(format!(
                    "{name} timeout must be > 0 ms"
                )));
            }
        }
        if self.retry.enabled {
            if self.retry.backoff_ms == 0 {
                return Err(ExtractError::InvalidConfig(
                    "retry backoff must be > 0 ms when retry is enabled".into(),
                ));
            }
            if self.retry.max_retries > 10 {
                return Err(ExtractError::InvalidConfig(format!(
                    "max_retries must be ≤ 10, got {}",
                    self.retry.max_retries
                )));
            }
        }
        if self.pool.pool_size == 0 || self.pool.max_pool_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "connection pool sizes must be ≥ 1".into(),
            ));
        }
        if self.pool.max_pool_size < self.pool.pool_size {
            return Err(ExtractError::InvalidConfig(format!(
                "max_pool_size ({}) must be ≥ pool_size ({})",
                self.pool.max_pool_size, self.pool.pool_size
            )));
        }
        Ok(())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn prefer_structured(mut self, v: bool) -> Self {
        self.config.prefer_structured = v;
        self
    }

    pub fn download_figure_bytes(mut self, v: bool) -> Self {
        self.config.download_figure_bytes = v;
        self
    }

    pub fn drop_unfetched_figures(mut self, v: bool) -> Self {
        self.config.drop_unfetched_figures = v;
        self
    }

    pub fn max_figures(mut self, n: usize) -> Self {
        self.config.max_figures = n;
        self
    }

    /// Legacy scalar timeout: broadcast to all four timeout categories.
    ///
    /// Kept for callers migrating from the single-timeout configuration
    /// shape; new callers should set the categories individually.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts = Timeouts {
            probe_ms: ms,
            document_ms: ms,
            image_ms: ms,
            connect_ms: ms,
        };
        self
    }

    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.probe_ms = ms;
        self
    }

    pub fn document_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.document_ms = ms;
        self
    }

    pub fn image_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.image_ms = ms;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn retry_enabled(mut self, v: bool) -> Self {
        self.config.retry.enabled = v;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.retry.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry.backoff_ms = ms;
        self
    }

    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.config.pool = pool;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Convenience overload taking any concrete observer.
    pub fn observer_arc<O: crate::observer::ExtractionObserver + 'static>(
        mut self,
        observer: Arc<O>,
    ) -> Self {
        let observer: Observer = observer;
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert!(config.prefer_structured);
        assert!(!config.download_figure_bytes);
        assert_eq!(config.max_figures, 3);
        assert_eq!(config.timeouts.document_ms, 30_000);
        assert_eq!(config.retry.retryable_status, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn legacy_scalar_timeout_broadcasts() {
        let config = ExtractionConfig::builder().timeout_ms(7_000).build().unwrap();
        assert_eq!(config.timeouts.probe_ms, 7_000);
        assert_eq!(config.timeouts.document_ms, 7_000);
        assert_eq!(config.timeouts.image_ms, 7_000);
        assert_eq!(config.timeouts.connect_ms, 7_000);
    }

    #[test]
    fn zero_timeout_is_fatal() {
        let err = ExtractionConfig::builder()
            .probe_timeout_ms(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("probe timeout"));
    }

    #[test]
    fn zero_backoff_with_retry_is_fatal() {
        let err = ExtractionConfig::builder()
            .retry_backoff_ms(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("backoff"));
    }

    #[test]
    fn zero_backoff_ok_when_retry_disabled() {
        let config = ExtractionConfig::builder()
            .retry_enabled(false)
            .retry_backoff_ms(0)
            .build()
            .unwrap();
        assert!(!config.retry.enabled);
    }

    #[test]
    fn inverted_pool_bounds_are_fatal() {
        let err = ExtractionConfig::builder()
            .pool(PoolConfig {
                pool_size: 20,
                max_pool_size: 5,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_pool_size"));
    }

    #[test]
    fn individual_timeouts_are_independent() {
        let config = ExtractionConfig::builder()
            .probe_timeout_ms(1_000)
            .document_timeout_ms(60_000)
            .build()
            .unwrap();
        assert_eq!(config.timeouts.probe_ms, 1_000);
        assert_eq!(config.timeouts.document_ms, 60_000);
        assert_eq!(config.timeouts.image_ms, 15_000);
    }
}
