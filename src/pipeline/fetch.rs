//! Network access: probe, document, and image fetches over a shared client.
//!
//! One [`Fetcher`] wraps one pooled `reqwest::Client` and is shared by
//! every concurrent extraction; the pool bound doubles as backpressure.
//! Each request category gets its own timeout from
//! [`crate::config::Timeouts`].
//!
//! ## Retry Strategy
//!
//! Timeouts, connection failures, and a configured set of status codes
//! (429/5xx by default) are retried with exponential backoff
//! (`backoff_ms * 2^(attempt-1)`): with 500 ms base and 3 retries the wait
//! sequence is 500 ms → 1 s → 2 s. A plain 404 is never retried — a paper
//! without a structured document variant stays without one, and retrying
//! only delays the fallback.

use crate::config::{ExtractionConfig, RetryPolicy, Timeouts};
use crate::error::{ExtractError, FetchError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Shared HTTP access layer for the extraction pipeline.
///
/// In-flight requests are bounded by a semaphore sized to the pool's
/// `max_pool_size`: excess concurrent requests wait for a slot instead of
/// opening unbounded sockets. The permit is held until the response body
/// has been read.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    timeouts: Timeouts,
    permits: Semaphore,
}

impl Fetcher {
    /// Build the shared client from the extraction config.
    ///
    /// Client construction is the one network-layer operation that is
    /// allowed to fail fatally; it happens once, before any paper is
    /// touched.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.timeouts.connect_ms))
            .pool_max_idle_per_host(config.pool.pool_size)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ExtractError::HttpClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
            timeouts: config.timeouts.clone(),
            permits: Semaphore::new(config.pool.max_pool_size),
        })
    }

    /// Wait for a request slot.
    ///
    /// The semaphore is never closed, so failure here is unreachable in
    /// practice; it is still mapped rather than unwrapped.
    async fn acquire(&self, url: &str) -> Result<SemaphorePermit<'_>, FetchError> {
        self.permits
            .acquire()
            .await
            .map_err(|_| FetchError::Unavailable {
                url: url.to_string(),
                status: None,
            })
    }

    /// HEAD-probe a URL for availability.
    ///
    /// Infallible by design: any failure (timeout, DNS, non-2xx) is
    /// `false`. The probe is a cheap routing decision, not a fetch; it is
    /// never retried.
    pub async fn probe(&self, url: &str) -> bool {
        let Ok(_permit) = self.permits.acquire().await else {
            return false;
        };
        let result = self
            .client
            .head(url)
            .timeout(Duration::from_millis(self.timeouts.probe_ms))
            .send()
            .await;
        match result {
            Ok(resp) => {
                let available = resp.status().is_success();
                debug!(url, status = %resp.status(), available, "availability probe");
                available
            }
            Err(e) => {
                debug!(url, error = %e, "availability probe failed");
                false
            }
        }
    }

    /// Fetch a document body as text (the structured HTML path).
    pub async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self.acquire(url).await?;
        let resp = self.get_with_retry(url, self.timeouts.document_ms).await?;
        resp.text().await.map_err(|e| {
            warn!(url, error = %e, "failed reading document body");
            FetchError::Unavailable {
                url: url.to_string(),
                status: None,
            }
        })
    }

    /// Fetch a document body as bytes (the fallback PDF path).
    pub async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let _permit = self.acquire(url).await?;
        let resp = self.get_with_retry(url, self.timeouts.document_ms).await?;
        let bytes = resp.bytes().await.map_err(|e| {
            warn!(url, error = %e, "failed reading PDF body");
            FetchError::Unavailable {
                url: url.to_string(),
                status: None,
            }
        })?;
        Ok(bytes.to_vec())
    }

    /// Fetch an image, returning its bytes and the response media type.
    pub async fn fetch_image(
        &self,
        url: &str,
    ) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let _permit = self.acquire(url).await?;
        let resp = self.get_with_retry(url, self.timeouts.image_ms).await?;
        let media_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(';').next())
            .map(|s| s.trim().to_string());
        let bytes = resp.bytes().await.map_err(|e| {
            warn!(url, error = %e, "failed reading image body");
            FetchError::Unavailable {
                url: url.to_string(),
                status: None,
            }
        })?;
        Ok((bytes.to_vec(), media_type))
    }

    /// GET with bounded retry.
    ///
    /// Retries only on timeouts, connection failures, and the configured
    /// retryable status codes. Anything else returns immediately as
    /// [`FetchError::Unavailable`]; an exhausted retry budget is collapsed
    /// into the same class so `Transient` never escapes this function.
    async fn get_with_retry(&self, url: &str, timeout_ms: u64) -> Result<Response, FetchError> {
        let max_retries = if self.retry.enabled {
            self.retry.max_retries
        } else {
            0
        };
        let mut last_err = FetchError::Unavailable {
            url: url.to_string(),
            status: None,
        };

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let backoff = self.retry.backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    url,
                    attempt,
                    max_retries,
                    backoff_ms = backoff,
                    "retrying fetch"
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let result = self
                .client
                .get(url)
                .timeout(Duration::from_millis(timeout_ms))
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    let err = FetchError::Unavailable {
                        url: url.to_string(),
                        status: Some(status.as_u16()),
                    };
                    if !self.retry.retryable_status.contains(&status.as_u16()) {
                        return Err(err);
                    }
                    last_err = err;
                }
                Err(e) => {
                    if !(e.is_timeout() || e.is_connect()) {
                        return Err(FetchError::Unavailable {
                            url: url.to_string(),
                            status: e.status().map(|s| s.as_u16()),
                        });
                    }
                    last_err = FetchError::Transient {
                        url: url.to_string(),
                        reason: e.to_string(),
                    };
                }
            }
        }

        info!(url, "fetch attempts exhausted");
        Err(last_err.into_unavailable())
    }
}
