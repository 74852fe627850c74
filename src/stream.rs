//! Streaming batch API: emit per-paper results as they complete.
//!
//! ## Why stream?
//!
//! A reading list runs to hundreds of papers and each extraction is
//! network-bound. A streams-based API lets callers write results to disk
//! incrementally, wire up progress bars, and cap concurrency without
//! buffering the entire batch in memory.
//!
//! Results arrive in completion order, not submission order; each item
//! carries its [`PaperReference`] so callers can re-associate. Per-paper
//! failures surface as degraded [`crate::output::ExtractionResult`]s, so
//! the stream itself never yields an error and never stops early.

use crate::extract::ContentExtractor;
use crate::output::ExtractionResult;
use crate::paper::PaperReference;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A boxed stream of per-paper extraction results.
pub type ResultStream = Pin<Box<dyn Stream<Item = (PaperReference, ExtractionResult)> + Send>>;

/// Extract a batch of papers with bounded concurrency.
///
/// `concurrency` is clamped to at least 1. The extractor is shared, so all
/// in-flight extractions draw from one connection pool.
///
/// # Example
/// ```rust,no_run
/// use paper_extract::{extract_batch, ContentExtractor, ExtractionConfig, PaperReference};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), paper_extract::ExtractError> {
/// let extractor = Arc::new(ContentExtractor::new(ExtractionConfig::default())?);
/// let papers = vec![
///     PaperReference::from_arxiv_id("2401.12345"),
///     PaperReference::from_arxiv_id("2402.67890"),
/// ];
/// let mut results = extract_batch(extractor, papers, 4);
/// while let Some((paper, result)) = results.next().await {
///     println!("{}: {:?}", paper.arxiv_id, result.method);
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_batch(
    extractor: Arc<ContentExtractor>,
    papers: Vec<PaperReference>,
    concurrency: usize,
) -> ResultStream {
    extract_batch_cancellable(extractor, papers, concurrency, CancellationToken::new())
}

/// [`extract_batch`] with a cancellation token.
///
/// Cancellation does not truncate the stream: papers already in flight
/// finish degraded, and not-yet-started papers yield the empty result
/// shape immediately. The item count always equals the input count.
pub fn extract_batch_cancellable(
    extractor: Arc<ContentExtractor>,
    papers: Vec<PaperReference>,
    concurrency: usize,
    cancel: CancellationToken,
) -> ResultStream {
    let concurrency = concurrency.max(1);
    info!(papers = papers.len(), concurrency, "starting batch extraction");

    let s = stream::iter(papers.into_iter().map(move |paper| {
        let extractor = Arc::clone(&extractor);
        let cancel = cancel.clone();
        async move {
            let result = extractor.extract_cancellable(&paper, &cancel).await;
            (paper, result)
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
