//! # paper-extract
//!
//! Extract structured content — sections and figures — from research
//! papers, HTML-first with PDF fallback.
//!
//! ## Why this crate?
//!
//! PDF text extraction is lossy: multi-column layouts, math, and figure
//! placement come out garbled, and section boundaries are guesswork. arXiv
//! publishes a machine-rendered HTML variant for most recent papers, and
//! parsing that markup yields clean, correctly-ordered sections and real
//! figure URLs. But the HTML variant is not guaranteed to exist, so a
//! robust pipeline needs both paths: try HTML, fall back to PDF, and
//! always hand the caller the same result shape.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PaperReference
//!  │
//!  ├─ 1. Probe    HEAD the HTML variant; unavailable → skip to 4
//!  ├─ 2. Parse    HTML → ordered sections + figure URLs (scraper)
//!  ├─ 3. Classify headings → introduction / methodology / conclusion
//!  ├─ 4. Fallback PDF → page text + intro excerpt + embedded images (lopdf)
//!  └─ 5. Output   one ExtractionResult, canonical slots always present
//! ```
//!
//! Per-paper failures never surface as errors: a paper that cannot be
//! fetched or parsed produces an empty result with its diagnostics
//! reported through `tracing` and the optional
//! [`ExtractionObserver`](observer::ExtractionObserver). The only
//! fallible call in the API is [`ContentExtractor::new`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_extract::{ContentExtractor, ExtractionConfig, PaperReference};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), paper_extract::ExtractError> {
//!     let extractor = ContentExtractor::new(ExtractionConfig::default())?;
//!     let result = extractor.extract(&PaperReference::from_arxiv_id("2401.12345")).await;
//!     println!("method: {:?}", result.method);
//!     println!("introduction: {} chars", result.introduction().len());
//!     for figure in &result.figures {
//!         println!("figure {}: {}", figure.number, figure.caption);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For batches, share the extractor and use [`extract_batch`]:
//! results stream back in completion order with bounded concurrency.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paperx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! paper-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod observer;
pub mod output;
pub mod paper;
pub mod pipeline;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PoolConfig, RetryPolicy, Timeouts};
pub use error::{ExtractError, FetchError, ParseError};
pub use extract::ContentExtractor;
pub use observer::{ExtractionObserver, NoopObserver, Observer};
pub use output::{ExtractionMethod, ExtractionResult, Figure, CANONICAL_SECTIONS};
pub use paper::PaperReference;
pub use stream::{extract_batch, extract_batch_cancellable, ResultStream};
