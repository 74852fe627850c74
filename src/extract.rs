//! Extraction orchestrator: the policy layer over the pipeline stages.
//!
//! [`ContentExtractor`] owns the routing decision (structured first, PDF
//! fallback) and the degradation contract: once constructed, an extraction
//! call *always* returns an [`ExtractionResult`] — network failures, parse
//! failures, and cancellation all degrade to emptier results, never to an
//! error. The only fallible operation is construction itself.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::observer::ExtractionObserver;
use crate::output::{ExtractionMethod, ExtractionResult, Figure, CANONICAL_SECTIONS};
use crate::paper::PaperReference;
use crate::pipeline::fetch::Fetcher;
use crate::pipeline::sections::SectionRole;
use crate::pipeline::{html, pdf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Extracts sections and figures from research papers.
///
/// Cheap to share: hold it in an `Arc` and call
/// [`extract`](ContentExtractor::extract) concurrently — the underlying
/// HTTP connection pool is the only shared state.
///
/// # Example
/// ```rust,no_run
/// use paper_extract::{ContentExtractor, ExtractionConfig, PaperReference};
///
/// # async fn run() -> Result<(), paper_extract::ExtractError> {
/// let extractor = ContentExtractor::new(ExtractionConfig::default())?;
/// let paper = PaperReference::from_arxiv_id("2401.12345");
/// let result = extractor.extract(&paper).await;
/// println!("intro: {} chars", result.introduction().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ContentExtractor {
    config: ExtractionConfig,
    fetcher: Fetcher,
}

impl ContentExtractor {
    /// Construct an extractor, validating the configuration and building
    /// the shared HTTP client.
    ///
    /// This is the only place the library returns an error to the caller.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    /// The active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract content for one paper. Never fails; see the module docs.
    pub async fn extract(&self, paper: &PaperReference) -> ExtractionResult {
        self.extract_cancellable(paper, &CancellationToken::new())
            .await
    }

    /// Extract content for one paper, honouring a cancellation token.
    ///
    /// Cancellation is checked between network operations; a cancelled
    /// extraction returns the empty result shape for whatever path it was
    /// on, exactly like any other degraded run.
    pub async fn extract_cancellable(
        &self,
        paper: &PaperReference,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        let id = paper.arxiv_id.as_str();
        let mut structured_available = false;

        // ── Step 1: structured availability probe ──
        if self.config.prefer_structured && !cancel.is_cancelled() {
            structured_available = self.fetcher.probe(&paper.html_url).await;
            self.observe(|o| o.on_probe(id, structured_available));
            info!(
                paper = id,
                available = structured_available,
                "structured document probe"
            );

            // ── Step 2: structured extraction ──
            if structured_available {
                match self.try_structured(paper, cancel).await {
                    Ok(result) => return self.finish(id, result),
                    Err(reason) => {
                        info!(paper = id, reason, "falling back to PDF");
                        self.observe(|o| o.on_fallback(id, &reason));
                    }
                }
            } else {
                self.observe(|o| o.on_fallback(id, "structured document unavailable"));
            }
        }

        // ── Step 3: fallback extraction ──
        let result = self.try_fallback(paper, cancel, structured_available).await;
        self.finish(id, result)
    }

    /// The structured (HTML) path. Any failure is reported as a
    /// human-readable fallback reason, never an error.
    async fn try_structured(
        &self,
        paper: &PaperReference,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, String> {
        let id = paper.arxiv_id.as_str();

        if cancel.is_cancelled() {
            return Err("extraction cancelled".to_string());
        }

        let base = paper
            .image_base()
            .ok_or_else(|| format!("invalid structured URL '{}'", paper.html_url))?;

        let html = self
            .fetcher
            .fetch_document(&paper.html_url)
            .await
            .map_err(|e| e.to_string())?;

        let doc = html::parse_document(&html, &base, self.config.max_figures)
            .map_err(|e| e.to_string())?;

        self.observe(|o| o.on_structured_parsed(id, doc.sections.len(), doc.figures.len()));
        debug!(
            paper = id,
            sections = doc.sections.len(),
            figures = doc.figures.len(),
            "structured document parsed"
        );

        // A structured document without an introduction is a rendering
        // artefact (abstract-only stubs exist); the PDF usually has more.
        let has_intro = doc
            .role_text(SectionRole::Introduction)
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        if !has_intro {
            return Err("structured document has no introduction".to_string());
        }

        Ok(self.build_structured_result(paper, doc, cancel).await)
    }

    /// Assemble the canonical result from a parsed structured document,
    /// downloading figure bytes if configured.
    async fn build_structured_result(
        &self,
        paper: &PaperReference,
        doc: html::StructuredDocument,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        let id = paper.arxiv_id.as_str();
        let mut result = ExtractionResult::empty(ExtractionMethod::Structured, true);

        // Canonical slots lead the map in fixed order; every other
        // discovered section follows in document order. `or_insert` keeps
        // a filled canonical slot when a document section carries the
        // same normalised name.
        for role in [
            SectionRole::Introduction,
            SectionRole::Methodology,
            SectionRole::Conclusion,
        ] {
            if let Some(text) = doc.role_text(role) {
                result.sections.insert(role.key().to_string(), text.to_string());
            }
        }
        for (key, text) in &doc.sections {
            result
                .sections
                .entry(key.clone())
                .or_insert_with(|| text.clone());
        }

        let labelled: Vec<String> = [
            ("Introduction", result.introduction()),
            ("Methodology", result.methodology()),
            ("Conclusion", result.conclusion()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(label, text)| format!("{label}:\n{text}"))
        .collect();
        result.full_text = labelled.join("\n\n");

        for parsed in doc.figures {
            let mut figure = Figure {
                index: parsed.index,
                number: parsed.number,
                caption: parsed.caption,
                image_url: parsed.image_url.to_string(),
                image_bytes: None,
                media_type: None,
            };

            if self.config.download_figure_bytes && !cancel.is_cancelled() {
                match self.fetcher.fetch_image(figure.image_url.as_str()).await {
                    Ok((bytes, media_type)) => {
                        figure.image_bytes = Some(bytes);
                        figure.media_type = media_type;
                    }
                    Err(e) => {
                        warn!(
                            paper = id,
                            figure = figure.index,
                            error = %e,
                            "figure image download failed"
                        );
                        self.observe(|o| {
                            o.on_figure_image_failed(id, figure.index, &e.to_string())
                        });
                        if self.config.drop_unfetched_figures {
                            continue;
                        }
                    }
                }
            }

            result.figures.push(figure);
        }

        result
    }

    /// The fallback (PDF) path. Failures degrade to the empty result
    /// shape; embedded images come with the document, so figure bytes are
    /// always populated here.
    async fn try_fallback(
        &self,
        paper: &PaperReference,
        cancel: &CancellationToken,
        structured_available: bool,
    ) -> ExtractionResult {
        let id = paper.arxiv_id.as_str();
        let empty = || ExtractionResult::empty(ExtractionMethod::Fallback, structured_available);

        if cancel.is_cancelled() {
            return empty();
        }

        let bytes = match self.fetcher.fetch_pdf(&paper.pdf_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(paper = id, error = %e, "fallback document fetch failed");
                return empty();
            }
        };

        let parsed = match pdf::parse_document(&bytes, self.config.max_figures) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(paper = id, error = %e, "fallback document parse failed");
                return empty();
            }
        };

        let mut result = empty();
        result
            .sections
            .insert("introduction".to_string(), parsed.introduction);
        result.full_text = parsed.full_text;
        result.figures = parsed
            .figures
            .into_iter()
            .map(|f| Figure {
                index: f.index,
                number: f.number,
                caption: f.caption,
                image_url: format!("{}#page={}", paper.pdf_url, f.page),
                image_bytes: Some(f.bytes),
                media_type: Some(f.media_type),
            })
            .collect();

        result
    }

    /// Report empty canonical slots and completion, then hand the result
    /// back unchanged.
    fn finish(&self, id: &str, result: ExtractionResult) -> ExtractionResult {
        for key in CANONICAL_SECTIONS {
            let filled = result.sections.get(key).map(|s| !s.is_empty()).unwrap_or(false);
            if !filled {
                debug!(paper = id, section = key, "canonical section missing");
                self.observe(|o| o.on_section_missing(id, key));
            }
        }
        info!(
            paper = id,
            method = ?result.method,
            structured_available = result.structured_available,
            has_content = result.has_content(),
            figures = result.figures.len(),
            "extraction complete"
        );
        self.observe(|o| o.on_complete(id, result.method));
        result
    }

    fn observe(&self, f: impl FnOnce(&dyn ExtractionObserver)) {
        if let Some(observer) = &self.config.observer {
            f(observer.as_ref());
        }
    }
}
