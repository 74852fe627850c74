//! Paper identity and source-URL derivation.
//!
//! A [`PaperReference`] is supplied by the discovery collaborator (search
//! client, reading-list reader, …) and carries everything the extraction
//! pipeline needs: an opaque identifier plus the two candidate source URLs.
//! When a URL is missing it is derived deterministically from the arXiv
//! identifier, so callers can hand over bare IDs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Trailing version suffix on an arXiv ID, e.g. `2401.12345v2`.
static RE_VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"v\d+$").unwrap());

/// A paper record handed to the extractor by the discovery collaborator.
///
/// Immutable once constructed. The structured (HTML) URL may point at a
/// document that does not exist — availability is probed at extraction
/// time, never assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperReference {
    /// Opaque paper identifier, e.g. `"2401.12345"` or `"2401.12345v2"`.
    pub arxiv_id: String,
    /// Canonical structured-document URL (arXiv LaTeXML rendering).
    pub html_url: String,
    /// Canonical fallback-document URL (PDF, always published).
    pub pdf_url: String,
}

impl PaperReference {
    /// Build a reference with explicit source URLs.
    pub fn new(
        arxiv_id: impl Into<String>,
        html_url: impl Into<String>,
        pdf_url: impl Into<String>,
    ) -> Self {
        Self {
            arxiv_id: arxiv_id.into(),
            html_url: html_url.into(),
            pdf_url: pdf_url.into(),
        }
    }

    /// Build a reference from a bare arXiv ID, deriving both source URLs.
    ///
    /// The version suffix is stripped for the HTML URL (arXiv serves the
    /// LaTeXML rendering under the unversioned ID) but kept for the PDF.
    pub fn from_arxiv_id(arxiv_id: impl Into<String>) -> Self {
        let arxiv_id = arxiv_id.into();
        let clean = strip_version(&arxiv_id);
        Self {
            html_url: format!("https://arxiv.org/html/{clean}"),
            pdf_url: format!("https://arxiv.org/pdf/{arxiv_id}.pdf"),
            arxiv_id,
        }
    }

    /// Base URL for resolving relative figure references.
    ///
    /// arXiv LaTeXML pages reference images relative to the paper's own
    /// path, so the base must be the paper-scoped directory
    /// (`…/html/<id>/`) — resolving against the host root would produce
    /// dead links.
    pub fn image_base(&self) -> Option<Url> {
        let with_slash = if self.html_url.ends_with('/') {
            self.html_url.clone()
        } else {
            format!("{}/", self.html_url)
        };
        Url::parse(&with_slash).ok()
    }
}

/// Strip a trailing `vN` version marker from an arXiv ID.
pub fn strip_version(arxiv_id: &str) -> &str {
    match RE_VERSION_SUFFIX.find(arxiv_id) {
        Some(m) => &arxiv_id[..m.start()],
        None => arxiv_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_version_suffix() {
        assert_eq!(strip_version("2401.12345v2"), "2401.12345");
        assert_eq!(strip_version("2401.12345"), "2401.12345");
        // Old-style IDs keep their archive prefix intact
        assert_eq!(strip_version("cs/0112017v1"), "cs/0112017");
    }

    #[test]
    fn derive_urls_from_id() {
        let paper = PaperReference::from_arxiv_id("2401.12345v3");
        assert_eq!(paper.html_url, "https://arxiv.org/html/2401.12345");
        assert_eq!(paper.pdf_url, "https://arxiv.org/pdf/2401.12345v3.pdf");
        assert_eq!(paper.arxiv_id, "2401.12345v3");
    }

    #[test]
    fn image_base_is_paper_scoped() {
        let paper = PaperReference::from_arxiv_id("2401.12345");
        let base = paper.image_base().unwrap();
        assert_eq!(base.as_str(), "https://arxiv.org/html/2401.12345/");

        let resolved = base.join("x1.png").unwrap();
        assert_eq!(resolved.as_str(), "https://arxiv.org/html/2401.12345/x1.png");
    }

    #[test]
    fn explicit_urls_are_kept() {
        let paper = PaperReference::new("id", "https://h/doc", "https://p/doc.pdf");
        assert_eq!(paper.html_url, "https://h/doc");
        assert_eq!(paper.pdf_url, "https://p/doc.pdf");
    }
}
