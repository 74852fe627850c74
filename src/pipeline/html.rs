//! Structured-document parser: arXiv LaTeXML HTML → sections + figures.
//!
//! Pure parsing logic — the raw markup comes in as a string, figures come
//! out as captions plus *references*; no network I/O happens here. That
//! split keeps the parser deterministic and unit-testable against fixture
//! documents, while the orchestrator decides whether figure bytes are
//! worth downloading.
//!
//! ## Section discovery
//!
//! Heading levels (`h2`/`h3`/`h4`) are treated as interchangeable: LaTeXML
//! nests them by sectioning depth, but a subsection is still a section to
//! the downstream summarizer. Each heading claims its containing
//! structural element (`section`/`article`/`div`); paragraphs inside a
//! nested section that has its own heading belong to that heading, not to
//! the ancestor's. Headings inside figure or table containers are
//! captions, not sections, and are skipped.

use crate::error::ParseError;
use crate::pipeline::sections::{assign_roles, normalise_heading, SectionRole};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

/// `Figure 3:` / `Fig. 2.1.` caption prefix; the label is captured.
static RE_CAPTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:figure|fig\.?)\s*(\d+(?:\.\d+)*)\s*[:.]\s*").unwrap());

/// Element names that act as section containers.
const STRUCTURAL: [&str; 3] = ["section", "article", "div"];

/// Element names whose headings are captions, not sections.
const CAPTION_CONTAINERS: [&str; 3] = ["figure", "figcaption", "table"];

/// A figure parsed from the document: caption plus resolved reference.
/// Bytes are fetched later, and only on request.
#[derive(Debug, Clone)]
pub struct ParsedFigure {
    /// 1-based extraction order.
    pub index: usize,
    /// Label from the caption, or the ordinal as a string.
    pub number: String,
    /// Caption with the `Figure N:` prefix stripped.
    pub caption: String,
    /// Absolute image URL.
    pub image_url: Url,
}

/// The parser's output: every discovered section in document order, the
/// canonical-role assignment over those sections, and up to N figures.
#[derive(Debug, Clone)]
pub struct StructuredDocument {
    /// Normalised section key → body text, in document order.
    pub sections: IndexMap<String, String>,
    /// Canonical role → section key (first match wins).
    pub roles: HashMap<SectionRole, String>,
    pub figures: Vec<ParsedFigure>,
}

impl StructuredDocument {
    /// Body text of the section assigned to `role`, if any.
    pub fn role_text(&self, role: SectionRole) -> Option<&str> {
        let key = self.roles.get(&role)?;
        self.sections.get(key).map(String::as_str)
    }
}

/// Parse a structured HTML document into sections and figures.
///
/// `base` is the paper-scoped URL used to resolve relative image
/// references (see [`crate::paper::PaperReference::image_base`]).
///
/// Returns [`ParseError::NoStructure`] when the markup contains no
/// recognisable section headings at all — the orchestrator treats that
/// exactly like an unavailable document.
pub fn parse_document(
    html: &str,
    base: &Url,
    max_figures: usize,
) -> Result<StructuredDocument, ParseError> {
    let doc = Html::parse_document(html);

    let sections = discover_sections(&doc);
    if sections.is_empty() {
        return Err(ParseError::NoStructure {
            detail: "no headings with non-empty bodies found".into(),
        });
    }

    let roles = assign_roles(sections.keys().map(String::as_str));
    let figures = discover_figures(&doc, base, max_figures);

    debug!(
        sections = sections.len(),
        figures = figures.len(),
        "parsed structured document"
    );

    Ok(StructuredDocument {
        sections,
        roles,
        figures,
    })
}

// ── Section discovery ────────────────────────────────────────────────────

fn discover_sections(doc: &Html) -> IndexMap<String, String> {
    let heading_sel = Selector::parse("h2, h3, h4").expect("static selector");
    let p_sel = Selector::parse("p").expect("static selector");

    let mut sections: IndexMap<String, String> = IndexMap::new();
    let mut claimed = HashSet::new();

    for heading in doc.select(&heading_sel) {
        if is_inside_caption_container(heading) {
            continue;
        }

        let Some(container) = structural_container(heading) else {
            continue;
        };
        // A second heading inside an already-claimed element is not a new
        // top-level section.
        if !claimed.insert(container.id()) {
            continue;
        }

        let key = normalise_heading(&element_text(heading));
        if key.is_empty() {
            continue;
        }

        let body = section_body(container, heading, &p_sel, &heading_sel);
        if body.is_empty() {
            continue;
        }

        let key = deduplicate_key(&sections, key);
        sections.insert(key, body);
    }

    sections
}

/// Nearest `section`/`article`/`div` ancestor of a heading.
fn structural_container(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| STRUCTURAL.contains(&el.value().name()))
}

/// True when any ancestor is a figure or table container.
fn is_inside_caption_container(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| CAPTION_CONTAINERS.contains(&a.value().name()))
}

/// Blank-line-joined text of the container's paragraphs, excluding those
/// claimed by a nested section with its own heading and those inside
/// figure/table containers.
fn section_body(
    container: ElementRef<'_>,
    heading: ElementRef<'_>,
    p_sel: &Selector,
    heading_sel: &Selector,
) -> String {
    let mut paragraphs: Vec<String> = Vec::new();

    for p in container.select(p_sel) {
        if is_inside_caption_container(p) {
            continue;
        }

        if let Some(nested) = nearest_section(p) {
            if nested.id() != container.id() {
                let has_own_heading = nested
                    .select(heading_sel)
                    .any(|h| h.id() != heading.id());
                if has_own_heading {
                    continue;
                }
            }
        }

        let text = element_text(p);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    paragraphs.join("\n\n")
}

/// Nearest `section` ancestor (sections only — LaTeXML wraps individual
/// paragraphs in divs, which are not sectioning boundaries).
fn nearest_section(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "section")
}

/// Whitespace-collapsed text content of an element.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Suffix a colliding key with `_2`, `_3`, … rather than overwrite.
fn deduplicate_key(sections: &IndexMap<String, String>, key: String) -> String {
    if !sections.contains_key(&key) {
        return key;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{key}_{n}");
        if !sections.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ── Figure discovery ─────────────────────────────────────────────────────

fn discover_figures(doc: &Html, base: &Url, max_figures: usize) -> Vec<ParsedFigure> {
    let figure_sel = Selector::parse("figure").expect("static selector");
    let img_sel = Selector::parse("img").expect("static selector");
    let caption_sel = Selector::parse("figcaption").expect("static selector");

    let mut figures: Vec<ParsedFigure> = Vec::new();

    for figure in doc.select(&figure_sel) {
        if figures.len() >= max_figures {
            break;
        }
        // A figure nested in another figure is a subfigure of it, not a
        // separate figure.
        let nested = figure
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "figure");
        if nested {
            continue;
        }

        let Some(image_url) = figure
            .select(&img_sel)
            .find_map(|img| img.value().attr("src"))
            .and_then(|src| resolve_image_url(src, base))
        else {
            // No resolvable reference: the figure is skipped entirely,
            // never emitted with an empty URL.
            debug!("skipping figure without resolvable image reference");
            continue;
        };

        let index = figures.len() + 1;
        let raw_caption = figure
            .select(&caption_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let (number, caption) = split_caption(&raw_caption, index);

        figures.push(ParsedFigure {
            index,
            number,
            caption,
            image_url,
        });
    }

    figures
}

/// Resolve an image `src` attribute to an absolute URL.
fn resolve_image_url(src: &str, base: &Url) -> Option<Url> {
    if src.is_empty() {
        return None;
    }
    base.join(src).ok()
}

/// Strip the `Figure N:` prefix, returning the captured label (or the
/// ordinal as a string) and the remaining caption text.
fn split_caption(raw: &str, ordinal: usize) -> (String, String) {
    match RE_CAPTION_PREFIX.captures(raw) {
        Some(caps) => {
            let number = caps[1].to_string();
            let rest = raw[caps.get(0).map(|m| m.end()).unwrap_or(0)..].trim().to_string();
            (number, rest)
        }
        None => (ordinal.to_string(), raw.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://arxiv.org/html/2401.00001/").unwrap()
    }

    const FIXTURE: &str = r#"
<html><body><article>
  <section id="S1">
    <h2>1 Introduction</h2>
    <div><p>Deep nets are  everywhere.</p></div>
    <div><p>We study why.</p></div>
  </section>
  <section id="S2">
    <h2>2 Methodology</h2>
    <p>We train a probe.</p>
    <section id="S2.1">
      <h3>2.1 Probe Design</h3>
      <p>The probe is linear.</p>
    </section>
    <figure>
      <img src="x1.png"/>
      <figcaption>Figure 1: Probe architecture overview.</figcaption>
    </figure>
  </section>
  <section id="S3">
    <h2>3 Related Work</h2>
    <p>Many papers exist.</p>
  </section>
  <section id="S4">
    <h2>4 Conclusion</h2>
    <p>Probes work.</p>
    <figure>
      <img src="/static/x2.png"/>
      <figcaption>Figure 2.1: Accuracy per layer.</figcaption>
    </figure>
  </section>
</article></body></html>"#;

    #[test]
    fn round_trip_fixture() {
        let doc = parse_document(FIXTURE, &base(), 3).unwrap();

        let keys: Vec<&String> = doc.sections.keys().collect();
        assert_eq!(
            keys,
            ["introduction", "methodology", "probe_design", "related_work", "conclusion"]
        );

        assert_eq!(
            doc.role_text(SectionRole::Introduction),
            Some("Deep nets are everywhere.\n\nWe study why.")
        );
        // The nested "Probe Design" paragraph belongs to its own heading
        assert_eq!(doc.role_text(SectionRole::Methodology), Some("We train a probe."));
        assert_eq!(doc.role_text(SectionRole::Conclusion), Some("Probes work."));

        assert_eq!(doc.figures.len(), 2);
        let f1 = &doc.figures[0];
        assert_eq!(f1.index, 1);
        assert_eq!(f1.number, "1");
        assert_eq!(f1.caption, "Probe architecture overview.");
        assert_eq!(f1.image_url.as_str(), "https://arxiv.org/html/2401.00001/x1.png");

        let f2 = &doc.figures[1];
        assert_eq!(f2.index, 2);
        assert_eq!(f2.number, "2.1"); // document label, not the ordinal
        assert_eq!(f2.caption, "Accuracy per layer.");
        assert_eq!(f2.image_url.as_str(), "https://arxiv.org/static/x2.png");
    }

    #[test]
    fn max_figures_caps_output() {
        let doc = parse_document(FIXTURE, &base(), 1).unwrap();
        assert_eq!(doc.figures.len(), 1);
        assert_eq!(doc.figures[0].number, "1");
    }

    #[test]
    fn figure_without_image_reference_is_skipped() {
        let html = r#"
<section><h2>1 Introduction</h2><p>Text.</p>
  <figure><figcaption>Figure 1: Orphan caption.</figcaption></figure>
  <figure><img src="ok.png"/><figcaption>Figure 2: Has image.</figcaption></figure>
</section>"#;
        let doc = parse_document(html, &base(), 5).unwrap();
        assert_eq!(doc.figures.len(), 1);
        assert_eq!(doc.figures[0].caption, "Has image.");
        // extraction-order index, independent of the document label
        assert_eq!(doc.figures[0].index, 1);
        assert_eq!(doc.figures[0].number, "2");
    }

    #[test]
    fn caption_without_prefix_defaults_number_to_ordinal() {
        let html = r#"
<section><h2>1 Introduction</h2><p>Text.</p>
  <figure><img src="a.png"/><figcaption>Just a caption.</figcaption></figure>
</section>"#;
        let doc = parse_document(html, &base(), 5).unwrap();
        assert_eq!(doc.figures[0].number, "1");
        assert_eq!(doc.figures[0].caption, "Just a caption.");
    }

    #[test]
    fn headings_inside_figures_and_tables_are_not_sections() {
        let html = r#"
<section><h2>1 Introduction</h2><p>Text.</p>
  <figure><h4>Figure heading</h4><img src="a.png"/></figure>
  <table><tr><td><h3>Table caption</h3></td></tr></table>
</section>"#;
        let doc = parse_document(html, &base(), 5).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections.contains_key("introduction"));
    }

    #[test]
    fn colliding_keys_get_suffixed() {
        let html = r#"
<article>
  <section><h2>Discussion</h2><p>First.</p></section>
  <section><h2>Discussion</h2><p>Second.</p></section>
</article>"#;
        let doc = parse_document(html, &base(), 0).unwrap();
        assert_eq!(doc.sections["discussion"], "First.");
        assert_eq!(doc.sections["discussion_2"], "Second.");
        // First one wins the conclusion role
        assert_eq!(doc.role_text(SectionRole::Conclusion), Some("First."));
    }

    #[test]
    fn empty_section_bodies_are_discarded() {
        let html = r#"
<article>
  <section><h2>1 Introduction</h2><p>Real text.</p></section>
  <section><h2>Acknowledgements</h2></section>
</article>"#;
        let doc = parse_document(html, &base(), 0).unwrap();
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn no_headings_is_a_structure_error() {
        let err = parse_document("<html><body><p>Hi</p></body></html>", &base(), 3).unwrap_err();
        assert!(matches!(err, ParseError::NoStructure { .. }));
    }

    #[test]
    fn second_heading_in_claimed_container_is_ignored() {
        let html = r#"
<section>
  <h2>1 Introduction</h2>
  <h3>Motivation</h3>
  <p>Body text.</p>
</section>"#;
        let doc = parse_document(html, &base(), 0).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections.contains_key("introduction"));
    }

    #[test]
    fn roman_numeral_headings_normalise() {
        let html = r#"
<article>
  <section><h2>I. Introduction</h2><p>Alpha.</p></section>
  <section><h2>IV. Experiments</h2><p>Beta.</p></section>
</article>"#;
        let doc = parse_document(html, &base(), 0).unwrap();
        assert!(doc.sections.contains_key("introduction"));
        assert!(doc.sections.contains_key("experiments"));
    }
}
