//! Fallback document parser: PDF bytes → best-effort text + figures.
//!
//! PDFs carry no reliable section markup, so this parser promises much
//! less than the structured one: page-ordered full text, a regex-located
//! introduction excerpt, and embedded images with page-scoped captions.
//! No methodology/conclusion extraction is attempted — the format does not
//! offer trustworthy section boundaries, and callers must treat their
//! absence as expected. Everything here is pure: bytes in, text out,
//! images come straight from the document with no network fetch.

use crate::error::ParseError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Pages scanned for embedded images. Figures overwhelmingly live in the
/// front half of a paper; scanning the whole document triples parse time
/// for appendix-heavy papers without finding more figures.
const PAGE_SCAN_LIMIT: usize = 10;

/// Images below this size are icons, rules, or logos — not figures.
const MIN_IMAGE_BYTES: usize = 10_000;

/// Introduction excerpt cap. When the next-section terminator fails to
/// match, the open-ended pattern would otherwise swallow the entire paper.
const MAX_INTRO_CHARS: usize = 3_000;

const MAX_CAPTION_CHARS: usize = 300;

/// `1 Introduction` / `I. Introduction`, terminated by the next
/// numbered/roman section heading.
static RE_INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:\A|\n)\s*(?:1\.?|I\.?)[ \t]+introduction\s*\n(.*?)\n\s*(?:2\.?|II\.?)[ \t]+\S")
        .unwrap()
});

/// Unnumbered `Introduction` heading, terminated by a recognisable next
/// section word.
static RE_INTRO_PLAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:\A|\n)introduction\s*\n(.*?)\n(?:2|II|method|approach|background)\b")
        .unwrap()
});

/// Open-ended last resort; relies on [`MAX_INTRO_CHARS`] for termination.
static RE_INTRO_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)(?:\A|\n)\s*(?:1\.?|I\.?)[ \t]+introduction\s*\n(.*)").unwrap());

/// A figure extracted from the PDF, bytes included.
#[derive(Debug, Clone)]
pub struct PdfFigure {
    /// 1-based extraction order.
    pub index: usize,
    /// Always the ordinal as a string on this path — PDF captions are
    /// matched *by* ordinal, not parsed for labels.
    pub number: String,
    /// Matched caption, or the placeholder `Figure <n>`.
    pub caption: String,
    /// 1-based page the image was found on.
    pub page: u32,
    pub bytes: Vec<u8>,
    /// MIME type derived from the image stream filter. Always known:
    /// only self-contained JPEG/JPEG 2000 streams are emitted.
    pub media_type: String,
}

/// The fallback parser's output.
#[derive(Debug, Clone)]
pub struct FallbackDocument {
    /// Per-page extracted text concatenated in page order.
    pub full_text: String,
    /// Best-effort introduction excerpt; empty when no pattern matched.
    pub introduction: String,
    pub figures: Vec<PdfFigure>,
}

/// Parse raw PDF bytes into best-effort text and figures.
pub fn parse_document(bytes: &[u8], max_figures: usize) -> Result<FallbackDocument, ParseError> {
    let doc = Document::load_mem(bytes)?;

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let page_texts: Vec<(u32, String)> = pages
        .iter()
        .map(|&(page_no, _)| (page_no, doc.extract_text(&[page_no]).unwrap_or_default()))
        .collect();

    let full_text = page_texts
        .iter()
        .map(|(_, t)| t.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let introduction = extract_introduction(&full_text).unwrap_or_default();
    let figures = discover_figures(&doc, &pages, &page_texts, max_figures);

    debug!(
        pages = pages.len(),
        chars = full_text.len(),
        figures = figures.len(),
        "parsed fallback document"
    );

    Ok(FallbackDocument {
        full_text,
        introduction,
        figures,
    })
}

// ── Introduction extraction ──────────────────────────────────────────────

/// Locate the introduction section in concatenated page text.
///
/// Tries the numbered pattern, then the unnumbered one, then an
/// open-ended match; all results are capped at [`MAX_INTRO_CHARS`].
pub fn extract_introduction(full_text: &str) -> Option<String> {
    if full_text.is_empty() {
        return None;
    }
    for re in [&*RE_INTRO, &*RE_INTRO_PLAIN, &*RE_INTRO_OPEN] {
        if let Some(caps) = re.captures(full_text) {
            let body = caps.get(1)?.as_str().trim();
            if !body.is_empty() {
                return Some(truncate_chars(body, MAX_INTRO_CHARS).to_string());
            }
        }
    }
    None
}

/// Cut at a char boundary, never mid-codepoint.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

// ── Figure discovery ─────────────────────────────────────────────────────

fn discover_figures(
    doc: &Document,
    pages: &[(u32, ObjectId)],
    page_texts: &[(u32, String)],
    max_figures: usize,
) -> Vec<PdfFigure> {
    let mut figures: Vec<PdfFigure> = Vec::new();

    for (&(page_no, page_id), (_, text)) in pages.iter().zip(page_texts).take(PAGE_SCAN_LIMIT) {
        if figures.len() >= max_figures {
            break;
        }
        for (bytes, media_type) in page_images(doc, page_id) {
            if figures.len() >= max_figures {
                break;
            }
            if bytes.len() < MIN_IMAGE_BYTES {
                continue;
            }
            let index = figures.len() + 1;
            let caption =
                find_caption(text, index).unwrap_or_else(|| format!("Figure {index}"));
            figures.push(PdfFigure {
                index,
                number: index.to_string(),
                caption,
                page: page_no,
                bytes,
                media_type,
            });
        }
    }

    figures
}

/// Embedded image streams on one page, via the page's XObject resources.
///
/// Only JPEG (DCTDecode) and JPEG 2000 (JPXDecode) streams are returned:
/// those are stored as complete image files, so their bytes are directly
/// renderable. Other encodings (FlateDecode and friends) hold raw sample
/// data that would need decoding against the stream's colour space, which
/// no downstream consumer of ours can do anything with.
fn page_images(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, String)> {
    let mut images = Vec::new();

    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return images;
    };
    let Some(resources) = page_dict.get(b"Resources").ok().and_then(|o| resolve_dict(doc, o))
    else {
        return images;
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| resolve_dict(doc, o))
    else {
        return images;
    };

    for (_name, obj) in xobjects.iter() {
        let Some(stream) = resolve_stream(doc, obj) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(name_bytes)
            .map(|n| n == b"Image")
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        let Some(media_type) = media_type_for(stream) else {
            continue;
        };
        images.push((stream.content.clone(), media_type));
    }

    images
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn resolve_stream<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Stream> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok(),
        Object::Stream(s) => Some(s),
        _ => None,
    }
}

fn name_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// MIME type from the image stream's filter chain. JPEG and JPEG 2000
/// streams are stored as complete files; everything else is raw sample
/// data whose type we cannot claim.
fn media_type_for(stream: &Stream) -> Option<String> {
    let filter = stream.dict.get(b"Filter").ok()?;
    let names: Vec<&[u8]> = match filter {
        Object::Name(n) => vec![n.as_slice()],
        Object::Array(arr) => arr.iter().filter_map(name_bytes).collect(),
        _ => Vec::new(),
    };
    if names.contains(&b"DCTDecode".as_slice()) {
        Some("image/jpeg".to_string())
    } else if names.contains(&b"JPXDecode".as_slice()) {
        Some("image/jp2".to_string())
    } else {
        None
    }
}

/// Find `Figure <n>:` in the page's text. Caption capped at
/// [`MAX_CAPTION_CHARS`] chars.
fn find_caption(page_text: &str, figure_num: usize) -> Option<String> {
    let pattern = format!(r"(?i)(?:figure|fig\.?)\s*{figure_num}\s*[:.]\s*([^\n]+)");
    let re = Regex::new(&pattern).ok()?;
    let caption = re.captures(page_text)?.get(1)?.as_str().trim().to_string();
    Some(truncate_chars(&caption, MAX_CAPTION_CHARS).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use lopdf::dictionary;

    #[test]
    fn introduction_terminated_by_next_numbered_section() {
        let text = "Title page\n1 Introduction\nWe study probes.\nThey are linear.\n2 Method\nWe train.";
        let intro = extract_introduction(text).unwrap();
        assert_eq!(intro, "We study probes.\nThey are linear.");
    }

    #[test]
    fn introduction_with_roman_numerals() {
        let text = "I. Introduction\nAlpha beta.\nII. Related Work\nGamma.";
        let intro = extract_introduction(text).unwrap();
        assert_eq!(intro, "Alpha beta.");
    }

    #[test]
    fn unnumbered_introduction_heading() {
        let text = "Abstract\nStuff.\nIntroduction\nBody here.\nBackground and more";
        let intro = extract_introduction(text).unwrap();
        assert_eq!(intro, "Body here.");
    }

    #[test]
    fn open_ended_match_is_truncated() {
        let long_body = "word ".repeat(2_000);
        let text = format!("1 Introduction\n{long_body}");
        let intro = extract_introduction(&text).unwrap();
        assert_eq!(intro.chars().count(), MAX_INTRO_CHARS);
    }

    #[test]
    fn no_introduction_pattern_returns_none() {
        assert!(extract_introduction("Just some text without headings").is_none());
        assert!(extract_introduction("").is_none());
    }

    #[test]
    fn caption_found_on_page() {
        let text = "Some body text.\nFigure 1: The probe architecture.\nMore text.";
        assert_eq!(
            find_caption(text, 1).unwrap(),
            "The probe architecture."
        );
        // Case-insensitive, abbreviated form
        let text = "fig. 2. Accuracy per layer";
        assert_eq!(find_caption(text, 2).unwrap(), "Accuracy per layer");
    }

    #[test]
    fn caption_missing_returns_none() {
        assert!(find_caption("No figures mentioned here", 1).is_none());
    }

    #[test]
    fn caption_is_capped() {
        let text = format!("Figure 1: {}", "x".repeat(500));
        assert_eq!(find_caption(&text, 1).unwrap().len(), MAX_CAPTION_CHARS);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "ααααα";
        assert_eq!(truncate_chars(s, 3), "ααα");
        assert_eq!(truncate_chars(s, 10), s);
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let err = parse_document(b"definitely not a pdf", 3).unwrap_err();
        assert!(matches!(err, ParseError::MalformedPdf(_)));
    }

    fn image_stream(filter: &str, len: usize) -> lopdf::Stream {
        lopdf::Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 100,
                "Height" => 100,
                "Filter" => filter,
            },
            vec![0u8; len],
        )
    }

    #[test]
    fn only_self_contained_image_streams_become_figures() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        // Raw flate sample data is not a decodable image; the undersized
        // JPEG is icon-sized. Only the full-size JPEG qualifies.
        let flate_id = doc.add_object(Object::Stream(image_stream("FlateDecode", 20_000)));
        let jpeg_id = doc.add_object(Object::Stream(image_stream("DCTDecode", 20_000)));
        let small_jpeg_id = doc.add_object(Object::Stream(image_stream("DCTDecode", 500)));
        let content = Content { operations: vec![] };
        let content_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => flate_id,
                    "Im1" => jpeg_id,
                    "Im2" => small_jpeg_id,
                },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let parsed = parse_document(&buf, 5).unwrap();

        assert_eq!(parsed.figures.len(), 1);
        let figure = &parsed.figures[0];
        assert_eq!(figure.media_type, "image/jpeg");
        assert_eq!(figure.bytes.len(), 20_000);
        assert_eq!(figure.caption, "Figure 1");
        assert_eq!(figure.page, 1);
    }

    #[test]
    fn minimal_pdf_parses_to_empty_result() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations: vec![] };
        let content_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let parsed = parse_document(&buf, 3).unwrap();
        assert_eq!(parsed.introduction, "");
        assert!(parsed.figures.is_empty());
    }
}
