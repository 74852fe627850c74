//! Output types: the canonical extraction contract.
//!
//! Every extraction — structured or fallback, successful or degraded —
//! produces the same [`ExtractionResult`] shape. Downstream consumers
//! (summarizer, sync writers) never need to know which path ran; they read
//! the three canonical section slots and the figure list and treat empty
//! strings as "not found", not as errors.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The three section roles every result guarantees a slot for.
pub const CANONICAL_SECTIONS: [&str; 3] = ["introduction", "methodology", "conclusion"];

/// Which pipeline path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Parsed from the machine-rendered HTML variant.
    Structured,
    /// Parsed from the PDF variant (or total failure: all fields empty).
    Fallback,
}

/// A figure extracted from either document variant.
///
/// Figures have no identity beyond their position within one result; the
/// `index` is assigned in extraction order and is independent of the label
/// printed in the caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    /// 1-based extraction order.
    pub index: usize,
    /// Label parsed from the caption (`"2"`, `"3.1"`, …). Falls back to
    /// `index` as a string when the caption carries no label.
    pub number: String,
    /// Caption text with the leading `Figure N:` prefix stripped.
    pub caption: String,
    /// Absolute image URL. Always resolvable even when bytes were never
    /// downloaded.
    pub image_url: String,
    /// Raw image bytes, present only when downloading was enabled (HTML
    /// path) or the image was embedded in the document (PDF path).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes"
    )]
    pub image_bytes: Option<Vec<u8>>,
    /// MIME type when known (from Content-Type or the PDF image filter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Figure {
    /// Render the image as a `data:` URI for multimodal API consumers.
    ///
    /// Returns `None` when no bytes were downloaded; callers should pass
    /// the [`Figure::image_url`] instead in that case.
    pub fn as_data_uri(&self) -> Option<String> {
        let bytes = self.image_bytes.as_ref()?;
        let media = self.media_type.as_deref().unwrap_or("image/png");
        Some(format!("data:{media};base64,{}", STANDARD.encode(bytes)))
    }
}

/// The single canonical output of the extraction subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Which path produced this result.
    pub method: ExtractionMethod,
    /// Whether the structured document existed and was reachable,
    /// independent of whether extraction from it succeeded.
    pub structured_available: bool,
    /// Ordered section map. The three canonical keys lead the map in a
    /// fixed order (possibly empty); on the structured path every other
    /// discovered section follows under its normalised name, preserving
    /// document order among themselves.
    pub sections: IndexMap<String, String>,
    /// Figures in extraction order, never more than the configured cap.
    pub figures: Vec<Figure>,
    /// Best-effort full text: the labelled canonical sections (structured
    /// path) or the page-ordered PDF text (fallback path).
    pub full_text: String,
}

impl ExtractionResult {
    /// A result skeleton with all three canonical slots present and empty.
    pub fn empty(method: ExtractionMethod, structured_available: bool) -> Self {
        let mut sections = IndexMap::new();
        for key in CANONICAL_SECTIONS {
            sections.insert(key.to_string(), String::new());
        }
        Self {
            method,
            structured_available,
            sections,
            figures: Vec::new(),
            full_text: String::new(),
        }
    }

    /// The introduction slot (guaranteed present, possibly empty).
    pub fn introduction(&self) -> &str {
        self.sections.get("introduction").map(String::as_str).unwrap_or("")
    }

    /// The methodology slot (guaranteed present, possibly empty).
    pub fn methodology(&self) -> &str {
        self.sections.get("methodology").map(String::as_str).unwrap_or("")
    }

    /// The conclusion slot (guaranteed present, possibly empty).
    pub fn conclusion(&self) -> &str {
        self.sections.get("conclusion").map(String::as_str).unwrap_or("")
    }

    /// True when any text field is populated.
    pub fn has_content(&self) -> bool {
        !self.full_text.is_empty() || self.sections.values().any(|s| !s.is_empty())
    }
}

/// Serde adapter: `Option<Vec<u8>>` as a base64 string.
///
/// Raw byte arrays serialise as JSON number lists, which triples payload
/// size and is useless to the downstream sync writers; base64 matches what
/// the multimodal APIs expect anyway.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, ser: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => ser.serialize_some(&STANDARD.encode(b)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(de)?;
        match encoded {
            Some(s) => STANDARD
                .decode(s.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
