//! Pipeline stages for paper content extraction.
//!
//! Each submodule implements exactly one stage. Keeping stages separate
//! makes each independently testable: the two parsers are pure functions
//! over downloaded bytes, and [`fetch`] is the only stage with network
//! I/O.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ html ──────▶ sections
//!   │       (structured)  (role assignment)
//!   └─────▶ pdf
//!           (fallback)
//! ```
//!
//! 1. [`fetch`]    — probe availability and download documents/images over
//!    a shared pooled client with bounded retry
//! 2. [`html`]     — parse a structured HTML document into ordered sections
//!    and figures
//! 3. [`pdf`]      — best-effort text and figure extraction from PDF bytes
//! 4. [`sections`] — heading normalisation and canonical-role
//!    classification shared by both parsers' consumers

pub mod fetch;
pub mod html;
pub mod pdf;
pub mod sections;
