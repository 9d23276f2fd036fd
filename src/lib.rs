//! # css-scan
//!
//! Inspect elements of an HTML page and extract the minimal CSS rule that
//! reproduces how they look, then edit that rule and apply it back.
//!
//! ## Features
//!
//! - Short, stable selectors for any element (`#id`, or tag + classes +
//!   `:nth-of-type`)
//! - Extraction of only the significant resolved properties, plus rules mined
//!   for `:hover`, `:focus` and other interactive states
//! - Permanent inline edits, or a scoped live preview that can be reverted
//! - Multi-element selection with combined, labeled output
//! - Export helpers: file names and headers, markup mockups, playground JSON
//!
//! ## Quick Start
//!
//! ```
//! use css_scan::{Document, extract, synthesize};
//!
//! let doc = Document::parse(
//!     r#"<style>.btn { padding: 4px 8px } .btn:hover { color: red }</style>
//!        <button class="btn">Go</button>"#,
//! );
//! let button = doc.query_selector("button").unwrap().unwrap();
//!
//! assert_eq!(synthesize(&doc, button), "button.btn");
//! let css = extract(&doc, button);
//! assert!(css.contains("  padding: 4px 8px;\n"));
//! assert!(css.ends_with("button.btn:hover {\n  color: red;\n}"));
//! ```
//!
//! ## Editing
//!
//! ```
//! use css_scan::{ApplyMode, Document, StyleApplicator};
//!
//! let mut doc = Document::parse(r#"<p id="intro" style="color: blue">Hi</p>"#);
//! let p = doc.query_selector("#intro").unwrap().unwrap();
//!
//! let mut applicator = StyleApplicator::new();
//! applicator.apply(&mut doc, "#intro { color: red; margin: 4px }", p, ApplyMode::Permanent).unwrap();
//! assert_eq!(doc.dom().get_attr(p, "style"), Some("color: red; margin: 4px;"));
//!
//! applicator.revert(&mut doc);
//! assert_eq!(doc.dom().get_attr(p, "style"), Some("color: blue"));
//! ```
//!
//! Interactive hosts drive a [`Scanner`] with [`InputEvent`]s instead.

pub mod dom;
pub mod scan;
pub mod style;

mod config;
mod error;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{FeedbackDurations, ScanConfig};
pub use dom::{Document, NodeId, Rect};
pub use error::{Error, Result};
pub use scan::apply::{AppliedRule, ApplyMode, StyleApplicator, parse_rule_text};
pub use scan::export::{ExportFile, PlaygroundPayload, file_name, html_mockup};
pub use scan::extract::{StyleExtractor, StyleRule, extract, extract_multi};
pub use scan::selection::SelectionSet;
pub use scan::selector::{class_tokens, synthesize, synthesize_with};
pub use scan::session::{Disposition, FeedbackSlot, InputEvent, Scanner, Tab};
pub use scan::timer::Millis;
pub use util::time_now_secs;
