//! Page model: arena DOM, HTML parsing and the styled document.
//!
//! # Example
//!
//! ```
//! use css_scan::dom::Document;
//!
//! let doc = Document::parse(r#"<style>p { color: red }</style><p class="intro">Hi</p>"#);
//! let p = doc.query_selector("p.intro").unwrap().expect("paragraph");
//! assert_eq!(doc.text_content(p), "Hi");
//! assert_eq!(doc.style_sources().len(), 1);
//! ```

pub mod arena;
mod document;
pub mod element_ref;
mod tree_sink;

pub use arena::{Attribute, Node, NodeData, NodeId, PageDom, attr_name, html_name};
pub use document::{Document, LinkedSheet, Rect, SourceOwner, StyleSource};
pub use element_ref::{ElementRef, ScanSelectors};
pub use tree_sink::PageSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse an HTML document into a [`PageDom`].
pub fn parse_html(html: &str) -> PageDom {
    parse_document(PageSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}
