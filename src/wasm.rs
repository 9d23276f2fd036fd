//! WASM bindings for in-browser extraction.
//!
//! This module exposes the core extraction functions to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::config::ScanConfig;
use crate::dom::{Document, NodeId};
use crate::scan::export::file_name;
use crate::scan::extract::extract;
use crate::scan::selector::synthesize;
use crate::util::time_now_secs;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn first_match(doc: &Document, query: &str) -> Result<NodeId, JsValue> {
    doc.query_selector(query)
        .map_err(|e| JsValue::from_str(&e.to_string()))?
        .ok_or_else(|| JsValue::from_str(&format!("no element matches {query}")))
}

/// Extract the rule text for the first element matching `query`.
///
/// Takes the page's HTML (including its `<style>` elements) and returns CSS.
#[wasm_bindgen]
pub fn extract_css(html: &str, query: &str) -> Result<String, JsValue> {
    let doc = Document::parse(html);
    let target = first_match(&doc, query)?;
    Ok(extract(&doc, target))
}

/// Synthesize the short selector for the first element matching `query`.
#[wasm_bindgen]
pub fn synthesize_selector(html: &str, query: &str) -> Result<String, JsValue> {
    let doc = Document::parse(html);
    let target = first_match(&doc, query)?;
    Ok(synthesize(&doc, target))
}

/// Export file name for a selector, dated today.
#[wasm_bindgen]
pub fn export_file_name(selector: &str) -> String {
    file_name(selector, time_now_secs(), &ScanConfig::default())
}
