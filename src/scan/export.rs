//! Export payloads: downloadable files, markup mockups and code-playground
//! submissions.

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::util::{iso_date, iso_timestamp};

/// The selector part of an export file name.
///
/// `#`/`.` are dropped, anything outside `[A-Za-z0-9_-]` becomes `-`, runs of
/// `-` collapse, and the result is trimmed, lower-cased and truncated.
pub fn file_stem(selector: &str, limit: usize) -> String {
    let mut stem = String::with_capacity(selector.len());
    for c in selector.chars().filter(|&c| c != '#' && c != '.') {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c.to_ascii_lowercase()
        } else {
            '-'
        };
        if c == '-' && stem.ends_with('-') {
            continue;
        }
        stem.push(c);
    }
    stem.trim_matches('-').chars().take(limit).collect()
}

/// `css-scan-<stem>-<YYYY-MM-DD>.css`, with `element` for an empty stem.
pub fn file_name(selector: &str, now_secs: u64, config: &ScanConfig) -> String {
    let stem = file_stem(selector, config.file_stem_limit);
    let stem = if stem.is_empty() { "element" } else { &stem };
    format!("{}-{stem}-{}.css", config.reserved_prefix, iso_date(now_secs))
}

/// Comment block prepended to exported rule text.
pub fn file_header(selector: &str, url: Option<&str>, now_secs: u64) -> String {
    format!(
        "/*\n * Extracted with css-scan\n *\n * Element: {selector}\n * URL: {}\n * Date: {}\n *\n * Adjust values as needed before use.\n */\n\n",
        url.unwrap_or("unknown"),
        iso_timestamp(now_secs)
    )
}

/// A file ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub contents: String,
}

impl ExportFile {
    pub fn new(selector: &str, css: &str, url: Option<&str>, now_secs: u64, config: &ScanConfig) -> Self {
        Self {
            name: file_name(selector, now_secs, config),
            contents: format!("{}{css}", file_header(selector, url, now_secs)),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text shown inside the mockup element.
fn mockup_text(doc: &Document, target: NodeId, tag: &str, config: &ScanConfig) -> String {
    let dom = doc.dom();
    let attr = |name: &str| dom.get_attr(target, name).filter(|v| !v.is_empty());
    match tag {
        "img" => attr("alt").unwrap_or("Image").to_string(),
        "input" => attr("placeholder")
            .or_else(|| attr("value"))
            .unwrap_or("Input field")
            .to_string(),
        "button" => {
            let text = doc.text_content(target);
            let text = text.trim();
            if text.is_empty() { "Button".to_string() } else { text.to_string() }
        }
        _ => {
            let text = doc.text_content(target);
            let text = text.trim();
            if text.is_empty() {
                format!("{tag} element")
            } else if text.chars().count() >= config.mockup_text_limit {
                let cut: String = text.chars().take(config.mockup_text_limit).collect();
                format!("{cut}...")
            } else {
                text.to_string()
            }
        }
    }
}

/// A minimal HTML document containing just the target element.
pub fn html_mockup(doc: &Document, target: NodeId, config: &ScanConfig) -> String {
    let dom = doc.dom();
    let tag = dom.tag_name(target).unwrap_or_else(|| "div".to_string());

    let mut attrs = String::new();
    let classes: Vec<&str> = dom
        .element_classes(target)
        .iter()
        .map(String::as_str)
        .filter(|c| !c.starts_with(&config.reserved_prefix))
        .take(config.max_classes)
        .collect();
    if !classes.is_empty() {
        attrs.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
    }
    if let Some(id) = dom.element_id(target)
        && !id.is_empty()
        && !id.starts_with(&config.reserved_prefix)
    {
        attrs.push_str(&format!(" id=\"{}\"", escape_html(id)));
    }

    let text = escape_html(&mockup_text(doc, target, &tag, config));
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>CSS Scan Extract</title>\n</head>\n<body>\n\n  <{tag}{attrs}>\n    {text}\n  </{tag}>\n\n</body>\n</html>"
    )
}

/// JSON body for a code-playground "prefill" submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaygroundPayload {
    pub title: String,
    pub description: String,
    pub html: String,
    pub css: String,
    pub js: String,
    pub css_external: String,
    pub js_external: String,
    pub css_pre_processor: String,
    pub js_pre_processor: String,
    pub html_pre_processor: String,
    pub css_starter: String,
    pub js_starter: String,
    pub tags: Vec<String>,
    pub private: bool,
}

impl PlaygroundPayload {
    pub fn new(selector: &str, html: String, css: String) -> Self {
        Self {
            title: format!("CSS Scan: {selector}"),
            description: format!("Styles extracted from {selector} with css-scan"),
            html,
            css,
            js: String::new(),
            css_external: String::new(),
            js_external: String::new(),
            css_pre_processor: "none".to_string(),
            js_pre_processor: "none".to_string(),
            html_pre_processor: "none".to_string(),
            css_starter: "neither".to_string(),
            js_starter: "neither".to_string(),
            tags: ["css-scan", "css", "extracted"].map(String::from).to_vec(),
            private: false,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
