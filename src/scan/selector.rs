//! Selector synthesis.
//!
//! A synthesized selector is `#id` when the element has a usable id, and
//! otherwise `tag.class1.class2.class3`, disambiguated among same-tag
//! siblings with `:nth-of-type(n)`. It is recomputed on every call and never
//! checked for document-wide uniqueness.

use crate::config::ScanConfig;
use crate::dom::{Document, NodeId, PageDom};

use super::{INDICATOR_ID, PANEL_CLASS, PREVIEW_STYLE_ID};

/// Class prefix shared by every node the scanner adds to a page.
const SCAN_CLASS_PREFIX: &str = "css-scan-";

/// Class tokens of an element in source order; empty for anything else.
pub fn class_tokens(dom: &PageDom, node: NodeId) -> Vec<String> {
    dom.element_classes(node)
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep only `[A-Za-z0-9_-]`.
pub fn sanitize_ident(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Synthesize a selector with the default configuration.
pub fn synthesize(doc: &Document, target: NodeId) -> String {
    synthesize_with(doc.dom(), target, &ScanConfig::default())
}

/// Synthesize a selector for `target`. Never fails.
pub fn synthesize_with(dom: &PageDom, target: NodeId, config: &ScanConfig) -> String {
    let Some(tag) = dom.tag_name(target) else {
        return config.fallback_selector.clone();
    };

    if let Some(id) = dom.element_id(target) {
        let clean = sanitize_ident(id.trim());
        if !clean.is_empty() {
            return format!("#{clean}");
        }
    }

    let mut selector = tag.clone();
    let classes: Vec<String> = class_tokens(dom, target)
        .into_iter()
        .filter(|c| !c.starts_with(&config.reserved_prefix))
        .take(config.max_classes)
        .map(|c| sanitize_ident(&c))
        .filter(|c| !c.is_empty())
        .collect();
    for class in &classes {
        selector.push('.');
        selector.push_str(class);
    }

    if dom.element_id(target).is_none_or(str::is_empty)
        && let Some(position) = same_tag_position(dom, target, &tag)
    {
        selector.push_str(&format!(":nth-of-type({position})"));
    }

    if selector.is_empty() {
        config.fallback_selector.clone()
    } else {
        selector
    }
}

/// 1-based position among same-tag element siblings, when there is more
/// than one of them. The scanner's own nodes are not counted; they are always
/// appended after the page's content.
fn same_tag_position(dom: &PageDom, target: NodeId, tag: &str) -> Option<usize> {
    let parent = dom.parent_element(target)?;
    let same_tag: Vec<NodeId> = dom
        .element_children(parent)
        .filter(|&c| dom.tag_name(c).as_deref() == Some(tag) && !is_scan_element(dom, c))
        .collect();
    if same_tag.len() <= 1 {
        return None;
    }
    same_tag.iter().position(|&c| c == target).map(|i| i + 1)
}

/// Whether a node belongs to the scanner's own interface.
pub fn is_scan_element(dom: &PageDom, node: NodeId) -> bool {
    if !dom.is_element(node) {
        return false;
    }
    let in_panel = dom
        .closest(node, |n| dom.element_classes(n).iter().any(|c| c == PANEL_CLASS))
        .is_some();
    if in_panel {
        return true;
    }
    if matches!(dom.element_id(node), Some(PREVIEW_STYLE_ID | INDICATOR_ID)) {
        return true;
    }
    dom.element_classes(node)
        .iter()
        .any(|c| c.starts_with(SCAN_CLASS_PREFIX))
}
