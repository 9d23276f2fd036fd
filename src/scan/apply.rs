//! Applying edited rule text back onto the page.
//!
//! [`ApplyMode::Permanent`] writes declarations into the target's `style`
//! attribute; the attribute's original value is snapshotted the first time a
//! target is touched so [`StyleApplicator::revert`] can restore it.
//! [`ApplyMode::Preview`] instead injects a single `<style>` element whose
//! rules only match the target through a marker attribute.

use std::collections::HashMap;

use log::{debug, info};

use super::{PREVIEW_STYLE_ID, TARGET_MARKER_ATTR};
use crate::dom::{Attribute, Document, NodeId, attr_name, html_name};
use crate::error::{Error, Result};
use crate::style::{Declaration, ToCss, split_important};
use crate::util::time_seed_nanos;

/// How edited rule text reaches the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyMode {
    Permanent,
    Preview,
}

/// One `selector { body }` segment of operator-supplied text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBlock {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl ToCss for ParsedBlock {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(&self.selector);
        buf.push_str(" {\n");
        for declaration in &self.declarations {
            buf.push_str("  ");
            declaration.to_css(buf);
            buf.push_str(";\n");
        }
        buf.push('}');
    }
}

/// What an apply call changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRule {
    pub mode: ApplyMode,
    pub target: NodeId,
    /// Declarations written (permanent) or rules injected (preview).
    pub count: usize,
    /// Marker token of the preview, if any.
    pub token: Option<String>,
}

/// Remove every `/* ... */` span. An unterminated comment runs to the end.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_body(body: &str) -> Vec<Declaration> {
    body.split(';')
        .filter_map(|clause| {
            let (name, value) = clause.split_once(':')?;
            let name = name.trim();
            let (value, important) = split_important(value.trim());
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(Declaration::new(name, value, important))
        })
        .collect()
}

/// Every `selector { body }` segment, comments removed.
pub fn parse_blocks(text: &str) -> Vec<ParsedBlock> {
    let cleaned = strip_comments(text);
    let mut blocks = Vec::new();
    let mut rest = cleaned.as_str();
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        blocks.push(ParsedBlock {
            selector: rest[..open].trim().to_string(),
            declarations: parse_body(&rest[open + 1..open + close]),
        });
        rest = &rest[open + close + 1..];
    }
    blocks
}

/// The first `selector { body }` segment, or `Error::Parse`.
pub fn parse_rule_text(text: &str) -> Result<ParsedBlock> {
    parse_blocks(text)
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("no { ... } block found".to_string()))
}

#[derive(Debug, Clone)]
struct PreviewOverride {
    style: NodeId,
    target: NodeId,
    token: String,
}

/// Applies rule text and remembers enough to undo it.
#[derive(Debug)]
pub struct StyleApplicator {
    /// Original `style` attribute per modified target.
    snapshots: HashMap<NodeId, Option<String>>,
    preview: Option<PreviewOverride>,
    seed: u64,
    counter: u64,
}

impl Default for StyleApplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleApplicator {
    pub fn new() -> Self {
        Self::with_seed(time_seed_nanos())
    }

    /// Marker tokens are `css-scan-<seed>-<n>`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            snapshots: HashMap::new(),
            preview: None,
            seed,
            counter: 0,
        }
    }

    /// Apply the first block of `text` to `target`.
    ///
    /// Nothing is mutated when the text has no block or the target is not a
    /// connected element.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        text: &str,
        target: NodeId,
        mode: ApplyMode,
    ) -> Result<AppliedRule> {
        let blocks = parse_blocks(text);
        let first = blocks
            .first()
            .ok_or_else(|| Error::Parse("no { ... } block found".to_string()))?;
        check_target(doc, target)?;

        match mode {
            ApplyMode::Permanent => {
                let count = self.write_inline(doc, target, &first.declarations)?;
                Ok(AppliedRule {
                    mode,
                    target,
                    count,
                    token: None,
                })
            }
            ApplyMode::Preview => self.inject_preview(doc, &blocks, target),
        }
    }

    /// Apply each block to the target whose selector it names. Blocks naming
    /// no target are ignored; returns the number of targets written.
    pub fn apply_blocks(
        &mut self,
        doc: &mut Document,
        text: &str,
        targets: &[(String, NodeId)],
    ) -> Result<usize> {
        let blocks = parse_blocks(text);
        if blocks.is_empty() {
            return Err(Error::Parse("no { ... } block found".to_string()));
        }
        // All targets are checked before the first write.
        let mut resolved = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let Some(&(_, target)) = targets.iter().find(|(s, _)| *s == block.selector) else {
                debug!("no selected element for block {}", block.selector);
                continue;
            };
            check_target(doc, target)?;
            resolved.push((target, &block.declarations));
        }

        for &(target, declarations) in &resolved {
            self.write_inline(doc, target, declarations)?;
        }
        Ok(resolved.len())
    }

    fn write_inline(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        declarations: &[Declaration],
    ) -> Result<usize> {
        if declarations.is_empty() {
            return Ok(0);
        }
        let original = doc.dom().get_attr(target, "style").map(str::to_string);
        self.snapshots.entry(target).or_insert(original);

        let mut block = doc.inline_style(target);
        for d in declarations {
            block.set(&d.name, &d.value, d.important);
        }
        doc.set_inline_style(target, &block)?;
        Ok(declarations.len())
    }

    fn inject_preview(
        &mut self,
        doc: &mut Document,
        blocks: &[ParsedBlock],
        target: NodeId,
    ) -> Result<AppliedRule> {
        self.remove_preview(doc);

        self.counter += 1;
        let token = format!("css-scan-{}-{}", self.seed, self.counter);
        let scoped = format!("[{TARGET_MARKER_ATTR}=\"{token}\"]");

        let base = blocks.first().map(|b| b.selector.as_str()).unwrap_or("");
        let mut rules = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            let selector = if i == 0 {
                scoped.clone()
            } else if let Some(rest) = rescoped_suffix(base, &block.selector) {
                format!("{scoped}{rest}")
            } else {
                continue;
            };
            rules.push(
                ParsedBlock {
                    selector,
                    declarations: block.declarations.clone(),
                }
                .to_css_string(),
            );
        }

        let dom = doc.dom_mut();
        dom.set_attr(target, TARGET_MARKER_ATTR, &token);
        let style = dom.create_element(
            html_name("style"),
            vec![Attribute {
                name: attr_name("id"),
                value: PREVIEW_STYLE_ID.to_string(),
            }],
        );
        dom.append_text(style, &rules.join("\n"));
        let parent = doc
            .head()
            .or_else(|| doc.body())
            .or_else(|| doc.root_element())
            .unwrap_or_else(|| doc.dom().document());
        doc.dom_mut().append(parent, style);

        self.preview = Some(PreviewOverride {
            style,
            target,
            token: token.clone(),
        });
        Ok(AppliedRule {
            mode: ApplyMode::Preview,
            target,
            count: rules.len(),
            token: Some(token),
        })
    }

    /// Remove the preview `<style>` and every marker attribute. Returns
    /// whether anything was removed.
    pub fn remove_preview(&mut self, doc: &mut Document) -> bool {
        let mut removed = false;
        if let Some(preview) = self.preview.take() {
            doc.dom_mut().detach(preview.style);
            debug!("removed preview {} for node {}", preview.token, preview.target.0);
            removed = true;
        }
        while let Some(stale) = doc.dom().get_by_id(PREVIEW_STYLE_ID) {
            doc.dom_mut().detach(stale);
            removed = true;
        }
        let dom = doc.dom_mut();
        for node in dom.descendants(dom.document()) {
            if dom.remove_attr(node, TARGET_MARKER_ATTR).is_some() {
                removed = true;
            }
        }
        removed
    }

    /// Drop the preview and restore every snapshotted `style` attribute.
    pub fn revert(&mut self, doc: &mut Document) {
        self.remove_preview(doc);
        let restored = self.snapshots.len();
        let dom = doc.dom_mut();
        for (node, original) in self.snapshots.drain() {
            match original {
                Some(value) => {
                    dom.set_attr(node, "style", &value);
                }
                None => {
                    dom.remove_attr(node, "style");
                }
            }
        }
        if restored > 0 {
            info!("restored inline style of {restored} element(s)");
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// The element the current preview applies to.
    pub fn preview_target(&self) -> Option<NodeId> {
        self.preview.as_ref().map(|p| p.target)
    }

    /// Elements whose `style` attribute has been written.
    pub fn modified(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.snapshots.keys().copied()
    }
}

fn check_target(doc: &Document, target: NodeId) -> Result<()> {
    let dom = doc.dom();
    if !dom.is_element(target) {
        return Err(Error::Mutation(format!("node {} is not an element", target.0)));
    }
    if !dom.is_connected(target) {
        return Err(Error::Mutation(format!(
            "element {} is no longer in the document",
            target.0
        )));
    }
    Ok(())
}

/// What follows `base` in `selector`, when `selector` extends it (for
/// example `base:hover`). `#a` does not extend to `#ab`.
fn rescoped_suffix<'a>(base: &str, selector: &'a str) -> Option<&'a str> {
    if base.is_empty() {
        return None;
    }
    let rest = selector.strip_prefix(base)?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '-' => None,
        _ => Some(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(html: &str) -> (Document, NodeId) {
        let doc = Document::parse(html);
        let node = doc.query_selector("#t").unwrap().unwrap();
        (doc, node)
    }

    fn preview_css(doc: &Document) -> Option<String> {
        doc.dom()
            .get_by_id(PREVIEW_STYLE_ID)
            .map(|s| doc.text_content(s))
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a /* x */ b /* y"), "a  b ");
        assert_eq!(strip_comments("/**/p{}"), "p{}");
    }

    #[test]
    fn test_parse_rule_text() {
        let block = parse_rule_text(
            "/* Element 1: #t */\n#t {\n  color: red;\n  margin : 4px !important;\n  bad;\n  : x;\n}",
        )
        .unwrap();
        assert_eq!(block.selector, "#t");
        assert_eq!(
            block.declarations,
            vec![
                Declaration::new("color", "red", false),
                Declaration::new("margin", "4px", true),
            ]
        );
    }

    #[test]
    fn test_value_keeps_colons() {
        let block = parse_rule_text("a { background: url(http://x/y.png) }").unwrap();
        assert_eq!(block.declarations[0].value, "url(http://x/y.png)");
    }

    #[test]
    fn test_parse_error_without_body() {
        assert!(matches!(parse_rule_text("not css"), Err(Error::Parse(_))));
        assert!(matches!(parse_rule_text("a { color: red"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_permanent_is_additive() {
        let (mut doc, t) = setup(r#"<p id="t" style="color: blue; padding: 2px">x</p>"#);
        let mut applicator = StyleApplicator::with_seed(1);
        let applied = applicator
            .apply(&mut doc, "#t { color: red; margin: 4px }", t, ApplyMode::Permanent)
            .unwrap();
        assert_eq!(applied.count, 2);
        assert_eq!(
            doc.dom().get_attr(t, "style"),
            Some("color: red; padding: 2px; margin: 4px;")
        );
    }

    #[test]
    fn test_parse_failure_leaves_target_untouched() {
        let (mut doc, t) = setup(r#"<p id="t" style="color: blue">x</p>"#);
        let mut applicator = StyleApplicator::with_seed(1);
        let err = applicator.apply(&mut doc, "not css", t, ApplyMode::Permanent);
        assert!(matches!(err, Err(Error::Parse(_))));
        assert_eq!(doc.dom().get_attr(t, "style"), Some("color: blue"));
        assert_eq!(applicator.modified().count(), 0);
    }

    #[test]
    fn test_detached_target_is_mutation_error() {
        let (mut doc, t) = setup(r#"<p id="t">x</p>"#);
        doc.dom_mut().detach(t);
        let mut applicator = StyleApplicator::with_seed(1);
        let err = applicator.apply(&mut doc, "p { color: red }", t, ApplyMode::Permanent);
        assert!(matches!(err, Err(Error::Mutation(_))));
        assert!(!doc.dom().has_attr(t, "style"));
    }

    #[test]
    fn test_preview_is_scoped() {
        let (mut doc, t) = setup(r#"<head></head><body><a id="t" href="/">x</a></body>"#);
        let mut applicator = StyleApplicator::with_seed(7);
        let applied = applicator
            .apply(
                &mut doc,
                "#t { color: red }\n\n#t:hover { color: blue }\n\n#tab { color: green }\n\np { x: y }",
                t,
                ApplyMode::Preview,
            )
            .unwrap();
        assert_eq!(applied.token.as_deref(), Some("css-scan-7-1"));
        assert_eq!(applied.count, 2);
        assert_eq!(doc.dom().get_attr(t, TARGET_MARKER_ATTR), Some("css-scan-7-1"));
        assert_eq!(
            preview_css(&doc).unwrap(),
            "[data-css-scan-target=\"css-scan-7-1\"] {\n  color: red;\n}\n\
             [data-css-scan-target=\"css-scan-7-1\"]:hover {\n  color: blue;\n}"
        );
        let style = doc.dom().get_by_id(PREVIEW_STYLE_ID).unwrap();
        assert_eq!(doc.dom().parent_element(style), doc.head());
        assert!(!doc.dom().has_attr(t, "style"));
    }

    #[test]
    fn test_preview_replaces_previous() {
        let (mut doc, t) = setup(r#"<div id="t">x</div><div id="u">y</div>"#);
        let u = doc.query_selector("#u").unwrap().unwrap();
        let mut applicator = StyleApplicator::with_seed(3);
        applicator
            .apply(&mut doc, "#t { color: red }", t, ApplyMode::Preview)
            .unwrap();
        applicator
            .apply(&mut doc, "#u { color: blue }", u, ApplyMode::Preview)
            .unwrap();
        let styles = doc.query_selector_all("style").unwrap();
        assert_eq!(styles.len(), 1);
        assert!(!doc.dom().has_attr(t, TARGET_MARKER_ATTR));
        assert_eq!(doc.dom().get_attr(u, TARGET_MARKER_ATTR), Some("css-scan-3-2"));
        assert_eq!(applicator.preview_target(), Some(u));
    }

    #[test]
    fn test_revert_restores_snapshots() {
        let (mut doc, t) = setup(r#"<p id="t" style="color: blue">x</p><p id="u">y</p>"#);
        let u = doc.query_selector("#u").unwrap().unwrap();
        let mut applicator = StyleApplicator::with_seed(1);
        applicator
            .apply(&mut doc, "p { color: red }", t, ApplyMode::Permanent)
            .unwrap();
        applicator
            .apply(&mut doc, "p { color: green }", t, ApplyMode::Permanent)
            .unwrap();
        applicator
            .apply(&mut doc, "p { margin: 1px }", u, ApplyMode::Permanent)
            .unwrap();
        applicator
            .apply(&mut doc, "p { opacity: .5 }", u, ApplyMode::Preview)
            .unwrap();

        applicator.revert(&mut doc);
        assert_eq!(doc.dom().get_attr(t, "style"), Some("color: blue"));
        assert!(!doc.dom().has_attr(u, "style"));
        assert!(!doc.dom().has_attr(u, TARGET_MARKER_ATTR));
        assert!(preview_css(&doc).is_none());
        assert!(!applicator.has_preview());

        // Nothing left to undo
        applicator.revert(&mut doc);
        assert_eq!(doc.dom().get_attr(t, "style"), Some("color: blue"));
    }

    #[test]
    fn test_apply_blocks_by_selector() {
        let doc_html = r#"<h1 id="a">A</h1><p id="b">B</p>"#;
        let mut doc = Document::parse(doc_html);
        let a = doc.query_selector("#a").unwrap().unwrap();
        let b = doc.query_selector("#b").unwrap().unwrap();
        let mut applicator = StyleApplicator::with_seed(1);
        let written = applicator
            .apply_blocks(
                &mut doc,
                "/* Element 1: #a */\n#a { color: red }\n\n/* Element 2: #b */\n#b { color: blue }\n\n#c { x: y }",
                &[("#a".to_string(), a), ("#b".to_string(), b)],
            )
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(doc.dom().get_attr(a, "style"), Some("color: red;"));
        assert_eq!(doc.dom().get_attr(b, "style"), Some("color: blue;"));
    }

    #[test]
    fn test_apply_blocks_detached_member_writes_nothing() {
        let mut doc = Document::parse(r#"<h1 id="a" style="margin: 1px">A</h1><p id="b">B</p>"#);
        let a = doc.query_selector("#a").unwrap().unwrap();
        let b = doc.query_selector("#b").unwrap().unwrap();
        doc.dom_mut().detach(b);
        let mut applicator = StyleApplicator::with_seed(1);
        let result = applicator.apply_blocks(
            &mut doc,
            "#a { color: red }\n#b { color: blue }",
            &[("#a".to_string(), a), ("#b".to_string(), b)],
        );
        assert!(matches!(result, Err(Error::Mutation(_))));
        assert_eq!(doc.dom().get_attr(a, "style"), Some("margin: 1px"));
        assert!(!doc.dom().has_attr(b, "style"));
        assert_eq!(applicator.modified().count(), 0);
    }
}
