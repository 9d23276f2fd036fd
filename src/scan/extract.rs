//! Style extraction.
//!
//! The extractor resolves every tabled property for the target, keeps only
//! the significant ones and appends blocks mined for interactive states.
//! When resolution fails or nothing survives the filter it degrades in three
//! steps: measured dimensions, a small safe subset, and finally a block that
//! only records what the element is.

use log::debug;

use super::pseudo;
use super::selector::synthesize_with;
use crate::config::ScanConfig;
use crate::dom::{Document, NodeId, StyleSource};
use crate::style::properties::{SAFE_PROPERTIES, is_default_value, is_noise_value};
use crate::style::{CascadeResolver, ResolvedStyle, StyleResolver, ToCss};

/// One line inside a rule block.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleItem {
    Declaration { name: String, value: String },
    Comment(String),
}

/// A selector with ordered declarations, printed as a CSS rule block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleRule {
    pub selector: String,
    items: Vec<RuleItem>,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, value: &str) {
        self.items.push(RuleItem::Declaration {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Replace the value of an existing declaration, or append it.
    pub fn set(&mut self, name: &str, value: &str) {
        for item in &mut self.items {
            if let RuleItem::Declaration { name: n, value: v } = item
                && n == name
            {
                *v = value.to_string();
                return;
            }
        }
        self.push(name, value);
    }

    pub fn comment(&mut self, text: &str) {
        self.items.push(RuleItem::Comment(text.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .last()
    }

    /// Declarations in order, comments skipped.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match item {
            RuleItem::Declaration { name, value } => Some((name.as_str(), value.as_str())),
            RuleItem::Comment(_) => None,
        })
    }

    pub fn items(&self) -> &[RuleItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ToCss for StyleRule {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(&self.selector);
        buf.push_str(" {\n");
        for item in &self.items {
            match item {
                RuleItem::Declaration { name, value } => {
                    buf.push_str("  ");
                    buf.push_str(name);
                    buf.push_str(": ");
                    buf.push_str(value);
                    buf.push_str(";\n");
                }
                RuleItem::Comment(text) => {
                    buf.push_str("  /* ");
                    buf.push_str(text);
                    buf.push_str(" */\n");
                }
            }
        }
        buf.push('}');
    }
}

/// Whether a resolved value is worth printing.
pub fn is_significant(name: &str, value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value != "initial"
        && value != "inherit"
        && !is_default_value(name, value)
        && !is_noise_value(value)
}

/// Extracts minimal rule text for elements of a document.
#[derive(Debug, Clone)]
pub struct StyleExtractor<R = CascadeResolver> {
    resolver: R,
    config: ScanConfig,
}

impl StyleExtractor<CascadeResolver> {
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_resolver(CascadeResolver::new(), config)
    }
}

impl Default for StyleExtractor<CascadeResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: StyleResolver> StyleExtractor<R> {
    pub fn with_resolver(resolver: R, config: ScanConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The selector the extractor prints for `target`.
    pub fn selector(&self, doc: &Document, target: NodeId) -> String {
        synthesize_with(doc.dom(), target, &self.config)
    }

    /// The base block for `target`, degraded when needed.
    pub fn base_rule(&self, doc: &Document, target: NodeId) -> StyleRule {
        self.base_rule_from(doc, &doc.style_sources(), target)
    }

    fn base_rule_from(
        &self,
        doc: &Document,
        sources: &[StyleSource<'_>],
        target: NodeId,
    ) -> StyleRule {
        let mut rule = StyleRule::new(self.selector(doc, target));

        match self.resolver.resolve(doc, sources, target) {
            Ok(style) => {
                for (name, value) in style.iter() {
                    if is_significant(name, value) {
                        rule.push(name, value);
                    }
                }
                if rule.is_empty() {
                    debug!("no significant properties for {}", rule.selector);
                    self.degrade(doc, target, Some(&style), &mut rule);
                }
            }
            Err(e) => {
                debug!("degrading {}: {e}", rule.selector);
                self.degrade(doc, target, None, &mut rule);
            }
        }
        rule
    }

    /// Rule text for one element: the base block followed by its pseudo-class
    /// blocks, separated by blank lines.
    pub fn extract(&self, doc: &Document, target: NodeId) -> String {
        let sources = doc.style_sources();
        let rule = self.base_rule_from(doc, &sources, target);
        let mined = pseudo::mine(doc, &sources, target, &rule.selector);

        let mut blocks = vec![rule.to_css_string()];
        blocks.extend(mined.iter().map(|(_, block)| block.to_css_string()));
        blocks.join("\n\n")
    }

    /// Labeled rule text for several elements, in the given order.
    pub fn extract_multi(&self, doc: &Document, targets: &[NodeId]) -> String {
        targets
            .iter()
            .enumerate()
            .map(|(i, &target)| {
                format!(
                    "/* Element {}: {} */\n{}",
                    i + 1,
                    self.selector(doc, target),
                    self.extract(doc, target)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string()
    }

    fn degrade(
        &self,
        doc: &Document,
        target: NodeId,
        style: Option<&ResolvedStyle>,
        rule: &mut StyleRule,
    ) {
        if let Some(rect) = doc.bounding_box(target) {
            rule.comment("Computed dimensions");
            rule.push("width", &format!("{}px", rect.width.round()));
            rule.push("height", &format!("{}px", rect.height.round()));
        }

        if let Some(style) = style {
            for &name in SAFE_PROPERTIES {
                if let Some(value) = style.get(name)
                    && !value.is_empty()
                    && !matches!(value, "rgba(0, 0, 0, 0)" | "transparent" | "0px")
                {
                    rule.push(name, value);
                }
            }
        }

        if rule.is_empty() {
            let dom = doc.dom();
            let display = doc
                .inline_style(target)
                .get("display")
                .map(str::to_string)
                .unwrap_or_else(|| "block".to_string());
            let classes = dom.element_classes(target).join(" ");

            rule.comment("Computed style unavailable");
            rule.push("display", &display);
            rule.comment(&format!(
                "Tag: {}",
                dom.tag_name(target).unwrap_or_else(|| "unknown".to_string())
            ));
            rule.comment(&format!(
                "Classes: {}",
                if classes.is_empty() { "none" } else { &classes }
            ));
            rule.comment(&format!("ID: {}", dom.element_id(target).unwrap_or("none")));
        }
    }
}

/// Extract rule text for one element with the default configuration.
pub fn extract(doc: &Document, target: NodeId) -> String {
    StyleExtractor::new().extract(doc, target)
}

/// Extract labeled rule text for several elements with the default
/// configuration.
pub fn extract_multi(doc: &Document, targets: &[NodeId]) -> String {
    StyleExtractor::new().extract_multi(doc, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;
    use crate::error::{Error, Result};

    fn extract_query(html: &str, query: &str) -> String {
        let doc = Document::parse(html);
        let node = doc.query_selector(query).unwrap().unwrap();
        extract(&doc, node)
    }

    #[test]
    fn test_rule_to_css() {
        let mut rule = StyleRule::new("p");
        rule.push("color", "red");
        rule.comment("note");
        assert_eq!(rule.to_css_string(), "p {\n  color: red;\n  /* note */\n}");
        assert_eq!(StyleRule::new("p").to_css_string(), "p {\n}");
    }

    #[test]
    fn test_significance() {
        assert!(is_significant("color", "rgb(0, 0, 0)"));
        assert!(!is_significant("opacity", "1"));
        assert!(!is_significant("width", "auto"));
        assert!(!is_significant("color", "inherit"));
        assert!(!is_significant("margin", "0px"));
        assert!(is_significant("margin", "4px"));
    }

    #[test]
    fn test_defaults_are_omitted() {
        let css = extract_query(
            r#"<div id="x" style="margin: 0; color: rgb(0, 0, 0); opacity: 1">x</div>"#,
            "#x",
        );
        assert_eq!(css, "#x {\n  display: block;\n  color: rgb(0, 0, 0);\n}");
    }

    #[test]
    fn test_author_rules_are_resolved() {
        let css = extract_query(
            r#"<style>.card { padding: 8px 16px; border-radius: 4px; position: static }</style>
               <div class="card">x</div>"#,
            ".card",
        );
        assert!(css.starts_with("div.card {\n"));
        assert!(css.contains("  padding: 8px 16px;\n"));
        assert!(css.contains("  border-radius: 4px;\n"));
        assert!(!css.contains("position"));
    }

    #[test]
    fn test_pseudo_blocks_follow_base() {
        let css = extract_query(
            r#"<style>button:hover { color: red }</style><button>b</button>"#,
            "button",
        );
        let blocks: Vec<&str> = css.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("button {"));
        assert_eq!(blocks[1], "button:hover {\n  color: red;\n}");
    }

    #[test]
    fn test_detached_target_degrades_to_fallback() {
        let mut doc = Document::parse(r#"<div class="a b" style="display: flex">x</div>"#);
        let div = doc.query_selector("div").unwrap().unwrap();
        doc.dom_mut().detach(div);
        let css = extract(&doc, div);
        assert_eq!(
            css,
            "div.a.b {\n  /* Computed style unavailable */\n  display: flex;\n  \
             /* Tag: div */\n  /* Classes: a b */\n  /* ID: none */\n}"
        );
    }

    #[test]
    fn test_degrade_prefers_dimensions() {
        let mut doc = Document::parse("<span>x</span>");
        let span = doc.query_selector("span").unwrap().unwrap();
        doc.set_bounding_box(span, Rect::new(0.0, 0.0, 120.4, 19.6));
        doc.dom_mut().detach(span);
        assert_eq!(
            extract(&doc, span),
            "span {\n  /* Computed dimensions */\n  width: 120px;\n  height: 20px;\n}"
        );
    }

    struct Unresolvable;

    impl StyleResolver for Unresolvable {
        fn resolve(
            &self,
            _doc: &Document,
            _sources: &[StyleSource<'_>],
            _node: NodeId,
        ) -> Result<ResolvedStyle> {
            Err(Error::Resolution("no renderer".to_string()))
        }
    }

    #[test]
    fn test_custom_resolver() {
        let doc = Document::parse(r#"<p id="p">x</p>"#);
        let p = doc.query_selector("p").unwrap().unwrap();
        let extractor = StyleExtractor::with_resolver(Unresolvable, ScanConfig::default());
        let css = extractor.extract(&doc, p);
        assert!(css.starts_with("#p {\n  /* Computed style unavailable */\n  display: block;"));
        assert!(css.contains("/* ID: p */"));
    }

    /// Resolves every element to the same fixed values.
    struct Fixed(Vec<(&'static str, &'static str)>);

    impl StyleResolver for Fixed {
        fn resolve(
            &self,
            _doc: &Document,
            _sources: &[StyleSource<'_>],
            _node: NodeId,
        ) -> Result<ResolvedStyle> {
            Ok(self.0.iter().copied().collect())
        }
    }

    fn defaults_only() -> Fixed {
        Fixed(vec![
            ("color", "inherit"),
            ("background-color", "transparent"),
            ("font-size", "16px"),
            ("display", "inline"),
            ("margin", "0px"),
            ("opacity", "1"),
            ("not-a-property", "x"),
        ])
    }

    #[test]
    fn test_safe_subset_when_nothing_is_significant() {
        let doc = Document::parse(r#"<p id="p">x</p>"#);
        let p = doc.query_selector("p").unwrap().unwrap();
        let extractor = StyleExtractor::with_resolver(defaults_only(), ScanConfig::default());
        assert_eq!(
            extractor.extract(&doc, p),
            "#p {\n  color: inherit;\n  font-size: 16px;\n  display: inline;\n}"
        );
    }

    #[test]
    fn test_safe_subset_follows_dimensions() {
        let mut doc = Document::parse(r#"<p id="p">x</p>"#);
        let p = doc.query_selector("p").unwrap().unwrap();
        doc.set_bounding_box(p, Rect::new(4.0, 8.0, 120.4, 30.6));
        let extractor = StyleExtractor::with_resolver(defaults_only(), ScanConfig::default());
        let css = extractor.extract(&doc, p);
        assert!(css.starts_with(
            "#p {\n  /* Computed dimensions */\n  width: 120px;\n  height: 31px;\n  color: inherit;\n"
        ));
        assert!(!css.contains("background-color"));
        assert!(!css.contains("Computed style unavailable"));
    }

    #[test]
    fn test_extract_multi_labels_in_order() {
        let doc = Document::parse(r#"<h1 id="a">A</h1><p id="b">B</p>"#);
        let a = doc.query_selector("#a").unwrap().unwrap();
        let b = doc.query_selector("#b").unwrap().unwrap();
        let css = extract_multi(&doc, &[b, a]);
        let first = css.find("/* Element 1: #b */").unwrap();
        let second = css.find("/* Element 2: #a */").unwrap();
        assert!(first < second);
        assert!(css.contains("/* Element 1: #b */\n#b {"));
        assert_eq!(extract_multi(&doc, &[]), "");
    }
}
