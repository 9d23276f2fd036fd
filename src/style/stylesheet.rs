//! CSS stylesheet parsing and rule structures.

use cssparser::{
    AtRuleParser, CowRcStr, ParseError, Parser, ParserInput, ParserState, QualifiedRuleParser,
    StyleSheetParser,
};
use selectors::context::SelectorCaches;
use selectors::parser::Selector;

use super::declaration::{Declaration, parse_declaration_list};
use crate::dom::element_ref::{ElementRef, ScanSelectors, compile_selectors, matches_any};

/// A parsed CSS stylesheet.
#[derive(Debug, Default, Clone)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
}

/// A style rule with its selector text, compiled selectors and declarations.
#[derive(Debug, Clone)]
pub struct CssRule {
    /// Selector text as written, trimmed.
    pub selector_text: String,
    /// Compiled selector list; empty when the text is not understood by the
    /// matcher (such rules never match during the cascade).
    pub selectors: Vec<Selector<ScanSelectors>>,
    /// Declarations in source order, `!important` flagged per declaration.
    pub declarations: Vec<Declaration>,
}

impl CssRule {
    /// Value of a property declared in this rule (last declaration wins).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    /// Highest specificity among the selectors that match the element.
    pub fn matching_specificity(
        &self,
        elem: ElementRef<'_>,
        caches: &mut SelectorCaches,
    ) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|selector| matches_any(std::slice::from_ref(selector), elem, caches))
            .map(Specificity::from_selector)
            .max()
    }
}

/// CSS specificity for cascade ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Specificity {
    pub ids: u16,
    pub classes: u16,
    pub elements: u16,
}

impl Specificity {
    pub fn from_selector(selector: &Selector<ScanSelectors>) -> Self {
        let spec = selector.specificity();
        // selectors crate packs specificity as (id << 20) | (class << 10) | elements
        Self {
            ids: ((spec >> 20) & 0x3FF) as u16,
            classes: ((spec >> 10) & 0x3FF) as u16,
            elements: (spec & 0x3FF) as u16,
        }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.elements.cmp(&other.elements))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Origin of a declaration (for cascade ordering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    UserAgent = 0,
    Author = 1,
    /// The element's own `style` attribute.
    Inline = 2,
}

impl Stylesheet {
    /// Parse a CSS stylesheet from a string.
    ///
    /// Parsing is lenient: at-rules and malformed rules are skipped.
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
        let stylesheet_parser = StyleSheetParser::new(&mut parser, &mut rule_parser);

        for result in stylesheet_parser {
            // Ignore errors - lenient parsing
            let _ = result;
        }

        Self { rules }
    }

    /// Check if the stylesheet is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parser for top-level stylesheet rules.
struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<CssRule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // Skip at-rules (@media, @font-face, @keyframes, ...)
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        Ok(input.slice_from(start).trim().to_string())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        parse_declaration_list(input, &mut declarations);

        let selectors = compile_selectors(&prelude).unwrap_or_default();
        if selectors.is_empty() {
            log::debug!("selector not understood by matcher: {prelude}");
        }

        self.rules.push(CssRule {
            selector_text: prelude,
            selectors,
            declarations,
        });

        Ok(())
    }
}

/// Default styles applied before any page stylesheet.
pub const USER_AGENT_CSS: &str = r#"
html, body, div, p, section, article, aside, nav, header, footer, main,
h1, h2, h3, h4, h5, h6, ul, ol, form, fieldset, blockquote, pre, figure,
figcaption, address, hr, dl, dt, dd, details, summary { display: block; }
head, style, script, link, meta, title, template, noscript { display: none; }
li { display: list-item; }
table { display: table; border-collapse: separate; }
tr { display: table-row; }
td, th { display: table-cell; }
thead { display: table-header-group; }
tbody { display: table-row-group; }
tfoot { display: table-footer-group; }
button, input, select, textarea, img { display: inline-block; }
body { margin: 8px; }
p, blockquote, figure, dl, ul, ol { margin-top: 16px; margin-bottom: 16px; }
ul, ol { padding-left: 40px; }
h1 { font-size: 32px; font-weight: 700; margin-top: 21px; margin-bottom: 21px; }
h2 { font-size: 24px; font-weight: 700; margin-top: 20px; margin-bottom: 20px; }
h3 { font-size: 19px; font-weight: 700; margin-top: 19px; margin-bottom: 19px; }
h4, h5, h6 { font-weight: 700; }
b, strong, th { font-weight: 700; }
i, em, cite { font-style: italic; }
a:link { color: rgb(0, 0, 238); text-decoration: underline; cursor: pointer; }
pre, code { font-family: monospace; }
pre { white-space: pre; }
"#;
