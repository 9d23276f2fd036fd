//! selectors crate Element implementation for PageDom.
//!
//! This is the engine's selector-matching primitive: stylesheet rules and
//! mined pseudo-class rules are matched against page elements through it.

use std::fmt;

use cssparser::{CowRcStr, ParseError, Parser, ParserInput, SourceLocation};
use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, Selector, SelectorList, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{NodeData, NodeId, PageDom};

/// Our selector implementation for the selectors crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSelectors;

/// Identifier string type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Wrapper type for LocalName that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Wrapper type for Namespace that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

/// Pseudo-elements are not supported; rules using them never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = ScanSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// Non-tree-structural pseudo-classes understood by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {
    Link,
    Visited,
    Hover,
    Active,
    Focus,
    Disabled,
    Enabled,
    Checked,
}

impl NonTSPseudoClass {
    fn from_name(name: &str) -> Option<Self> {
        let pc = match name.to_ascii_lowercase().as_str() {
            "link" | "any-link" => Self::Link,
            "visited" => Self::Visited,
            "hover" => Self::Hover,
            "active" => Self::Active,
            "focus" => Self::Focus,
            "disabled" => Self::Disabled,
            "enabled" => Self::Enabled,
            "checked" => Self::Checked,
            _ => return None,
        };
        Some(pc)
    }
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = ScanSelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Hover | Self::Active)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, Self::Hover | Self::Active | Self::Focus)
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(match self {
            Self::Link => ":link",
            Self::Visited => ":visited",
            Self::Hover => ":hover",
            Self::Active => ":active",
            Self::Focus => ":focus",
            Self::Disabled => ":disabled",
            Self::Enabled => ":enabled",
            Self::Checked => ":checked",
        })
    }
}

impl<'i> selectors::parser::Parser<'i> for ScanSelectors {
    type Impl = ScanSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, ParseError<'i, Self::Error>> {
        NonTSPseudoClass::from_name(&name).ok_or_else(|| {
            location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(
                name,
            ))
        })
    }
}

impl SelectorImpl for ScanSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Compile a selector list. Returns `None` when the text is not a selector
/// list this matcher understands.
pub fn compile_selectors(text: &str) -> Option<Vec<Selector<ScanSelectors>>> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    SelectorList::parse(&ScanSelectors, &mut parser, ParseRelative::No)
        .ok()
        .map(|list| list.slice().to_vec())
}

/// Test whether any selector in the list matches the element.
pub fn matches_any(
    selectors: &[Selector<ScanSelectors>],
    elem: ElementRef<'_>,
    caches: &mut SelectorCaches,
) -> bool {
    let mut context = MatchingContext::new(
        selectors::matching::MatchingMode::Normal,
        None,
        caches,
        selectors::context::QuirksMode::NoQuirks,
        selectors::matching::NeedsSelectorFlags::No,
        selectors::matching::MatchingForInvalidation::No,
    );

    selectors.iter().any(|selector| {
        selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
    })
}

/// Reference to an element in the PageDom for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub dom: &'a PageDom,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(dom: &'a PageDom, id: NodeId) -> Self {
        Self { dom, id }
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.dom
            .element_name(self.id)
            .is_some_and(|n| n.as_ref().eq_ignore_ascii_case(tag))
    }

    fn is_form_control(&self) -> bool {
        ["button", "input", "select", "textarea", "fieldset", "optgroup", "option"]
            .iter()
            .any(|t| self.is_tag(t))
    }

    fn is_checkable(&self) -> bool {
        self.is_tag("input")
            && self
                .dom
                .get_attr(self.id, "type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"))
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.dom.element_name(self.id))
            .finish()
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = ScanSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        self.dom
            .parent_element(self.id)
            .map(|parent| Self::new(self.dom, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let mut current = self.dom.get(self.id)?.prev_sibling;
        while current.is_some() {
            if self.dom.is_element(current) {
                return Some(Self::new(self.dom, current));
            }
            current = self.dom.get(current)?.prev_sibling;
        }
        None
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let mut current = self.dom.get(self.id)?.next_sibling;
        while current.is_some() {
            if self.dom.is_element(current) {
                return Some(Self::new(self.dom, current));
            }
            current = self.dom.get(current)?.next_sibling;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom
            .element_children(self.id)
            .next()
            .map(|child| Self::new(self.dom, child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.dom
            .element_name(self.id)
            .is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        self.dom
            .element_namespace(self.id)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.element_name(self.id) == other.dom.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.dom.get(self.id).map(|n| &n.data) else {
            return false;
        };

        attrs
            .iter()
            .filter(|attr| match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            })
            .find(|attr| attr.name.local == local_name.0)
            .is_some_and(|attr| operation.eval_str(&attr.value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link => self.is_link(),
            NonTSPseudoClass::Disabled => {
                self.is_form_control() && self.dom.has_attr(self.id, "disabled")
            }
            NonTSPseudoClass::Enabled => {
                self.is_form_control() && !self.dom.has_attr(self.id, "disabled")
            }
            NonTSPseudoClass::Checked => {
                (self.is_checkable() && self.dom.has_attr(self.id, "checked"))
                    || (self.is_tag("option") && self.dom.has_attr(self.id, "selected"))
            }
            // A static page has no pointer, focus or history state.
            NonTSPseudoClass::Visited
            | NonTSPseudoClass::Hover
            | NonTSPseudoClass::Active
            | NonTSPseudoClass::Focus => false,
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        (self.is_tag("a") || self.is_tag("area")) && self.dom.has_attr(self.id, "href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_id(self.id)
            .is_some_and(|elem_id| case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.dom.children(self.id).all(|child| match self.dom.get(child).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => false,
            Some(NodeData::Text(t)) => t.is_empty(),
            _ => true,
        })
    }

    fn is_root(&self) -> bool {
        self.dom
            .get(self.id)
            .and_then(|n| self.dom.get(n.parent))
            .is_some_and(|parent| matches!(parent.data, NodeData::Document))
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn matches(dom: &PageDom, tag: &str, selector: &str) -> bool {
        let id = dom.find_by_tag(tag).unwrap();
        let compiled = compile_selectors(selector).expect("selector should compile");
        let mut caches = SelectorCaches::default();
        matches_any(&compiled, ElementRef::new(dom, id), &mut caches)
    }

    #[test]
    fn test_tag_and_class_selectors() {
        let dom = parse_html(r#"<p class="intro highlight">Hello</p>"#);
        assert!(matches(&dom, "p", "p"));
        assert!(matches(&dom, "p", ".intro"));
        assert!(matches(&dom, "p", "p.intro.highlight"));
        assert!(!matches(&dom, "p", ".missing"));
        assert!(!matches(&dom, "p", "div"));
    }

    #[test]
    fn test_id_and_descendant_selectors() {
        let dom = parse_html(r#"<div><span><p id="main">Hello</p></span></div>"#);
        assert!(matches(&dom, "p", "#main"));
        assert!(matches(&dom, "p", "div p"));
        assert!(matches(&dom, "p", "span > p"));
        assert!(!matches(&dom, "p", "div > p"));
    }

    #[test]
    fn test_selector_list_matches_any() {
        let dom = parse_html("<ul><li>a</li></ul>");
        assert!(matches(&dom, "li", "p, li"));
    }

    #[test]
    fn test_nth_of_type() {
        let dom = parse_html("<div><span>a</span><b>x</b><span>b</span></div>");
        let spans: Vec<_> = dom
            .descendants(dom.document())
            .into_iter()
            .filter(|&n| dom.element_name(n).is_some_and(|t| t.as_ref() == "span"))
            .collect();
        let compiled = compile_selectors("span:nth-of-type(2)").unwrap();
        let mut caches = SelectorCaches::default();
        assert!(!matches_any(&compiled, ElementRef::new(&dom, spans[0]), &mut caches));
        assert!(matches_any(&compiled, ElementRef::new(&dom, spans[1]), &mut caches));
    }

    #[test]
    fn test_state_pseudo_classes_compile_but_do_not_match() {
        let dom = parse_html(r#"<a href="/x">link</a>"#);
        assert!(matches(&dom, "a", "a:link"));
        assert!(!matches(&dom, "a", "a:hover"));
        assert!(!matches(&dom, "a", "a:visited"));
    }

    #[test]
    fn test_form_state_pseudo_classes() {
        let dom = parse_html(r#"<input type="checkbox" checked disabled>"#);
        assert!(matches(&dom, "input", "input:checked"));
        assert!(matches(&dom, "input", "input:disabled"));
        assert!(!matches(&dom, "input", "input:enabled"));
    }

    #[test]
    fn test_unknown_pseudo_class_does_not_compile() {
        assert!(compile_selectors("a:focus-within").is_none());
        assert!(compile_selectors("a::before").is_none());
        assert!(compile_selectors("").is_none());
    }
}
