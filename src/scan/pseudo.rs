//! Pseudo-class rule mining.
//!
//! This is best-effort. A rule is taken to style `target:pc` when its selector
//! text mentions `:pc` and the text with that first occurrence removed matches
//! the target in its current state. When the remaining text does not compile,
//! a substring comparison against the synthesized selector stands in for
//! matching, which can both over- and under-match.

use log::debug;
use selectors::context::SelectorCaches;

use super::extract::StyleRule;
use crate::dom::element_ref::{compile_selectors, matches_any};
use crate::dom::{Document, ElementRef, NodeId, PageDom, StyleSource};
use crate::style::properties::PSEUDO_PROPERTIES;
use crate::style::{CssRule, enum_property};

enum_property! {
    /// Interactive states mined from style sources, in output order.
    pub enum PseudoClass {
        #[default]
        Hover => "hover",
        Focus => "focus",
        Active => "active",
        Visited => "visited",
        Disabled => "disabled",
        Checked => "checked",
    }
}

const FOCUSABLE: &[&str] = &["input", "textarea", "button", "select"];
const DISABLEABLE: &[&str] = &[
    "button", "input", "select", "textarea", "fieldset", "optgroup", "option",
];

impl PseudoClass {
    /// Whether the state can apply to the element at all.
    pub fn applies_to(self, dom: &PageDom, node: NodeId) -> bool {
        let Some(tag) = dom.tag_name(node) else {
            return false;
        };
        match self {
            PseudoClass::Hover | PseudoClass::Active => true,
            PseudoClass::Focus => {
                FOCUSABLE.contains(&tag.as_str())
                    || (tag == "a" && dom.has_attr(node, "href"))
                    || dom
                        .get_attr(node, "tabindex")
                        .and_then(|t| t.trim().parse::<i32>().ok())
                        .is_some_and(|t| t >= 0)
            }
            PseudoClass::Visited => tag == "a",
            PseudoClass::Disabled => DISABLEABLE.contains(&tag.as_str()),
            PseudoClass::Checked => {
                tag == "input"
                    && dom.get_attr(node, "type").is_some_and(|t| {
                        t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio")
                    })
            }
        }
    }

    /// The `:pc` suffix.
    pub fn suffix(self) -> String {
        format!(":{}", self.as_str())
    }
}

/// Mined blocks, one per pseudo-class that produced declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PseudoRuleSet {
    blocks: Vec<(PseudoClass, StyleRule)>,
}

impl PseudoRuleSet {
    pub fn get(&self, pc: PseudoClass) -> Option<&StyleRule> {
        self.blocks
            .iter()
            .find(|(p, _)| *p == pc)
            .map(|(_, rule)| rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PseudoClass, &StyleRule)> {
        self.blocks.iter().map(|(pc, rule)| (*pc, rule))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Mine every eligible pseudo-class for `target`. Output blocks use
/// `selector:pc` as their selector.
pub fn mine(
    doc: &Document,
    sources: &[StyleSource<'_>],
    target: NodeId,
    selector: &str,
) -> PseudoRuleSet {
    let dom = doc.dom();
    let mut caches = SelectorCaches::default();
    let mut set = PseudoRuleSet::default();

    for &pc in PseudoClass::ALL {
        if !pc.applies_to(dom, target) {
            continue;
        }
        let mut block = StyleRule::new(format!("{selector}{}", pc.suffix()));

        for source in sources {
            let rules = match source.rules() {
                Ok(rules) => rules,
                Err(e) => {
                    debug!("skipping style source {:?}: {e}", source.owner);
                    continue;
                }
            };
            for rule in rules {
                if !rule_targets(rule, pc, dom, target, selector, &mut caches) {
                    continue;
                }
                for &name in PSEUDO_PROPERTIES {
                    if let Some(value) = rule.get(name)
                        && usable(value)
                    {
                        block.set(name, value.trim());
                    }
                }
            }
        }

        if !block.is_empty() {
            set.blocks.push((pc, block));
        }
    }
    set
}

fn usable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "initial" && value != "inherit"
}

fn rule_targets(
    rule: &CssRule,
    pc: PseudoClass,
    dom: &PageDom,
    target: NodeId,
    synthesized: &str,
    caches: &mut SelectorCaches,
) -> bool {
    let suffix = pc.suffix();
    if !rule.selector_text.contains(&suffix) {
        return false;
    }
    let base = rule.selector_text.replacen(&suffix, "", 1);
    match compile_selectors(&base) {
        Some(compiled) => matches_any(&compiled, ElementRef::new(dom, target), caches),
        None => base.contains(synthesized) || synthesized.contains(base.as_str()),
    }
}
