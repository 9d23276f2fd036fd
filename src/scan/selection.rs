//! Multi-element selection.
//!
//! Each member owns exactly one highlight element, recorded on the member's
//! node so removing a member destroys its own highlight and nothing else.

use super::MULTI_HIGHLIGHT_CLASS;
use crate::dom::{Attribute, Document, NodeId, attr_name, html_name};

/// Insertion-ordered set of selected elements.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    members: Vec<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `node` if absent, remove it otherwise. Returns whether it is now a
    /// member.
    pub fn toggle(&mut self, doc: &mut Document, node: NodeId) -> bool {
        if self.contains(node) {
            self.remove(doc, node);
            false
        } else {
            self.add(doc, node)
        }
    }

    pub fn add(&mut self, doc: &mut Document, node: NodeId) -> bool {
        if self.contains(node) || !doc.dom().is_element(node) {
            return false;
        }
        attach_highlight(doc, node);
        self.members.push(node);
        true
    }

    pub fn remove(&mut self, doc: &mut Document, node: NodeId) -> bool {
        let Some(index) = self.members.iter().position(|&m| m == node) else {
            return false;
        };
        self.members.remove(index);
        detach_highlight(doc, node);
        true
    }

    /// Remove every member and its highlight.
    pub fn clear(&mut self, doc: &mut Document) {
        for node in self.members.drain(..) {
            detach_highlight(doc, node);
        }
    }
}

/// The highlight element attached to a selected node.
pub fn highlight_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.dom()
        .get(node)
        .map(|n| n.highlight)
        .filter(|h| h.is_some())
}

fn attach_highlight(doc: &mut Document, node: NodeId) {
    let mut attrs = vec![Attribute {
        name: attr_name("class"),
        value: MULTI_HIGHLIGHT_CLASS.to_string(),
    }];
    if let Some(rect) = doc.bounding_box(node) {
        attrs.push(Attribute {
            name: attr_name("style"),
            value: format!(
                "left: {}px; top: {}px; width: {}px; height: {}px;",
                rect.x, rect.y, rect.width, rect.height
            ),
        });
    }
    let parent = doc
        .body()
        .or_else(|| doc.root_element())
        .unwrap_or_else(|| doc.dom().document());

    let dom = doc.dom_mut();
    let highlight = dom.create_element(html_name("div"), attrs);
    dom.append(parent, highlight);
    if let Some(n) = dom.get_mut(node) {
        n.highlight = highlight;
    }
}

fn detach_highlight(doc: &mut Document, node: NodeId) {
    let dom = doc.dom_mut();
    let highlight = match dom.get_mut(node) {
        Some(n) => std::mem::replace(&mut n.highlight, NodeId::NONE),
        None => return,
    };
    if highlight.is_some() {
        dom.detach(highlight);
    }
}
