//! A parsed page together with its style sources and geometry.

use std::collections::HashMap;
use std::path::Path;

use selectors::context::SelectorCaches;

use super::arena::{NodeId, PageDom};
use super::element_ref::{ElementRef, compile_selectors, matches_any};
use super::parse_html;
use crate::error::{Error, Result};
use crate::style::{CssRule, DeclarationBlock, Stylesheet, ToCss};
use crate::util::{decode_text, resolve_path};

/// Bounding box of a rendered element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A stylesheet referenced by `<link rel="stylesheet">`.
#[derive(Debug, Clone)]
pub enum LinkedSheet {
    Accessible(Stylesheet),
    /// Served from another origin; its rules cannot be read.
    CrossOrigin,
}

/// Where a style source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOwner {
    StyleElement(NodeId),
    Link { node: NodeId, href: String },
    /// Registered by the host with [`Document::add_stylesheet`].
    Host(usize),
}

#[derive(Debug)]
enum SheetAccess<'a> {
    Parsed(Stylesheet),
    Shared(&'a Stylesheet),
    Unavailable(String),
}

/// One of the document's style sources, in cascade order.
#[derive(Debug)]
pub struct StyleSource<'a> {
    pub owner: SourceOwner,
    sheet: SheetAccess<'a>,
}

impl StyleSource<'_> {
    /// The source's rule list, or `SourceAccess` when it cannot be read.
    pub fn rules(&self) -> Result<&[CssRule]> {
        match &self.sheet {
            SheetAccess::Parsed(sheet) => Ok(&sheet.rules),
            SheetAccess::Shared(sheet) => Ok(&sheet.rules),
            SheetAccess::Unavailable(reason) => Err(Error::SourceAccess(reason.clone())),
        }
    }

    pub fn is_accessible(&self) -> bool {
        !matches!(self.sheet, SheetAccess::Unavailable(_))
    }
}

/// A page: DOM, URL, style sources and host-supplied geometry.
pub struct Document {
    dom: PageDom,
    url: Option<String>,
    linked: HashMap<String, LinkedSheet>,
    host_sheets: Vec<Stylesheet>,
    geometry: HashMap<NodeId, Rect>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self::from_dom(parse_html(html))
    }

    pub fn parse_with_url(html: &str, url: &str) -> Self {
        let mut doc = Self::parse(html);
        doc.url = Some(url.to_string());
        doc
    }

    pub fn from_dom(dom: PageDom) -> Self {
        Self {
            dom,
            url: None,
            linked: HashMap::new(),
            host_sheets: Vec::new(),
            geometry: HashMap::new(),
        }
    }

    /// Read a page from disk.
    ///
    /// Local `<link rel="stylesheet">` targets are read relative to the page;
    /// remote ones are recorded as cross-origin.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let html = decode_text(&bytes, None);
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut doc = Self::parse_with_url(&html, &format!("file://{}", absolute.display()));

        for href in doc.linked_hrefs() {
            let Some(local) = resolve_path(&absolute, &href) else {
                log::debug!("remote stylesheet treated as cross-origin: {href}");
                doc.mark_cross_origin(&href);
                continue;
            };
            match std::fs::read(&local) {
                Ok(css) => doc.register_stylesheet(&href, &decode_text(&css, None)),
                Err(e) => log::warn!("could not read stylesheet {}: {e}", local.display()),
            }
        }
        Ok(doc)
    }

    pub fn dom(&self) -> &PageDom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut PageDom {
        &mut self.dom
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
    }

    /// Provide the contents of a linked stylesheet.
    pub fn register_stylesheet(&mut self, href: &str, css: &str) {
        self.linked
            .insert(href.to_string(), LinkedSheet::Accessible(Stylesheet::parse(css)));
    }

    pub fn mark_cross_origin(&mut self, href: &str) {
        self.linked.insert(href.to_string(), LinkedSheet::CrossOrigin);
    }

    /// Add a stylesheet that applies after every sheet of the page.
    pub fn add_stylesheet(&mut self, css: &str) {
        self.host_sheets.push(Stylesheet::parse(css));
    }

    /// `href`s of `<link rel="stylesheet">` elements in document order.
    pub fn linked_hrefs(&self) -> Vec<String> {
        self.dom
            .descendants(self.dom.document())
            .into_iter()
            .filter(|&id| self.is_stylesheet_link(id))
            .filter_map(|id| self.dom.get_attr(id, "href").map(str::to_string))
            .collect()
    }

    fn is_stylesheet_link(&self, id: NodeId) -> bool {
        self.dom.tag_name(id).as_deref() == Some("link")
            && self.dom.get_attr(id, "rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|t| t.eq_ignore_ascii_case("stylesheet"))
            })
    }

    /// Style sources in cascade order: `<style>` and `<link>` elements in
    /// document order, then host sheets.
    ///
    /// Recomputed on every call so injected or removed `<style>` elements are
    /// always reflected.
    pub fn style_sources(&self) -> Vec<StyleSource<'_>> {
        let mut sources = Vec::new();

        for id in self.dom.descendants(self.dom.document()) {
            match self.dom.tag_name(id).as_deref() {
                Some("style") => {
                    let css = self.dom.deep_text(id);
                    sources.push(StyleSource {
                        owner: SourceOwner::StyleElement(id),
                        sheet: SheetAccess::Parsed(Stylesheet::parse(&css)),
                    });
                }
                Some("link") if self.is_stylesheet_link(id) => {
                    let Some(href) = self.dom.get_attr(id, "href") else {
                        continue;
                    };
                    let sheet = match self.linked.get(href) {
                        Some(LinkedSheet::Accessible(sheet)) => SheetAccess::Shared(sheet),
                        Some(LinkedSheet::CrossOrigin) => {
                            SheetAccess::Unavailable(format!("cross-origin stylesheet {href}"))
                        }
                        None => SheetAccess::Unavailable(format!("stylesheet {href} not loaded")),
                    };
                    sources.push(StyleSource {
                        owner: SourceOwner::Link {
                            node: id,
                            href: href.to_string(),
                        },
                        sheet,
                    });
                }
                _ => {}
            }
        }

        for (i, sheet) in self.host_sheets.iter().enumerate() {
            sources.push(StyleSource {
                owner: SourceOwner::Host(i),
                sheet: SheetAccess::Shared(sheet),
            });
        }
        sources
    }

    /// First connected element matching a selector list.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// All connected elements matching a selector list, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let compiled = compile_selectors(selector)
            .ok_or_else(|| Error::InvalidSelector(selector.to_string()))?;
        let mut caches = SelectorCaches::default();
        Ok(self
            .dom
            .descendants(self.dom.document())
            .into_iter()
            .filter(|&id| self.dom.is_element(id))
            .filter(|&id| matches_any(&compiled, ElementRef::new(&self.dom, id), &mut caches))
            .collect())
    }

    /// The root element (`<html>`).
    pub fn root_element(&self) -> Option<NodeId> {
        self.dom.element_children(self.dom.document()).next()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.dom.find_by_tag("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.dom.find_by_tag("head")
    }

    /// The element's `style` attribute as a declaration block.
    pub fn inline_style(&self, node: NodeId) -> DeclarationBlock {
        self.dom
            .get_attr(node, "style")
            .map(DeclarationBlock::parse_inline)
            .unwrap_or_default()
    }

    /// Replace the element's `style` attribute. An empty block removes it.
    pub fn set_inline_style(&mut self, node: NodeId, block: &DeclarationBlock) -> Result<()> {
        if !self.dom.is_element(node) {
            return Err(Error::Mutation(format!("node {} is not an element", node.0)));
        }
        if block.is_empty() {
            self.dom.remove_attr(node, "style");
        } else {
            self.dom.set_attr(node, "style", &block.to_css_string());
        }
        Ok(())
    }

    pub fn bounding_box(&self, node: NodeId) -> Option<Rect> {
        self.geometry.get(&node).copied()
    }

    pub fn set_bounding_box(&mut self, node: NodeId, rect: Rect) {
        self.geometry.insert(node, rect);
    }

    /// Concatenated text below a node.
    pub fn text_content(&self, node: NodeId) -> String {
        self.dom.deep_text(node)
    }
}
