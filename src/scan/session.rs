//! The inspection session.
//!
//! A [`Scanner`] owns everything the engine adds to a page: the hover
//! overlay, the status indicator, the panel, selection highlights and the
//! live preview. Hosts feed it [`InputEvent`]s together with the current
//! [`Millis`] and honor the returned [`Disposition`].

use std::collections::HashMap;

use log::{debug, info, warn};

use super::apply::{ApplyMode, StyleApplicator};
use super::export::{ExportFile, PlaygroundPayload, html_mockup};
use super::extract::StyleExtractor;
use super::selection::SelectionSet;
use super::selector::is_scan_element;
use super::timer::{Millis, Scheduled};
use super::{HIGHLIGHT_CLASS, INDICATOR_ID, PANEL_CLASS};
use crate::config::ScanConfig;
use crate::dom::{Attribute, Document, NodeId, attr_name, html_name};
use crate::error::Error;
use crate::style::{CascadeResolver, StyleResolver, enum_property};

/// A discrete input delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    PointerOver { target: NodeId },
    PointerOut { target: NodeId, related: Option<NodeId> },
    Click { target: NodeId, modifier: bool },
    /// Pointer or touch press/release.
    Press { target: NodeId },
    Submit { target: NodeId },
    KeyDown { key: String },
    KeyUp { key: String },
    /// The panel editor's text changed.
    EditorInput { text: String },
    Tick,
}

/// What the host should do with the original event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Let the page handle it.
    PassThrough,
    /// Suppress the page's default action and propagation.
    Consume,
}

enum_property! {
    /// Panel tab.
    pub enum Tab {
        #[default]
        View => "view",
        Edit => "edit",
    }
}

enum_property! {
    /// Independent status message slots.
    pub enum FeedbackSlot {
        #[default]
        Apply => "apply",
        Copy => "copy",
        Export => "export",
        LiveEditing => "live-editing",
    }
}

/// A short status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Single(NodeId),
    Multi,
}

/// State of the open panel.
#[derive(Debug, Clone)]
pub struct Panel {
    pub kind: PanelKind,
    /// Text shown on the view tab.
    pub view_text: String,
    pub editor_text: String,
    /// Text extracted when the panel opened; `reset` returns to it.
    pub original_text: String,
    /// Text last applied permanently, or the original.
    pub current_text: String,
    pub tab: Tab,
    pub live_editing: bool,
    node: NodeId,
}

impl Panel {
    pub fn target(&self) -> Option<NodeId> {
        match self.kind {
            PanelKind::Single(target) => Some(target),
            PanelKind::Multi => None,
        }
    }
}

/// One inspection session over a page.
#[derive(Debug)]
pub struct Scanner<R = CascadeResolver> {
    extractor: StyleExtractor<R>,
    applicator: StyleApplicator,
    enabled: bool,
    multi_select: bool,
    hovered: Option<NodeId>,
    overlay: Option<NodeId>,
    indicator: Option<NodeId>,
    selection: SelectionSet,
    panel: Option<Panel>,
    debounce: Scheduled<String>,
    feedback: HashMap<FeedbackSlot, Scheduled<Feedback>>,
}

impl Scanner<CascadeResolver> {
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_extractor(StyleExtractor::with_config(config))
    }
}

impl Default for Scanner<CascadeResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: StyleResolver> Scanner<R> {
    pub fn with_extractor(extractor: StyleExtractor<R>) -> Self {
        Self {
            extractor,
            applicator: StyleApplicator::new(),
            enabled: false,
            multi_select: false,
            hovered: None,
            overlay: None,
            indicator: None,
            selection: SelectionSet::new(),
            panel: None,
            debounce: Scheduled::new(),
            feedback: HashMap::new(),
        }
    }

    /// Use a fixed marker seed instead of the clock.
    pub fn with_marker_seed(mut self, seed: u64) -> Self {
        self.applicator = StyleApplicator::with_seed(seed);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        self.extractor.config()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn applicator(&self) -> &StyleApplicator {
        &self.applicator
    }

    /// The current message in a slot, if it has not expired.
    pub fn feedback(&self, slot: FeedbackSlot) -> Option<&Feedback> {
        self.feedback.get(&slot).and_then(Scheduled::pending)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn enable(&mut self, doc: &mut Document) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        let parent = ui_parent(doc);
        let overlay = create_ui(
            doc,
            parent,
            &[("class", HIGHLIGHT_CLASS), ("style", "display: none;")],
            None,
        );
        let text = self.indicator_text();
        let indicator = create_ui(doc, parent, &[("id", INDICATOR_ID)], Some(&text));
        self.overlay = Some(overlay);
        self.indicator = Some(indicator);
        info!("scanner enabled");
    }

    /// Tear down everything the session added, synchronously.
    pub fn disable(&mut self, doc: &mut Document) {
        if !self.enabled {
            return;
        }
        self.close_panel(doc);
        self.selection.clear(doc);
        self.applicator.remove_preview(doc);
        for node in [self.overlay.take(), self.indicator.take()].into_iter().flatten() {
            doc.dom_mut().detach(node);
        }
        self.debounce.cancel();
        self.feedback.clear();
        self.multi_select = false;
        self.hovered = None;
        self.enabled = false;
        info!("scanner disabled");
    }

    /// Flip the enabled state; returns the new state.
    pub fn toggle(&mut self, doc: &mut Document) -> bool {
        if self.enabled {
            self.disable(doc);
        } else {
            self.enable(doc);
        }
        self.enabled
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Inspect an element: open its panel, or toggle its membership in the
    /// selection when `multi` is set.
    pub fn inspect(&mut self, doc: &mut Document, target: NodeId, multi: bool) {
        if !self.enabled || !doc.dom().is_element(target) || is_scan_element(doc.dom(), target) {
            return;
        }
        if multi {
            let added = self.selection.toggle(doc, target);
            debug!(
                "{} node {} ({} selected)",
                if added { "selected" } else { "deselected" },
                target.0,
                self.selection.len()
            );
            self.update_indicator(doc);
            if self.selection.is_empty() {
                self.close_panel(doc);
            } else {
                self.open_panel(doc, PanelKind::Multi);
            }
        } else {
            self.open_panel(doc, PanelKind::Single(target));
        }
    }

    fn open_panel(&mut self, doc: &mut Document, kind: PanelKind) {
        let text = match kind {
            PanelKind::Single(target) => self.extractor.extract(doc, target),
            PanelKind::Multi => self.extractor.extract_multi(doc, self.selection.members()),
        };
        self.close_panel(doc);

        let parent = ui_parent(doc);
        let node = create_ui(doc, parent, &[("class", PANEL_CLASS)], None);
        create_ui(doc, node, &[("class", "css-scan-code")], Some(&text));

        self.panel = Some(Panel {
            kind,
            view_text: text.clone(),
            editor_text: text.clone(),
            original_text: text.clone(),
            current_text: text,
            tab: Tab::View,
            live_editing: false,
            node,
        });
    }

    /// Close the panel and drop any live preview. Permanent edits stay.
    pub fn close_panel(&mut self, doc: &mut Document) {
        self.debounce.cancel();
        self.applicator.remove_preview(doc);
        if let Some(panel) = self.panel.take() {
            doc.dom_mut().detach(panel.node);
        }
    }

    /// Deselect everything and close the panel.
    pub fn clear_selection(&mut self, doc: &mut Document) {
        self.selection.clear(doc);
        self.close_panel(doc);
        self.update_indicator(doc);
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn handle(&mut self, doc: &mut Document, event: InputEvent, now: Millis) -> Disposition {
        match event {
            InputEvent::PointerOver { target } => self.on_pointer_over(doc, target),
            InputEvent::PointerOut { target, related } => self.on_pointer_out(doc, target, related),
            InputEvent::Click { target, modifier } => self.on_click(doc, target, modifier),
            InputEvent::Press { target } => self.on_interaction(doc, target, false),
            InputEvent::Submit { target } => self.on_interaction(doc, target, true),
            InputEvent::KeyDown { key } => self.on_key_down(doc, &key),
            InputEvent::KeyUp { key } => self.on_key_up(doc, &key),
            InputEvent::EditorInput { text } => {
                self.editor_input(text, now);
                Disposition::PassThrough
            }
            InputEvent::Tick => {
                self.poll(doc, now);
                Disposition::PassThrough
            }
        }
    }

    fn on_pointer_over(&mut self, doc: &mut Document, target: NodeId) -> Disposition {
        if !self.enabled || is_scan_element(doc.dom(), target) {
            return Disposition::PassThrough;
        }
        self.hovered = Some(target);
        if let Some(overlay) = self.overlay {
            let style = match doc.bounding_box(target) {
                Some(r) => format!(
                    "display: block; left: {}px; top: {}px; width: {}px; height: {}px;",
                    r.x, r.y, r.width, r.height
                ),
                None => "display: block;".to_string(),
            };
            doc.dom_mut().set_attr(overlay, "style", &style);
        }
        Disposition::PassThrough
    }

    fn on_pointer_out(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        related: Option<NodeId>,
    ) -> Disposition {
        let dom = doc.dom();
        if !self.enabled || is_scan_element(dom, target) {
            return Disposition::PassThrough;
        }
        if let Some(related) = related
            && (is_scan_element(dom, related)
                || contains(doc, target, related)
                || contains(doc, related, target))
        {
            return Disposition::PassThrough;
        }
        self.hovered = None;
        if let Some(overlay) = self.overlay {
            doc.dom_mut().set_attr(overlay, "style", "display: none;");
        }
        Disposition::PassThrough
    }

    fn on_click(&mut self, doc: &mut Document, target: NodeId, modifier: bool) -> Disposition {
        if !self.enabled || is_scan_element(doc.dom(), target) {
            return Disposition::PassThrough;
        }
        self.inspect(doc, target, modifier || self.multi_select);
        Disposition::Consume
    }

    fn on_interaction(&mut self, doc: &Document, target: NodeId, submit: bool) -> Disposition {
        if !self.enabled || is_scan_element(doc.dom(), target) {
            return Disposition::PassThrough;
        }
        if submit || would_navigate(doc, target) {
            Disposition::Consume
        } else {
            Disposition::PassThrough
        }
    }

    fn on_key_down(&mut self, doc: &mut Document, key: &str) -> Disposition {
        if !self.enabled {
            return Disposition::PassThrough;
        }
        match key {
            "Escape" => {
                if self.panel.is_some() {
                    self.close_panel(doc);
                } else {
                    self.disable(doc);
                }
            }
            "Control" | "Meta" if !self.multi_select => {
                self.multi_select = true;
                self.update_indicator(doc);
            }
            _ => {}
        }
        Disposition::PassThrough
    }

    fn on_key_up(&mut self, doc: &mut Document, key: &str) -> Disposition {
        if self.enabled && matches!(key, "Control" | "Meta") && self.multi_select {
            self.multi_select = false;
            self.update_indicator(doc);
        }
        Disposition::PassThrough
    }

    /// Record editor text; with live editing on, (re)start the debounce.
    pub fn editor_input(&mut self, text: String, now: Millis) {
        let debounce_ms = self.config().debounce_ms;
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        panel.editor_text = text.clone();
        if panel.live_editing {
            self.debounce.schedule(now, debounce_ms, text);
        }
    }

    /// Fire due timers: commit a settled live edit and expire feedback.
    /// Returns whether a preview was committed.
    pub fn poll(&mut self, doc: &mut Document, now: Millis) -> bool {
        for slot in self.feedback.values_mut() {
            slot.take_due(now);
        }
        let Some(text) = self.debounce.take_due(now) else {
            return false;
        };
        self.commit_preview(doc, &text, now)
    }

    fn commit_preview(&mut self, doc: &mut Document, text: &str, now: Millis) -> bool {
        let Some(target) = self.panel.as_ref().and_then(Panel::target) else {
            return false;
        };
        let text = text.trim();
        if text.is_empty() {
            self.notify(FeedbackSlot::Apply, now, "CSS empty", true);
            return false;
        }
        match self.applicator.apply(doc, text, target, ApplyMode::Preview) {
            Ok(applied) => {
                debug!("live preview {:?} committed", applied.token);
                true
            }
            Err(e) => {
                warn!("live preview failed: {e}");
                self.notify(FeedbackSlot::Apply, now, apply_error_message(&e), true);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Panel actions
    // ------------------------------------------------------------------

    /// Apply the editor text permanently. Failures become feedback.
    pub fn apply(&mut self, doc: &mut Document, now: Millis) -> bool {
        let Some(panel) = self.panel.as_ref() else {
            return false;
        };
        let kind = panel.kind;
        let text = panel.editor_text.trim().to_string();
        if text.is_empty() {
            self.notify(FeedbackSlot::Apply, now, "CSS empty", true);
            return false;
        }

        let result = match kind {
            PanelKind::Single(target) => self
                .applicator
                .apply(doc, &text, target, ApplyMode::Permanent)
                .map(|applied| applied.count),
            PanelKind::Multi => {
                let pairs: Vec<(String, NodeId)> = self
                    .selection
                    .members()
                    .iter()
                    .map(|&m| (self.extractor.selector(doc, m), m))
                    .collect();
                self.applicator.apply_blocks(doc, &text, &pairs)
            }
        };

        match result {
            Ok(count) => {
                info!("applied {count} change(s)");
                if let Some(panel) = self.panel.as_mut() {
                    panel.current_text = text;
                }
                self.notify(FeedbackSlot::Apply, now, "CSS applied!", false);
                true
            }
            Err(e) => {
                warn!("apply failed: {e}");
                self.notify(FeedbackSlot::Apply, now, apply_error_message(&e), true);
                false
            }
        }
    }

    /// Undo every edit made through the session and restore the extracted
    /// text.
    pub fn reset(&mut self, doc: &mut Document, now: Millis) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        panel.editor_text = panel.original_text.clone();
        panel.current_text = panel.original_text.clone();
        self.debounce.cancel();
        self.applicator.revert(doc);
        self.notify(FeedbackSlot::Apply, now, "CSS reset!", false);
    }

    /// Flip live editing for a single-element panel; returns the new state.
    pub fn toggle_live_editing(&mut self, doc: &mut Document, now: Millis) -> bool {
        let Some(panel) = self.panel.as_mut() else {
            return false;
        };
        if panel.target().is_none() {
            return false;
        }
        panel.live_editing = !panel.live_editing;
        let on = panel.live_editing;
        if !on {
            self.debounce.cancel();
            self.applicator.remove_preview(doc);
        }
        let message = if on { "Live editing ON" } else { "Live editing OFF" };
        self.notify(FeedbackSlot::LiveEditing, now, message, false);
        on
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if let Some(panel) = self.panel.as_mut() {
            panel.tab = tab;
        }
    }

    /// Text for the clipboard: the editor text on the edit tab, otherwise
    /// the current text.
    pub fn copy_css(&mut self, now: Millis) -> Option<String> {
        let panel = self.panel.as_ref()?;
        let editor = panel.editor_text.trim();
        let text = if panel.tab == Tab::Edit && !editor.is_empty() {
            editor.to_string()
        } else {
            panel.current_text.clone()
        };
        self.notify(FeedbackSlot::Copy, now, "CSS copied!", false);
        Some(text)
    }

    /// The panel's selector; for a multi panel, every selected selector.
    pub fn copy_selector(&mut self, doc: &Document, now: Millis) -> Option<String> {
        let target = self.panel.as_ref()?.target();
        match target {
            Some(target) => {
                let selector = self.extractor.selector(doc, target);
                self.notify(FeedbackSlot::Copy, now, "Selector copied!", false);
                Some(selector)
            }
            None => Some(self.copy_selectors(doc, now)),
        }
    }

    /// Selectors of the selection, one per line.
    pub fn copy_selectors(&mut self, doc: &Document, now: Millis) -> String {
        let selectors: Vec<String> = self
            .selection
            .members()
            .iter()
            .map(|&m| self.extractor.selector(doc, m))
            .collect();
        if selectors.is_empty() {
            self.notify(FeedbackSlot::Copy, now, "Nothing selected", true);
        } else {
            self.notify(FeedbackSlot::Copy, now, "Selectors copied!", false);
        }
        selectors.join(",\n")
    }

    /// The current text as a downloadable file.
    pub fn export_file(&mut self, doc: &Document, now: Millis, wall_secs: u64) -> Option<ExportFile> {
        let panel = self.panel.as_ref()?;
        let selector = match panel.target() {
            Some(target) => self.extractor.selector(doc, target),
            None => "selection".to_string(),
        };
        let file = ExportFile::new(
            &selector,
            &panel.current_text,
            doc.url(),
            wall_secs,
            self.config(),
        );
        info!("exported {}", file.name);
        self.notify(FeedbackSlot::Export, now, "File saved!", false);
        Some(file)
    }

    /// Playground submission for a single-element panel.
    pub fn playground_payload(&mut self, doc: &Document, now: Millis) -> Option<PlaygroundPayload> {
        let panel = self.panel.as_ref()?;
        let Some(target) = panel.target() else {
            self.notify(FeedbackSlot::Export, now, "Select a single element", true);
            return None;
        };
        let payload = PlaygroundPayload::new(
            &self.extractor.selector(doc, target),
            html_mockup(doc, target, self.config()),
            panel.current_text.clone(),
        );
        self.notify(FeedbackSlot::Export, now, "Opening playground...", false);
        Some(payload)
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn indicator_text(&self) -> String {
        let mut text = String::from("CSS Scan active");
        if self.multi_select {
            text.push_str(" | Multi-select ON");
        }
        if !self.selection.is_empty() {
            text.push_str(&format!(" | Selected: {}", self.selection.len()));
        }
        text.push_str(" | ESC to exit");
        text
    }

    fn update_indicator(&mut self, doc: &mut Document) {
        let Some(indicator) = self.indicator else {
            return;
        };
        let text = self.indicator_text();
        let dom = doc.dom_mut();
        let children: Vec<NodeId> = dom.children(indicator).collect();
        for child in children {
            dom.detach(child);
        }
        dom.append_text(indicator, &text);
    }

    fn notify(&mut self, slot: FeedbackSlot, now: Millis, message: &str, is_error: bool) {
        let durations = &self.extractor.config().feedback;
        let ms = match (slot, is_error) {
            (FeedbackSlot::Apply, false) => durations.apply_ms,
            (FeedbackSlot::Apply, true) => durations.apply_error_ms,
            (FeedbackSlot::Copy, false) => durations.copy_ms,
            (FeedbackSlot::Copy, true) => durations.copy_error_ms,
            (FeedbackSlot::Export, false) => durations.export_ms,
            (FeedbackSlot::Export, true) => durations.export_error_ms,
            (FeedbackSlot::LiveEditing, _) => durations.live_editing_ms,
        };
        self.feedback.entry(slot).or_default().schedule(
            now,
            ms,
            Feedback {
                message: message.to_string(),
                is_error,
            },
        );
    }
}

fn apply_error_message(error: &Error) -> &'static str {
    match error {
        Error::Parse(_) => "Invalid CSS",
        _ => "Could not apply CSS",
    }
}

/// Whether `ancestor` contains `node` (inclusive).
fn contains(doc: &Document, ancestor: NodeId, node: NodeId) -> bool {
    let dom = doc.dom();
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = dom.get(id).map(|n| n.parent).filter(|p| p.is_some());
    }
    false
}

/// Links, submit buttons and anything inside a link.
fn would_navigate(doc: &Document, target: NodeId) -> bool {
    let dom = doc.dom();
    let tag = dom.tag_name(target);
    match tag.as_deref() {
        Some("input") => dom
            .get_attr(target, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("submit")),
        Some("button") => !dom
            .get_attr(target, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("button")),
        _ => dom
            .closest(target, |n| dom.tag_name(n).as_deref() == Some("a"))
            .is_some(),
    }
}

fn ui_parent(doc: &Document) -> NodeId {
    doc.body()
        .or_else(|| doc.root_element())
        .unwrap_or_else(|| doc.dom().document())
}

fn create_ui(doc: &mut Document, parent: NodeId, attrs: &[(&str, &str)], text: Option<&str>) -> NodeId {
    let dom = doc.dom_mut();
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: attr_name(name),
            value: value.to_string(),
        })
        .collect();
    let node = dom.create_element(html_name("div"), attrs);
    if let Some(text) = text {
        dom.append_text(node, text);
    }
    dom.append(parent, node);
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head></head><body>
        <a id="link" href="/next"><span id="inner">go</span></a>
        <p id="a">A</p><p id="b">B</p>
        <form><button id="send">Send</button><button id="plain" type="button">x</button></form>
    </body></html>"#;

    fn setup() -> (Document, Scanner) {
        let mut doc = Document::parse(PAGE);
        let mut scanner = Scanner::new().with_marker_seed(1);
        scanner.enable(&mut doc);
        (doc, scanner)
    }

    fn node(doc: &Document, q: &str) -> NodeId {
        doc.query_selector(q).unwrap().unwrap()
    }

    #[test]
    fn test_enable_is_idempotent() {
        let (mut doc, mut scanner) = setup();
        scanner.enable(&mut doc);
        assert_eq!(doc.query_selector_all(".css-scan-highlight").unwrap().len(), 1);
        assert_eq!(doc.query_selector_all("#css-scan-indicator").unwrap().len(), 1);
        assert!(!scanner.toggle(&mut doc));
        assert!(doc.query_selector(".css-scan-highlight").unwrap().is_none());
        scanner.disable(&mut doc);
        assert!(!scanner.is_enabled());
    }

    #[test]
    fn test_disabled_scanner_ignores_events() {
        let mut doc = Document::parse(PAGE);
        let mut scanner = Scanner::new();
        let a = node(&doc, "#a");
        let click = InputEvent::Click { target: a, modifier: false };
        assert_eq!(scanner.handle(&mut doc, click, Millis(0)), Disposition::PassThrough);
        assert!(scanner.panel().is_none());
    }

    #[test]
    fn test_click_opens_panel() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        let click = InputEvent::Click { target: a, modifier: false };
        assert_eq!(scanner.handle(&mut doc, click, Millis(0)), Disposition::Consume);
        let panel = scanner.panel().unwrap();
        assert_eq!(panel.kind, PanelKind::Single(a));
        assert!(panel.view_text.starts_with("#a {"));
        assert_eq!(panel.editor_text, panel.original_text);
        assert_eq!(doc.query_selector_all(".css-scan-panel").unwrap().len(), 1);
    }

    #[test]
    fn test_clicks_on_engine_nodes_pass_through() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        let code = node(&doc, ".css-scan-code");
        let click = InputEvent::Click { target: code, modifier: false };
        assert_eq!(scanner.handle(&mut doc, click, Millis(0)), Disposition::PassThrough);
        assert_eq!(scanner.panel().unwrap().kind, PanelKind::Single(a));
    }

    #[test]
    fn test_hover_overlay() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        let b = node(&doc, "#b");
        let overlay = node(&doc, ".css-scan-highlight");
        scanner.handle(&mut doc, InputEvent::PointerOver { target: a }, Millis(0));
        assert_eq!(scanner.hovered(), Some(a));
        assert_eq!(doc.dom().get_attr(overlay, "style"), Some("display: block;"));

        scanner.handle(&mut doc, InputEvent::PointerOut { target: a, related: Some(b) }, Millis(0));
        assert_eq!(scanner.hovered(), None);
        assert_eq!(doc.dom().get_attr(overlay, "style"), Some("display: none;"));
    }

    #[test]
    fn test_pointer_out_into_descendant_keeps_overlay() {
        let (mut doc, mut scanner) = setup();
        let link = node(&doc, "#link");
        let inner = node(&doc, "#inner");
        scanner.handle(&mut doc, InputEvent::PointerOver { target: link }, Millis(0));
        scanner.handle(
            &mut doc,
            InputEvent::PointerOut { target: link, related: Some(inner) },
            Millis(0),
        );
        assert_eq!(scanner.hovered(), Some(link));
    }

    #[test]
    fn test_navigation_is_consumed() {
        let (mut doc, mut scanner) = setup();
        let inner = node(&doc, "#inner");
        let send = node(&doc, "#send");
        let plain = node(&doc, "#plain");
        let a = node(&doc, "#a");
        let form = node(&doc, "form");
        let mut press = |doc: &mut Document, target| {
            scanner.handle(doc, InputEvent::Press { target }, Millis(0))
        };
        assert_eq!(press(&mut doc, inner), Disposition::Consume);
        assert_eq!(press(&mut doc, send), Disposition::Consume);
        assert_eq!(press(&mut doc, plain), Disposition::PassThrough);
        assert_eq!(press(&mut doc, a), Disposition::PassThrough);
        assert_eq!(
            scanner.handle(&mut doc, InputEvent::Submit { target: form }, Millis(0)),
            Disposition::Consume
        );
    }

    #[test]
    fn test_escape_closes_panel_then_disables() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        let esc = || InputEvent::KeyDown { key: "Escape".into() };
        scanner.handle(&mut doc, esc(), Millis(0));
        assert!(scanner.panel().is_none());
        assert!(scanner.is_enabled());
        scanner.handle(&mut doc, esc(), Millis(0));
        assert!(!scanner.is_enabled());
    }

    #[test]
    fn test_modifier_key_drives_multi_select() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        let b = node(&doc, "#b");
        scanner.handle(&mut doc, InputEvent::KeyDown { key: "Control".into() }, Millis(0));
        assert!(scanner.is_multi_select());
        assert_eq!(
            scanner.indicator_text(),
            "CSS Scan active | Multi-select ON | ESC to exit"
        );
        scanner.handle(&mut doc, InputEvent::Click { target: a, modifier: false }, Millis(0));
        scanner.handle(&mut doc, InputEvent::Click { target: b, modifier: false }, Millis(0));
        assert_eq!(scanner.selection().members(), &[a, b]);
        assert_eq!(
            scanner.indicator_text(),
            "CSS Scan active | Multi-select ON | Selected: 2 | ESC to exit"
        );
        let indicator = node(&doc, "#css-scan-indicator");
        assert_eq!(doc.text_content(indicator), scanner.indicator_text());

        scanner.handle(&mut doc, InputEvent::KeyUp { key: "Meta".into() }, Millis(0));
        assert!(!scanner.is_multi_select());
        assert_eq!(scanner.panel().unwrap().kind, PanelKind::Multi);
    }

    #[test]
    fn test_emptying_selection_closes_panel() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, true);
        assert!(scanner.panel().is_some());
        scanner.inspect(&mut doc, a, true);
        assert!(scanner.panel().is_none());
        assert!(scanner.selection().is_empty());
    }

    #[test]
    fn test_apply_feedback_and_expiry() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        scanner.editor_input("#a { color: red }".into(), Millis(0));
        assert!(scanner.apply(&mut doc, Millis(10)));
        assert_eq!(doc.dom().get_attr(a, "style"), Some("color: red;"));
        let fb = scanner.feedback(FeedbackSlot::Apply).unwrap();
        assert_eq!(fb.message, "CSS applied!");
        assert!(!fb.is_error);
        assert_eq!(scanner.panel().unwrap().current_text, "#a { color: red }");

        scanner.poll(&mut doc, Millis(1509));
        assert!(scanner.feedback(FeedbackSlot::Apply).is_some());
        scanner.poll(&mut doc, Millis(1510));
        assert!(scanner.feedback(FeedbackSlot::Apply).is_none());
    }

    #[test]
    fn test_apply_errors_become_feedback() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        scanner.editor_input("not css".into(), Millis(0));
        assert!(!scanner.apply(&mut doc, Millis(0)));
        let fb = scanner.feedback(FeedbackSlot::Apply).unwrap();
        assert_eq!(fb.message, "Invalid CSS");
        assert!(fb.is_error);
        assert!(!doc.dom().has_attr(a, "style"));

        scanner.editor_input("   ".into(), Millis(0));
        assert!(!scanner.apply(&mut doc, Millis(0)));
        assert_eq!(scanner.feedback(FeedbackSlot::Apply).unwrap().message, "CSS empty");
    }

    #[test]
    fn test_live_editing_toggle_drops_preview() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        assert!(scanner.toggle_live_editing(&mut doc, Millis(0)));
        scanner.handle(
            &mut doc,
            InputEvent::EditorInput { text: "#a { color: red }".into() },
            Millis(0),
        );
        scanner.handle(&mut doc, InputEvent::Tick, Millis(300));
        assert!(doc.query_selector("#css-scan-live-preview").unwrap().is_some());

        assert!(!scanner.toggle_live_editing(&mut doc, Millis(400)));
        assert!(doc.query_selector("#css-scan-live-preview").unwrap().is_none());
        assert!(!doc.dom().has_attr(a, "data-css-scan-target"));
        assert_eq!(
            scanner.feedback(FeedbackSlot::LiveEditing).unwrap().message,
            "Live editing OFF"
        );
    }

    #[test]
    fn test_input_without_live_editing_does_not_preview() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        scanner.editor_input("#a { color: red }".into(), Millis(0));
        assert!(!scanner.poll(&mut doc, Millis(1000)));
        assert!(doc.query_selector("#css-scan-live-preview").unwrap().is_none());
    }

    #[test]
    fn test_copy_css_follows_tab() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        scanner.editor_input("#a { color: red }".into(), Millis(0));
        let original = scanner.panel().unwrap().original_text.clone();
        assert_eq!(scanner.copy_css(Millis(0)), Some(original));
        scanner.switch_tab(Tab::Edit);
        assert_eq!(scanner.copy_css(Millis(0)).as_deref(), Some("#a { color: red }"));
        assert_eq!(scanner.feedback(FeedbackSlot::Copy).unwrap().message, "CSS copied!");
    }

    #[test]
    fn test_copy_selectors() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        let b = node(&doc, "#b");
        scanner.inspect(&mut doc, a, true);
        scanner.inspect(&mut doc, b, true);
        assert_eq!(scanner.copy_selectors(&doc, Millis(0)), "#a,\n#b");
        assert_eq!(scanner.copy_selector(&doc, Millis(0)).as_deref(), Some("#a,\n#b"));
    }

    #[test]
    fn test_disable_tears_down_everything() {
        let (mut doc, mut scanner) = setup();
        let a = node(&doc, "#a");
        let b = node(&doc, "#b");
        scanner.inspect(&mut doc, b, true);
        scanner.inspect(&mut doc, a, false);
        scanner.toggle_live_editing(&mut doc, Millis(0));
        scanner.editor_input("#a { color: red }".into(), Millis(0));
        scanner.poll(&mut doc, Millis(300));

        scanner.disable(&mut doc);
        for query in [
            ".css-scan-highlight",
            ".css-scan-multi-highlight",
            ".css-scan-panel",
            "#css-scan-indicator",
            "#css-scan-live-preview",
            "[data-css-scan-target]",
        ] {
            assert!(doc.query_selector(query).unwrap().is_none(), "{query} left behind");
        }
        assert!(scanner.selection().is_empty());
    }

    #[test]
    fn test_export_and_playground() {
        let (mut doc, mut scanner) = setup();
        doc.set_url("https://example.com/page");
        let a = node(&doc, "#a");
        scanner.inspect(&mut doc, a, false);
        let file = scanner.export_file(&doc, Millis(0), 1_700_000_000).unwrap();
        assert_eq!(file.name, "css-scan-a-2023-11-14.css");
        assert!(file.contents.contains(" * URL: https://example.com/page\n"));
        assert_eq!(scanner.feedback(FeedbackSlot::Export).unwrap().message, "File saved!");

        let payload = scanner.playground_payload(&doc, Millis(0)).unwrap();
        assert!(payload.html.contains("<p id=\"a\">"));
        assert_eq!(payload.css, scanner.panel().unwrap().current_text);
    }
}
