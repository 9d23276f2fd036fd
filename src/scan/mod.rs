//! The inspection engine.
//!
//! - [`selector`]: short, stable selectors for page elements
//! - [`extract`] and [`pseudo`]: minimal rule text for an element, including
//!   rules mined for its interactive states
//! - [`apply`]: edited rule text back onto the page, permanently or as a
//!   scoped preview
//! - [`session`]: the per-page [`Scanner`](session::Scanner) tying these to
//!   pointer, keyboard and editor events
//! - [`export`]: file names, file headers, markup mockups and playground
//!   payloads

pub mod apply;
pub mod export;
pub mod extract;
pub mod pseudo;
pub mod selection;
pub mod selector;
pub mod session;
pub mod timer;

/// `id` of the injected live-preview `<style>` element.
pub const PREVIEW_STYLE_ID: &str = "css-scan-live-preview";
/// Attribute carrying the preview marker token on the previewed element.
pub const TARGET_MARKER_ATTR: &str = "data-css-scan-target";
/// Class of the hover overlay.
pub const HIGHLIGHT_CLASS: &str = "css-scan-highlight";
/// Class of the persistent highlight attached to selected elements.
pub const MULTI_HIGHLIGHT_CLASS: &str = "css-scan-multi-highlight";
/// Class of the panel container.
pub const PANEL_CLASS: &str = "css-scan-panel";
/// `id` of the status indicator.
pub const INDICATOR_ID: &str = "css-scan-indicator";
