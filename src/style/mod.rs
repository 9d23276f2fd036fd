//! Style system: stylesheet and declaration parsing, property tables, cascade.
//!
//! This module contains:
//! - Lenient stylesheet parsing that keeps raw selector text next to the
//!   compiled selector list
//! - Inline declaration blocks (`style` attributes)
//! - Property tables (initial values, significance allow-list, noise values)
//! - The cascade resolver producing a resolved value for every property

mod cascade;
mod declaration;
pub mod properties;
mod stylesheet;

/// Serialize a value as CSS text.
pub trait ToCss {
    /// Write this value as CSS to the buffer.
    fn to_css(&self, buf: &mut String);

    /// Convert to a CSS string (convenience method).
    fn to_css_string(&self) -> String {
        let mut buf = String::new();
        self.to_css(&mut buf);
        buf
    }
}

pub use cascade::{CascadeResolver, ResolvedStyle, StyleResolver, normalize_value};
pub use declaration::{Declaration, DeclarationBlock};
pub use stylesheet::{CssRule, Origin, Specificity, Stylesheet, USER_AGENT_CSS};

pub(crate) use declaration::split_important;

// Re-export macro for internal use
pub(crate) use properties::enum_property;
