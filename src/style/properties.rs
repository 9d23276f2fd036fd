//! Property tables and the enum_property! macro.
//!
//! Every property the resolver computes is listed once in [`PROPERTIES`], in
//! the order extracted rules print them.

use super::ToCss;

/// Macro for defining CSS keyword enums with automatic ToCss implementation.
///
/// # Example
///
/// ```ignore
/// enum_property! {
///     /// Font style (normal, italic, oblique).
///     pub enum FontStyle {
///         #[default]
///         Normal => "normal",
///         Italic => "italic",
///         Oblique => "oblique",
///     }
/// }
/// ```
macro_rules! enum_property {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $css:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Returns the CSS keyword for this value.
            #[inline]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $css,)*
                }
            }

            /// Parse a CSS keyword into this enum.
            #[inline]
            pub fn from_css(s: &str) -> Option<Self> {
                match s {
                    $($css => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl $crate::style::ToCss for $name {
            fn to_css(&self, buf: &mut String) {
                buf.push_str(self.as_str());
            }
        }
    };
}

// Export the macro for use within the crate
pub(crate) use enum_property;

enum_property! {
    /// Concern a significant property belongs to.
    pub enum PropertyGroup {
        #[default]
        Layout => "layout",
        Size => "size",
        Spacing => "spacing",
        Border => "border",
        Background => "background",
        Typography => "typography",
        Effects => "effects",
        Flex => "flex",
        Grid => "grid",
    }
}

/// Static description of a property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub group: PropertyGroup,
    /// Value used when nothing is cascaded (and the default for the
    /// significance filter, see [`is_default_value`]).
    pub initial: &'static str,
    pub inherited: bool,
    /// Takes lengths: a unitless `0` resolves to `0px`.
    pub length: bool,
}

const fn prop(
    name: &'static str,
    group: PropertyGroup,
    initial: &'static str,
    inherited: bool,
    length: bool,
) -> PropertyInfo {
    PropertyInfo {
        name,
        group,
        initial,
        inherited,
        length,
    }
}

use PropertyGroup::*;

/// The significance allow-list, in output order.
pub static PROPERTIES: &[PropertyInfo] = &[
    // Layout
    prop("display", Layout, "inline", false, false),
    prop("position", Layout, "static", false, false),
    prop("top", Layout, "auto", false, true),
    prop("right", Layout, "auto", false, true),
    prop("bottom", Layout, "auto", false, true),
    prop("left", Layout, "auto", false, true),
    prop("z-index", Layout, "auto", false, false),
    // Size
    prop("width", Size, "auto", false, true),
    prop("height", Size, "auto", false, true),
    prop("max-width", Size, "none", false, true),
    prop("max-height", Size, "none", false, true),
    prop("min-width", Size, "0px", false, true),
    prop("min-height", Size, "0px", false, true),
    prop("box-sizing", Size, "content-box", false, false),
    // Spacing
    prop("margin", Spacing, "0px", false, true),
    prop("margin-top", Spacing, "0px", false, true),
    prop("margin-right", Spacing, "0px", false, true),
    prop("margin-bottom", Spacing, "0px", false, true),
    prop("margin-left", Spacing, "0px", false, true),
    prop("padding", Spacing, "0px", false, true),
    prop("padding-top", Spacing, "0px", false, true),
    prop("padding-right", Spacing, "0px", false, true),
    prop("padding-bottom", Spacing, "0px", false, true),
    prop("padding-left", Spacing, "0px", false, true),
    // Border
    prop("border", Border, "none", false, true),
    prop("border-width", Border, "0px", false, true),
    prop("border-style", Border, "none", false, false),
    prop("border-color", Border, "currentcolor", false, false),
    prop("border-radius", Border, "0px", false, true),
    prop("border-top", Border, "none", false, true),
    prop("border-right", Border, "none", false, true),
    prop("border-bottom", Border, "none", false, true),
    prop("border-left", Border, "none", false, true),
    // Background
    prop("background", Background, "none", false, false),
    prop("background-color", Background, "rgba(0, 0, 0, 0)", false, false),
    prop("background-image", Background, "none", false, false),
    prop("background-size", Background, "auto", false, true),
    prop("background-position", Background, "0% 0%", false, true),
    prop("background-repeat", Background, "repeat", false, false),
    prop("background-attachment", Background, "scroll", false, false),
    // Typography
    prop("color", Typography, "rgb(0, 0, 0)", true, false),
    prop("font-family", Typography, "serif", true, false),
    prop("font-size", Typography, "16px", true, true),
    prop("font-weight", Typography, "400", true, false),
    prop("font-style", Typography, "normal", true, false),
    prop("line-height", Typography, "normal", true, true),
    prop("text-align", Typography, "start", true, false),
    prop("text-decoration", Typography, "none", false, false),
    prop("text-transform", Typography, "none", true, false),
    prop("letter-spacing", Typography, "normal", true, true),
    prop("word-spacing", Typography, "0px", true, true),
    prop("white-space", Typography, "normal", true, false),
    // Visual effects
    prop("opacity", Effects, "1", false, false),
    prop("visibility", Effects, "visible", true, false),
    prop("overflow", Effects, "visible", false, false),
    prop("overflow-x", Effects, "visible", false, false),
    prop("overflow-y", Effects, "visible", false, false),
    prop("cursor", Effects, "auto", true, false),
    prop("transform", Effects, "none", false, false),
    prop("transition", Effects, "all 0s ease 0s", false, false),
    prop("animation", Effects, "none", false, false),
    prop("box-shadow", Effects, "none", false, false),
    prop("text-shadow", Effects, "none", true, false),
    prop("filter", Effects, "none", false, false),
    // Flexbox
    prop("flex", Flex, "0 1 auto", false, false),
    prop("flex-direction", Flex, "row", false, false),
    prop("flex-wrap", Flex, "nowrap", false, false),
    prop("justify-content", Flex, "normal", false, false),
    prop("align-items", Flex, "normal", false, false),
    prop("align-content", Flex, "normal", false, false),
    prop("flex-grow", Flex, "0", false, false),
    prop("flex-shrink", Flex, "1", false, false),
    prop("flex-basis", Flex, "auto", false, true),
    // Grid
    prop("grid", Grid, "none", false, false),
    prop("grid-template-columns", Grid, "none", false, false),
    prop("grid-template-rows", Grid, "none", false, false),
    prop("grid-gap", Grid, "normal", false, true),
    prop("grid-column", Grid, "auto", false, false),
    prop("grid-row", Grid, "auto", false, false),
    prop("justify-items", Grid, "normal", false, false),
];

/// Look up a property by (lower-case) name.
pub fn property_info(name: &str) -> Option<&'static PropertyInfo> {
    PROPERTIES.iter().find(|p| p.name == name)
}

/// Values that never carry information on their own.
pub const NOISE_VALUES: &[&str] = &[
    "auto",
    "normal",
    "none",
    "0px",
    "static",
    "visible",
    "transparent",
];

/// Properties whose initial value still counts as significant.
const NO_DEFAULT: &[&str] = &["color"];

/// Explicit defaults on top of the initial-value table.
const EXPLICIT_DEFAULTS: &[(&str, &str)] = &[
    ("margin", "0px"),
    ("padding", "0px"),
    ("border", "none"),
    ("background", "none"),
    ("opacity", "1"),
    ("z-index", "auto"),
];

/// Check a resolved value against the default-value table.
pub fn is_default_value(name: &str, value: &str) -> bool {
    if NO_DEFAULT.contains(&name) {
        return false;
    }
    if EXPLICIT_DEFAULTS
        .iter()
        .any(|(n, v)| *n == name && *v == value)
    {
        return true;
    }
    property_info(name).is_some_and(|p| p.initial == value)
}

pub fn is_noise_value(value: &str) -> bool {
    NOISE_VALUES.contains(&value)
}

/// Properties copied out of rules mined for a pseudo-class.
pub const PSEUDO_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "background",
    "border",
    "border-color",
    "box-shadow",
    "text-decoration",
    "opacity",
    "transform",
    "transition",
];

/// Minimal subset used when the significance filter yields nothing.
pub const SAFE_PROPERTIES: &[&str] = &["color", "background-color", "font-size", "display"];

/// Box shorthands resolved from their four longhands.
pub const BOX_SHORTHANDS: &[&str] = &["margin", "padding"];

/// Longhands of a box shorthand, in top/right/bottom/left order.
pub fn box_longhands(shorthand: &str) -> Option<[&'static str; 4]> {
    match shorthand {
        "margin" => Some(["margin-top", "margin-right", "margin-bottom", "margin-left"]),
        "padding" => Some(["padding-top", "padding-right", "padding-bottom", "padding-left"]),
        _ => None,
    }
}

/// Expand a 1-4 value box shorthand to top/right/bottom/left.
pub fn expand_box(value: &str) -> Option<[String; 4]> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [t, r, b, l] = match parts.as_slice() {
        [a] => [*a, *a, *a, *a],
        [v, h] => [*v, *h, *v, *h],
        [t, h, b] => [*t, *h, *b, *h],
        [t, r, b, l] => [*t, *r, *b, *l],
        _ => return None,
    };
    Some([t.to_string(), r.to_string(), b.to_string(), l.to_string()])
}

/// Serialize top/right/bottom/left as the shortest equivalent shorthand.
pub fn collapse_box(sides: [&str; 4]) -> String {
    let [t, r, b, l] = sides;
    if t == r && r == b && b == l {
        t.to_string()
    } else if t == b && r == l {
        format!("{t} {r}")
    } else if r == l {
        format!("{t} {r} {b}")
    } else {
        format!("{t} {r} {b} {l}")
    }
}

impl ToCss for PropertyInfo {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_has_no_duplicates() {
        let mut names: Vec<_> = PROPERTIES.iter().map(|p| p.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(total >= 60);
    }

    #[test]
    fn test_every_group_is_populated() {
        for group in PropertyGroup::ALL {
            assert!(
                PROPERTIES.iter().any(|p| p.group == *group),
                "no property in group {}",
                group.as_str()
            );
        }
    }

    #[test]
    fn test_default_table() {
        assert!(is_default_value("margin", "0px"));
        assert!(is_default_value("opacity", "1"));
        assert!(is_default_value("z-index", "auto"));
        assert!(is_default_value("border", "none"));
        assert!(is_default_value("background", "none"));
        assert!(is_default_value("flex-direction", "row"));
        assert!(!is_default_value("opacity", "0.5"));
        assert!(!is_default_value("color", "rgb(0, 0, 0)"));
    }

    #[test]
    fn test_expand_and_collapse_box() {
        assert_eq!(
            expand_box("1px 2px 3px").unwrap(),
            ["1px", "2px", "3px", "2px"].map(String::from)
        );
        assert!(expand_box("").is_none());
        assert!(expand_box("1 2 3 4 5").is_none());

        assert_eq!(collapse_box(["1px", "1px", "1px", "1px"]), "1px");
        assert_eq!(collapse_box(["1px", "2px", "1px", "2px"]), "1px 2px");
        assert_eq!(collapse_box(["1px", "2px", "3px", "2px"]), "1px 2px 3px");
        assert_eq!(collapse_box(["1px", "2px", "3px", "4px"]), "1px 2px 3px 4px");
    }

    #[test]
    fn test_group_keywords() {
        assert_eq!(PropertyGroup::from_css("flex"), Some(PropertyGroup::Flex));
        assert_eq!(PropertyGroup::Grid.to_css_string(), "grid");
    }
}
