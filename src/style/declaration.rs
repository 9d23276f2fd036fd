//! CSS declarations and inline declaration blocks.
//!
//! Values are kept as raw text: the engine shows, edits and re-applies what
//! authors wrote rather than a typed interpretation of it.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

use super::ToCss;

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lower-cased property name.
    pub name: String,
    /// Value text with any `!important` suffix removed.
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(name: &str, value: &str, important: bool) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            value: value.trim().to_string(),
            important,
        }
    }
}

impl ToCss for Declaration {
    fn to_css(&self, buf: &mut String) {
        buf.push_str(&self.name);
        buf.push_str(": ");
        buf.push_str(&self.value);
        if self.important {
            buf.push_str(" !important");
        }
    }
}

/// Split a trailing `!important` off a raw value.
pub(crate) fn split_important(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    if let Some(bang) = trimmed.rfind('!')
        && trimmed[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        return (trimmed[..bang].trim_end(), true);
    }
    (trimmed, false)
}

/// Ordered declarations, as found in a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a `style` attribute. Invalid items are skipped.
    pub fn parse_inline(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut declarations = Vec::new();
        parse_declaration_list(&mut parser, &mut declarations);
        Self { declarations }
    }

    /// Value of a property, without any `!important` flag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .map(|d| d.value.as_str())
    }

    /// Set a property, replacing an existing declaration in place or appending.
    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        let decl = Declaration::new(name, value, important);
        match self.declarations.iter_mut().find(|d| d.name == decl.name) {
            Some(existing) => *existing = decl,
            None => self.declarations.push(decl),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Declaration> {
        let pos = self
            .declarations
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))?;
        Some(self.declarations.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl ToCss for DeclarationBlock {
    fn to_css(&self, buf: &mut String) {
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            decl.to_css(buf);
            buf.push(';');
        }
    }
}

/// Parse declarations until the input is exhausted.
pub(super) fn parse_declaration_list<'i>(
    input: &mut Parser<'i, '_>,
    declarations: &mut Vec<Declaration>,
) {
    let mut decl_parser = DeclarationListParser { declarations };
    for result in RuleBodyParser::new(input, &mut decl_parser) {
        // Ignore errors - lenient parsing
        let _ = result;
    }
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let (value, important) = split_important(input.slice_from(start));
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        self.declarations
            .push(Declaration::new(&name, value, important));
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_keeps_order_and_raw_values() {
        let block = DeclarationBlock::parse_inline("color: red; margin: 0 auto;font-family: \"A B\", serif");
        let names: Vec<_> = block.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["color", "margin", "font-family"]);
        assert_eq!(block.get("margin"), Some("0 auto"));
        assert_eq!(block.get("font-family"), Some("\"A B\", serif"));
    }

    #[test]
    fn test_parse_inline_important() {
        let block = DeclarationBlock::parse_inline("color: red !important; width: 10px");
        let color = block.iter().next().unwrap();
        assert!(color.important);
        assert_eq!(color.value, "red");
        assert_eq!(block.to_css_string(), "color: red !important; width: 10px;");
    }

    #[test]
    fn test_parse_inline_skips_garbage() {
        let block = DeclarationBlock::parse_inline("not css; color: blue; : x; width:");
        assert_eq!(block.len(), 1);
        assert_eq!(block.get("color"), Some("blue"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut block = DeclarationBlock::parse_inline("color: red; width: 1px");
        block.set("COLOR", "blue", false);
        block.set("height", "2px", false);
        assert_eq!(block.to_css_string(), "color: blue; width: 1px; height: 2px;");
    }

    #[test]
    fn test_remove() {
        let mut block = DeclarationBlock::parse_inline("color: red; width: 1px");
        let removed = block.remove("color").unwrap();
        assert_eq!(removed.value, "red");
        assert!(block.remove("color").is_none());
        assert_eq!(block.to_css_string(), "width: 1px;");
    }

    #[test]
    fn test_split_important() {
        assert_eq!(split_important("red !important"), ("red", true));
        assert_eq!(split_important("red ! IMPORTANT "), ("red", true));
        assert_eq!(split_important("red"), ("red", false));
        assert_eq!(split_important("url(a!b)"), ("url(a!b)", false));
    }
}
