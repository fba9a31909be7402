//! Text property definitions and style-span collections.
//!
//! A [`TextPropCollection`] is one style span: a set of named properties
//! applying to a run of characters. The StyleTextPropAtom of a text block
//! carries one ordered stream of paragraph spans and one of character
//! spans; together they must cover the block's text plus one terminator
//! character.
use crate::binary::{read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use crate::error::{Error, Result};
use bitflags::bitflags;
use phf::phf_map;

/// Name of the paragraph-level bitmask property. When present with value
/// zero it marks every attribute of the paragraph as hard, suppressing
/// master-style fallback.
pub const PARAGRAPH_FLAGS: &str = "paragraph_flags";

/// Name of the character-level bitmask property (bold, italic, ...).
pub const CHAR_FLAGS: &str = "char.flags";

bitflags! {
    /// Sub-bits of the `char.flags` property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CharFlags: u16 {
        const BOLD      = 0x0001;
        const ITALIC    = 0x0002;
        const UNDERLINE = 0x0004;
        const SHADOW    = 0x0010;
        const EMBOSSED  = 0x0100;
    }
}

bitflags! {
    /// Sub-bits of the `paragraph_flags` property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParagraphFlags: u16 {
        const BULLET          = 0x0001;
        const BULLET_HARDFONT = 0x0002;
        const BULLET_HARDCOLOR = 0x0004;
        const BULLET_HARDSIZE = 0x0008;
    }
}

/// Static definition of one text property: its name, its value width on
/// the wire (2 or 4 bytes) and its bit in the span's mask field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPropDef {
    pub name: &'static str,
    pub size: usize,
    pub mask: u32,
}

/// Paragraph property definitions, in wire order. Parsing and writing
/// both walk this table front to back.
pub static PARAGRAPH_PROPS: &[TextPropDef] = &[
    TextPropDef { name: "paragraph_flags", size: 2, mask: 0x0001 },
    TextPropDef { name: "bullet.char", size: 2, mask: 0x0002 },
    TextPropDef { name: "bullet.font", size: 2, mask: 0x0004 },
    TextPropDef { name: "alignment", size: 2, mask: 0x0008 },
    TextPropDef { name: "bullet.size", size: 2, mask: 0x0010 },
    TextPropDef { name: "bullet.color", size: 4, mask: 0x0020 },
    TextPropDef { name: "text.offset", size: 2, mask: 0x0100 },
    TextPropDef { name: "bullet.offset", size: 2, mask: 0x0400 },
    TextPropDef { name: "linespacing", size: 2, mask: 0x1000 },
    TextPropDef { name: "spacebefore", size: 2, mask: 0x2000 },
    TextPropDef { name: "spaceafter", size: 2, mask: 0x4000 },
    TextPropDef { name: "defaultTabSize", size: 2, mask: 0x8000 },
    TextPropDef { name: "textDirection", size: 2, mask: 0x200000 },
];

/// Character property definitions, in wire order.
pub static CHARACTER_PROPS: &[TextPropDef] = &[
    TextPropDef { name: "char.flags", size: 2, mask: 0x0001 },
    TextPropDef { name: "font.index", size: 2, mask: 0x10000 },
    TextPropDef { name: "font.size", size: 2, mask: 0x20000 },
    TextPropDef { name: "font.color", size: 4, mask: 0x40000 },
    TextPropDef { name: "superscript", size: 2, mask: 0x80000 },
    TextPropDef { name: "asian.font.index", size: 2, mask: 0x200000 },
    TextPropDef { name: "ansi.font.index", size: 2, mask: 0x400000 },
    TextPropDef { name: "symbol.font.index", size: 2, mask: 0x800000 },
];

static PARAGRAPH_PROP_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "paragraph_flags" => 0,
    "bullet.char" => 1,
    "bullet.font" => 2,
    "alignment" => 3,
    "bullet.size" => 4,
    "bullet.color" => 5,
    "text.offset" => 6,
    "bullet.offset" => 7,
    "linespacing" => 8,
    "spacebefore" => 9,
    "spaceafter" => 10,
    "defaultTabSize" => 11,
    "textDirection" => 12,
};

static CHARACTER_PROP_INDEX: phf::Map<&'static str, usize> = phf_map! {
    "char.flags" => 0,
    "font.index" => 1,
    "font.size" => 2,
    "font.color" => 3,
    "superscript" => 4,
    "asian.font.index" => 5,
    "ansi.font.index" => 6,
    "symbol.font.index" => 7,
};

/// A text property instance: a static definition plus its value.
#[derive(Debug, Clone)]
pub struct TextProp {
    def: &'static TextPropDef,
    value: i32,
}

impl TextProp {
    fn new(def: &'static TextPropDef) -> Self {
        Self { def, value: 0 }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn size(&self) -> usize {
        self.def.size
    }

    pub fn mask(&self) -> u32 {
        self.def.mask
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
    }
}

impl PartialEq for TextProp {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name && self.value == other.value
    }
}

impl Eq for TextProp {}

/// Whether a collection holds paragraph-level or character-level spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Paragraph,
    Character,
}

impl PropKind {
    fn defs(self) -> &'static [TextPropDef] {
        match self {
            PropKind::Paragraph => PARAGRAPH_PROPS,
            PropKind::Character => CHARACTER_PROPS,
        }
    }

    fn index(self) -> &'static phf::Map<&'static str, usize> {
        match self {
            PropKind::Paragraph => &PARAGRAPH_PROP_INDEX,
            PropKind::Character => &CHARACTER_PROP_INDEX,
        }
    }
}

/// One style span: a set of named properties covering a run of characters.
///
/// Spans are ordered within their stream; the order defines which
/// characters they cover, left to right. The sum of `characters_covered`
/// over a stream equals the block's text length plus one terminator.
#[derive(Debug, Clone)]
pub struct TextPropCollection {
    characters_covered: u32,
    indent_level: i16,
    props: Vec<TextProp>,
    kind: PropKind,
}

impl TextPropCollection {
    pub fn new(characters_covered: u32, kind: PropKind) -> Self {
        Self {
            characters_covered,
            indent_level: -1,
            props: Vec::new(),
            kind,
        }
    }

    pub fn kind(&self) -> PropKind {
        self.kind
    }

    pub fn characters_covered(&self) -> u32 {
        self.characters_covered
    }

    /// Set the number of characters this span covers. Recomputing coverage
    /// after a text edit is the caller's job; the collection never tracks
    /// text by itself.
    pub fn update_text_size(&mut self, characters_covered: u32) {
        self.characters_covered = characters_covered;
    }

    /// Indent level of a paragraph span, -1 if not set.
    pub fn indent_level(&self) -> i16 {
        self.indent_level
    }

    pub fn set_indent_level(&mut self, level: i16) {
        self.indent_level = level;
    }

    pub fn props(&self) -> &[TextProp] {
        &self.props
    }

    /// Find a property by name. Absence means absence; defaults are the
    /// master-style resolver's concern.
    pub fn find_by_name(&self, name: &str) -> Option<&TextProp> {
        self.props.iter().find(|p| p.name() == name)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut TextProp> {
        self.props.iter_mut().find(|p| p.name() == name)
    }

    /// Get a property value by name.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.find_by_name(name).map(|p| p.value())
    }

    /// Fetch the named property, adding it with a zero value if absent.
    pub fn add_with_name(&mut self, name: &str) -> Result<&mut TextProp> {
        if let Some(pos) = self.props.iter().position(|p| p.name() == name) {
            return Ok(&mut self.props[pos]);
        }
        let idx = self.kind.index().get(name).ok_or_else(|| {
            Error::InvalidFormat(format!("unknown text property name: {name}"))
        })?;
        self.props.push(TextProp::new(&self.kind.defs()[*idx]));
        let last = self.props.len() - 1;
        Ok(&mut self.props[last])
    }

    /// Set a property value, adding the property if needed.
    pub fn set_value(&mut self, name: &str, value: i32) -> Result<()> {
        self.add_with_name(name)?.set_value(value);
        Ok(())
    }

    /// Replace this collection's content with a copy of `other`. Both
    /// collections must be of the same kind.
    pub fn copy_from(&mut self, other: &TextPropCollection) {
        debug_assert_eq!(self.kind, other.kind);
        self.characters_covered = other.characters_covered;
        self.indent_level = other.indent_level;
        self.props = other.props.clone();
    }

    /// Structural style equality: same kind, same indent level and the
    /// same property values, regardless of how many characters either
    /// span covers. This is the serializer's merge criterion.
    pub fn same_style(&self, other: &TextPropCollection) -> bool {
        if self.kind != other.kind
            || self.indent_level != other.indent_level
            || self.props.len() != other.props.len()
        {
            return false;
        }
        self.props.iter().all(|p| {
            other
                .find_by_name(p.name())
                .is_some_and(|o| o.value() == p.value())
        })
    }

    /// Parse one span from a StyleTextPropAtom payload, advancing `offset`.
    pub fn parse(data: &[u8], offset: &mut usize, kind: PropKind) -> Result<Self> {
        let characters_covered = read_u32_le(data, *offset)?;
        *offset += 4;

        let mut collection = Self::new(characters_covered, kind);
        if kind == PropKind::Paragraph {
            collection.indent_level = read_i16_le(data, *offset)?;
            *offset += 2;
        }

        let mask = read_u32_le(data, *offset)?;
        *offset += 4;

        for def in kind.defs() {
            if mask & def.mask == 0 {
                continue;
            }
            let value = match def.size {
                2 => read_u16_le(data, *offset)? as i32,
                4 => read_i32_le(data, *offset)?,
                _ => 0,
            };
            let mut prop = TextProp::new(def);
            prop.set_value(value);
            collection.props.push(prop);
            *offset += def.size;
        }

        Ok(collection)
    }

    /// Write this span in wire form. Values are emitted in table order so
    /// a parse of the output always yields an equal collection.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.characters_covered.to_le_bytes());
        if self.kind == PropKind::Paragraph {
            out.extend_from_slice(&self.indent_level.to_le_bytes());
        }

        let mask = self.props.iter().fold(0u32, |m, p| m | p.mask());
        out.extend_from_slice(&mask.to_le_bytes());

        for def in self.kind.defs() {
            let Some(prop) = self.find_by_name(def.name) else {
                continue;
            };
            match def.size {
                2 => out.extend_from_slice(&(prop.value() as u16).to_le_bytes()),
                4 => out.extend_from_slice(&prop.value().to_le_bytes()),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_with_name() {
        let mut collection = TextPropCollection::new(10, PropKind::Character);
        collection.set_value("font.size", 24).unwrap();
        assert_eq!(collection.value_of("font.size"), Some(24));
        assert_eq!(collection.value_of("font.color"), None);

        // fetching again must not duplicate
        collection.set_value("font.size", 32).unwrap();
        assert_eq!(collection.props().len(), 1);
        assert_eq!(collection.value_of("font.size"), Some(32));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let mut collection = TextPropCollection::new(1, PropKind::Paragraph);
        assert!(collection.add_with_name("no.such.prop").is_err());
        // character-only names are not valid on paragraph spans
        assert!(collection.add_with_name("font.size").is_err());
    }

    #[test]
    fn test_same_style_ignores_coverage() {
        let mut a = TextPropCollection::new(3, PropKind::Character);
        a.set_value("char.flags", CharFlags::BOLD.bits() as i32).unwrap();
        let mut b = TextPropCollection::new(99, PropKind::Character);
        b.set_value("char.flags", CharFlags::BOLD.bits() as i32).unwrap();
        assert!(a.same_style(&b));

        b.set_value("font.size", 18).unwrap();
        assert!(!a.same_style(&b));
    }

    #[test]
    fn test_same_style_checks_indent() {
        let a = TextPropCollection::new(3, PropKind::Paragraph);
        let mut b = TextPropCollection::new(3, PropKind::Paragraph);
        assert!(a.same_style(&b));
        b.set_indent_level(2);
        assert!(!a.same_style(&b));
    }

    #[test]
    fn test_wire_round_trip_paragraph() {
        let mut span = TextPropCollection::new(12, PropKind::Paragraph);
        span.set_indent_level(1);
        span.set_value("alignment", 2).unwrap();
        span.set_value("spacebefore", 150).unwrap();
        span.set_value("bullet.color", 0x00FF_00FF).unwrap();

        let mut out = Vec::new();
        span.write(&mut out);

        let mut offset = 0;
        let parsed = TextPropCollection::parse(&out, &mut offset, PropKind::Paragraph).unwrap();
        assert_eq!(offset, out.len());
        assert_eq!(parsed.characters_covered(), 12);
        assert_eq!(parsed.indent_level(), 1);
        assert!(parsed.same_style(&span));
    }

    #[test]
    fn test_wire_round_trip_character() {
        let mut span = TextPropCollection::new(7, PropKind::Character);
        span.set_value("char.flags", 0x0005).unwrap();
        span.set_value("font.index", 3).unwrap();
        span.set_value("font.color", 0x0012_3456).unwrap();

        let mut out = Vec::new();
        span.write(&mut out);

        let mut offset = 0;
        let parsed = TextPropCollection::parse(&out, &mut offset, PropKind::Character).unwrap();
        assert_eq!(offset, out.len());
        assert_eq!(parsed.characters_covered(), 7);
        assert!(parsed.same_style(&span));
    }

    #[test]
    fn test_parse_truncated_span() {
        let mut span = TextPropCollection::new(4, PropKind::Character);
        span.set_value("font.size", 44).unwrap();
        let mut out = Vec::new();
        span.write(&mut out);
        out.truncate(out.len() - 1);

        let mut offset = 0;
        assert!(TextPropCollection::parse(&out, &mut offset, PropKind::Character).is_err());
    }
}
