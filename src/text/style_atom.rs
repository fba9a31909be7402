//! The style atom: paragraph and character span streams for one text block.
use crate::error::Result;
use crate::text::prop::{PropKind, TextPropCollection};

/// In-memory form of a StyleTextPropAtom payload.
///
/// The payload cannot be parsed in isolation: span boundaries are only
/// meaningful against the length of the text the atom belongs to, so the
/// raw bytes stay in the record tree and this type is materialized on
/// demand by the parser and rebuilt from scratch by the serializer.
#[derive(Debug, Clone)]
pub struct StyleTextPropAtom {
    paragraph_styles: Vec<TextPropCollection>,
    character_styles: Vec<TextPropCollection>,
}

impl StyleTextPropAtom {
    /// An atom with no spans; the serializer starts from this.
    pub fn empty() -> Self {
        Self {
            paragraph_styles: Vec::new(),
            character_styles: Vec::new(),
        }
    }

    /// The stand-in for a missing styles record: one paragraph span and one
    /// character span, each covering the whole text (or one character when
    /// the length is unknown), with no properties set. The next save
    /// regenerates real spans and splices the record into the tree.
    pub fn synthesize(text_len: usize) -> Self {
        let covered = text_len.max(1) as u32;
        Self {
            paragraph_styles: vec![TextPropCollection::new(covered, PropKind::Paragraph)],
            character_styles: vec![TextPropCollection::new(covered, PropKind::Character)],
        }
    }

    /// Parse a StyleTextPropAtom payload against the owning block's text
    /// length. Both streams are read greedily until they cover the text
    /// plus the trailing terminator character.
    pub fn parse(data: &[u8], text_len: usize) -> Result<Self> {
        let target = text_len as u32 + 1;
        let mut offset = 0;

        let mut paragraph_styles = Vec::new();
        let mut covered = 0u32;
        while covered < target && offset < data.len() {
            let span = TextPropCollection::parse(data, &mut offset, PropKind::Paragraph)?;
            if span.characters_covered() == 0 {
                break;
            }
            covered += span.characters_covered();
            paragraph_styles.push(span);
        }

        let mut character_styles = Vec::new();
        covered = 0;
        while covered < target && offset < data.len() {
            let span = TextPropCollection::parse(data, &mut offset, PropKind::Character)?;
            if span.characters_covered() == 0 {
                break;
            }
            covered += span.characters_covered();
            character_styles.push(span);
        }

        Ok(Self {
            paragraph_styles,
            character_styles,
        })
    }

    /// Write both streams back into payload form.
    pub fn write_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for span in &self.paragraph_styles {
            span.write(&mut out);
        }
        for span in &self.character_styles {
            span.write(&mut out);
        }
        out
    }

    pub fn paragraph_styles(&self) -> &[TextPropCollection] {
        &self.paragraph_styles
    }

    pub fn character_styles(&self) -> &[TextPropCollection] {
        &self.character_styles
    }

    pub fn paragraph_styles_mut(&mut self) -> &mut [TextPropCollection] {
        &mut self.paragraph_styles
    }

    pub fn character_styles_mut(&mut self) -> &mut [TextPropCollection] {
        &mut self.character_styles
    }

    /// Drop all spans, ahead of regeneration.
    pub fn clear_styles(&mut self) {
        self.paragraph_styles.clear();
        self.character_styles.clear();
    }

    /// Append a paragraph span covering `characters_covered` characters and
    /// return its index.
    pub fn add_paragraph_collection(&mut self, characters_covered: u32) -> usize {
        self.paragraph_styles
            .push(TextPropCollection::new(characters_covered, PropKind::Paragraph));
        self.paragraph_styles.len() - 1
    }

    /// Append a character span covering `characters_covered` characters and
    /// return its index.
    pub fn add_character_collection(&mut self, characters_covered: u32) -> usize {
        self.character_styles
            .push(TextPropCollection::new(characters_covered, PropKind::Character));
        self.character_styles.len() - 1
    }

    /// Total coverage of the paragraph stream.
    pub fn paragraph_coverage(&self) -> u32 {
        self.paragraph_styles
            .iter()
            .map(TextPropCollection::characters_covered)
            .sum()
    }

    /// Total coverage of the character stream.
    pub fn character_coverage(&self) -> u32 {
        self.character_styles
            .iter()
            .map(TextPropCollection::characters_covered)
            .sum()
    }
}
