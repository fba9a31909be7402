//! Collaborator traits for master-style fallback and sheet-level lookup.
//!
//! Both traits are implemented by the host document model, outside this
//! crate. The text engine only consumes them: a paragraph or run with an
//! absent property asks the master provider, and an outline-reference
//! block borrows paragraphs from the sheet instead of owning text.
use crate::consts::TextType;
use crate::text::paragraph::TextBlock;

/// Hierarchical master-style lookup, keyed by the block's text type, the
/// paragraph's indentation level and the property name.
pub trait MasterStyles {
    /// The master's value for a property, or `None` when the master chain
    /// has no opinion either.
    fn style_attribute(
        &self,
        text_type: TextType,
        indent_level: i16,
        name: &str,
        is_character: bool,
    ) -> Option<i32>;
}

/// Sheet-level access to already parsed text blocks, used to resolve
/// outline-reference containers by index instead of re-parsing.
pub trait SheetText {
    fn text_blocks(&self) -> &[TextBlock];
}
