//! Text engine: the paragraph/run model, the record parser and the
//! serializer that writes edits back into the host record tree.
//!
//! # Data flow
//!
//! Raw records are grouped per text header and reconstructed into
//! [`TextBlock`]s by [`find_text_blocks`]; edits happen on the block's
//! paragraphs and runs; [`store_text`] (or [`TextBlock::save`]) writes the
//! block back, regenerating text storage, style spans and auxiliary
//! length records in one pass.
pub mod master;
pub mod paragraph;
pub mod parser;
pub mod prop;
pub mod store;
pub mod style_atom;

/// Integration tests for the parse/edit/serialize cycle
#[cfg(test)]
mod tests;

pub use master::{MasterStyles, SheetText};
pub use paragraph::{
    TextAlign, TextBlock, TextParagraph, TextRun, to_external_string, to_internal_string,
};
pub use parser::{ContainerText, find_text_blocks, resolve_container, resolve_outline_reference};
pub use prop::{
    CHAR_FLAGS, CHARACTER_PROPS, CharFlags, PARAGRAPH_FLAGS, PARAGRAPH_PROPS, ParagraphFlags,
    PropKind, TextProp, TextPropCollection, TextPropDef,
};
pub use store::{append_text, create_empty_block, set_text, store_text};
pub use style_atom::StyleTextPropAtom;
