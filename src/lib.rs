//! Longan - A Rust library for the text records of legacy PowerPoint files
//!
//! This library reads, mutates and re-serializes the text and styling
//! records found in the "PowerPoint Document" stream of legacy binary
//! presentations (.ppt). Its core is the paragraph reconstruction engine:
//! a flat sequence of typed records is rebuilt into a paragraph/run model
//! carrying inherited styling, and an edited model is written back into a
//! byte-compatible record sequence with text, per-character styling,
//! per-paragraph styling and auxiliary length records kept consistent.
//!
//! # Features
//!
//! - **Record layer**: parse and rewrite the closed set of text-relevant
//!   record types, carrying foreign sibling records through verbatim
//! - **Paragraph model**: paragraphs and style runs with proportional
//!   distribution of pre-existing style spans
//! - **Editing**: append and overwrite text while styles, encodings and
//!   length records stay in sync
//! - **Master fallback**: absent properties resolve against a caller
//!   supplied master-style provider
//!
//! # Example - Reading text from a textbox record stream
//!
//! ```rust,no_run
//! use longan::records::TextboxRecords;
//! use longan::text::find_text_blocks;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let data: Vec<u8> = Vec::new();
//! let container = TextboxRecords::from_bytes(&data, 1)?;
//! for block in find_text_blocks(container.children(), false)? {
//!     println!("{}", block.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Editing text
//!
//! ```rust,no_run
//! use longan::consts::TextType;
//! use longan::text::create_empty_block;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut container, mut block) = create_empty_block(TextType::Other);
//! block.set_text(&mut container, "Hello\nWorld")?;
//! assert_eq!(block.paragraphs().len(), 2);
//! // the container's cached byte form now reflects the edit
//! let _bytes = container.cached_bytes();
//! # Ok(())
//! # }
//! ```
//!
//! Record container I/O (the OLE2 compound file, the drawing layer),
//! encryption and the wider document model are out of scope; they are
//! consumed through the narrow collaborator interfaces in
//! [`text::master`].
pub mod binary;
pub mod consts;
pub mod error;
pub mod records;
pub mod text;

pub use consts::{RecordType, TextType};
pub use error::{Error, Result};
pub use records::{Record, RecordBody, TextboxRecords};
pub use text::{TextBlock, TextParagraph, TextPropCollection, TextRun};
