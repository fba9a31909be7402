//! Binary record layer: typed atoms and the writable host container.
pub mod container;
pub mod record;

pub use container::TextboxRecords;
pub use record::{
    IndentProp, MasterTextPropAtom, Record, RecordBody, TextBytesAtom, TextCharsAtom,
    TextSpecInfoAtom,
};
