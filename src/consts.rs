//! Record type tags and text type constants for the PowerPoint binary format.

/// Record types relevant to text handling, as found in the
/// "PowerPoint Document" stream.
///
/// The numeric values are the `recType` tags from the MS-PPT specification.
/// Anything outside this closed set is carried through as [`Unknown`]
/// (misc InteractiveInfo, TxInteractiveInfo and other records may sit
/// between text records and must survive a rewrite byte-exactly).
///
/// [`Unknown`]: RecordType::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// References another block's paragraphs by index instead of owning text
    OutlineTextRefAtom,
    /// Marks the start of one text block and carries its text type
    TextHeaderAtom,
    /// Text stored as UTF-16LE code units
    TextCharsAtom,
    /// Paragraph and character style spans for the preceding text
    StyleTextPropAtom,
    /// Indentation rules inherited from the master
    MasterTextPropAtom,
    /// Tab stops and margins for a text block
    TextRulerAtom,
    /// Text stored as single Windows-1252 bytes
    TextBytesAtom,
    /// Auxiliary record tracking the text length, updated on every save
    TextSpecInfoAtom,
    /// Any other record, preserved verbatim
    Unknown,
}

impl RecordType {
    /// The `recType` wire tag for this record type.
    ///
    /// `Unknown` has no tag of its own; raw records remember theirs.
    pub fn type_id(self) -> u16 {
        match self {
            RecordType::OutlineTextRefAtom => 3998,
            RecordType::TextHeaderAtom => 3999,
            RecordType::TextCharsAtom => 4000,
            RecordType::StyleTextPropAtom => 4001,
            RecordType::MasterTextPropAtom => 4002,
            RecordType::TextRulerAtom => 4006,
            RecordType::TextBytesAtom => 4008,
            RecordType::TextSpecInfoAtom => 4010,
            RecordType::Unknown => 0,
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            3998 => RecordType::OutlineTextRefAtom,
            3999 => RecordType::TextHeaderAtom,
            4000 => RecordType::TextCharsAtom,
            4001 => RecordType::StyleTextPropAtom,
            4002 => RecordType::MasterTextPropAtom,
            4006 => RecordType::TextRulerAtom,
            4008 => RecordType::TextBytesAtom,
            4010 => RecordType::TextSpecInfoAtom,
            _ => RecordType::Unknown,
        }
    }
}

/// The kind of text a block holds, from its TextHeaderAtom.
///
/// Values follow the MS-PPT `TextTypeEnum`. The text type feeds the
/// master-style fallback lookup and decides how the `0x0B` vertical-tab
/// control character is rendered externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    /// Title placeholder text
    Title,
    /// Body placeholder text
    Body,
    /// Speaker notes
    Notes,
    /// Any other text, e.g. from a free-standing text box
    Other,
    /// Body text in a centered layout
    CenterBody,
    /// Title text in a centered layout
    CenterTitle,
    /// Half-slide body text
    HalfBody,
    /// Quarter-slide body text
    QuarterBody,
    /// A type tag this library does not know; kept verbatim
    Unrecognized(u32),
}

impl TextType {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => TextType::Title,
            1 => TextType::Body,
            2 => TextType::Notes,
            4 => TextType::Other,
            5 => TextType::CenterBody,
            6 => TextType::CenterTitle,
            7 => TextType::HalfBody,
            8 => TextType::QuarterBody,
            other => TextType::Unrecognized(other),
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            TextType::Title => 0,
            TextType::Body => 1,
            TextType::Notes => 2,
            TextType::Other => 4,
            TextType::CenterBody => 5,
            TextType::CenterTitle => 6,
            TextType::HalfBody => 7,
            TextType::QuarterBody => 8,
            TextType::Unrecognized(other) => other,
        }
    }

    /// Whether a `0x0B` control character acts as a line break for this
    /// text type. In titles it behaves like a carriage return, everywhere
    /// else like a blank.
    pub fn vertical_tab_breaks(self) -> bool {
        matches!(self, TextType::Title | TextType::CenterTitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_conversion() {
        assert_eq!(RecordType::from(3999), RecordType::TextHeaderAtom);
        assert_eq!(RecordType::from(4000), RecordType::TextCharsAtom);
        assert_eq!(RecordType::from(4008), RecordType::TextBytesAtom);
        assert_eq!(RecordType::from(4001), RecordType::StyleTextPropAtom);
        assert_eq!(RecordType::from(999), RecordType::Unknown);
    }

    #[test]
    fn test_record_type_round_trip() {
        for tag in [3998u16, 3999, 4000, 4001, 4002, 4006, 4008, 4010] {
            assert_eq!(RecordType::from(tag).type_id(), tag);
        }
    }

    #[test]
    fn test_text_type_round_trip() {
        for raw in 0..10u32 {
            assert_eq!(TextType::from_raw(raw).as_raw(), raw);
        }
    }

    #[test]
    fn test_vertical_tab_handling() {
        assert!(TextType::Title.vertical_tab_breaks());
        assert!(TextType::CenterTitle.vertical_tab_breaks());
        assert!(!TextType::Body.vertical_tab_breaks());
        assert!(!TextType::Notes.vertical_tab_breaks());
        assert!(!TextType::Unrecognized(3).vertical_tab_breaks());
    }
}
