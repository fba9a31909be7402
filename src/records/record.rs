//! Typed binary records for the text portion of a presentation stream.
//!
//! A record is 8 bytes of header (version/instance, type tag, payload
//! length, all little-endian) followed by its payload. Only the record
//! kinds relevant to text are given typed payloads; everything else is
//! kept as raw bytes so a rewrite reproduces foreign siblings exactly.
use crate::binary::{
    decode_utf16le, decode_windows1252, encode_utf16le, read_i32_le, read_u16_le, read_u32_le,
};
use crate::consts::{RecordType, TextType};
use crate::error::{Error, Result};
use bytes::Bytes;
use std::io::{self, Write};

/// Text stored as single Windows-1252 bytes.
#[derive(Debug, Clone, Default)]
pub struct TextBytesAtom {
    data: Bytes,
}

impl TextBytesAtom {
    pub fn from_payload(data: Bytes) -> Self {
        Self { data }
    }

    /// Build a bytes atom from already narrow-encodable text.
    pub fn from_encoded(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }

    pub fn text(&self) -> String {
        decode_windows1252(&self.data)
    }

    pub fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// Text stored as UTF-16LE code units.
#[derive(Debug, Clone, Default)]
pub struct TextCharsAtom {
    data: Bytes,
}

impl TextCharsAtom {
    pub fn from_payload(data: Bytes) -> Self {
        Self { data }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            data: encode_utf16le(text).into(),
        }
    }

    pub fn text(&self) -> String {
        decode_utf16le(&self.data)
    }

    pub fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// One indentation rule from a MasterTextPropAtom: an indent level applied
/// to a run of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentProp {
    pub characters_covered: u32,
    pub indent_level: u16,
}

/// Indentation rules inherited from the master, six bytes per entry.
#[derive(Debug, Clone, Default)]
pub struct MasterTextPropAtom {
    entries: Vec<IndentProp>,
}

impl MasterTextPropAtom {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() % 6 != 0 {
            return Err(Error::Corrupted(
                "MasterTextPropAtom payload is not a multiple of 6 bytes".to_string(),
            ));
        }
        let mut entries = Vec::with_capacity(data.len() / 6);
        let mut offset = 0;
        while offset < data.len() {
            entries.push(IndentProp {
                characters_covered: read_u32_le(data, offset)?,
                indent_level: read_u16_le(data, offset + 4)?,
            });
            offset += 6;
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[IndentProp] {
        &self.entries
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 6);
        for entry in &self.entries {
            out.extend_from_slice(&entry.characters_covered.to_le_bytes());
            out.extend_from_slice(&entry.indent_level.to_le_bytes());
        }
        out
    }
}

/// Auxiliary record tracking the text length. Stale sizes here corrupt the
/// deck, so every save rewrites the leading count field.
#[derive(Debug, Clone)]
pub struct TextSpecInfoAtom {
    data: Vec<u8>,
}

impl TextSpecInfoAtom {
    pub fn from_payload(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Update the tracked size to the owning block's text length plus the
    /// terminator character.
    pub fn set_parent_size(&mut self, size: u32) {
        if self.data.len() < 4 {
            self.data.resize(4, 0);
        }
        self.data[0..4].copy_from_slice(&size.to_le_bytes());
    }

    pub fn parent_size(&self) -> Option<u32> {
        read_u32_le(&self.data, 0).ok()
    }

    pub fn payload(&self) -> &[u8] {
        &self.data
    }
}

/// Parsed payload of one record.
#[derive(Debug, Clone)]
pub enum RecordBody {
    /// Marks the start of one text block and carries its text type
    TextHeader { text_type: TextType },
    TextBytes(TextBytesAtom),
    TextChars(TextCharsAtom),
    /// Style spans, kept raw: the payload only parses against the text
    /// length of its block, which a record does not know by itself
    StyleTextProp { data: Bytes },
    MasterTextProp(MasterTextPropAtom),
    TextRuler { data: Bytes },
    TextSpecInfo(TextSpecInfoAtom),
    OutlineTextRef { text_index: i32 },
    /// Anything else, preserved verbatim
    Unknown { raw_type: u16, data: Bytes },
}

/// A record with its header fields and typed payload.
#[derive(Debug, Clone)]
pub struct Record {
    /// Record version (low 4 bits of the first header word)
    pub version: u16,
    /// Record instance (high 12 bits of the first header word)
    pub instance: u16,
    /// Typed payload
    pub body: RecordBody,
}

impl Record {
    /// A record with default header fields, as used for records created in
    /// memory during a save.
    pub fn new(body: RecordBody) -> Self {
        Self {
            version: 0,
            instance: 0,
            body,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match &self.body {
            RecordBody::TextHeader { .. } => RecordType::TextHeaderAtom,
            RecordBody::TextBytes(_) => RecordType::TextBytesAtom,
            RecordBody::TextChars(_) => RecordType::TextCharsAtom,
            RecordBody::StyleTextProp { .. } => RecordType::StyleTextPropAtom,
            RecordBody::MasterTextProp(_) => RecordType::MasterTextPropAtom,
            RecordBody::TextRuler { .. } => RecordType::TextRulerAtom,
            RecordBody::TextSpecInfo(_) => RecordType::TextSpecInfoAtom,
            RecordBody::OutlineTextRef { .. } => RecordType::OutlineTextRefAtom,
            RecordBody::Unknown { .. } => RecordType::Unknown,
        }
    }

    /// Whether this record is a text storage record, in either encoding.
    pub fn is_text_storage(&self) -> bool {
        matches!(
            self.body,
            RecordBody::TextBytes(_) | RecordBody::TextChars(_)
        )
    }

    /// Parse a record from binary data at the given offset.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn parse(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        if offset + 8 > data.len() {
            return Err(Error::Corrupted(
                "Not enough data for record header".to_string(),
            ));
        }

        let version_instance = read_u16_le(data, offset)?;
        let version = version_instance & 0x000F;
        let instance = version_instance >> 4;
        let raw_type = read_u16_le(data, offset + 2)?;
        let data_length = read_u32_le(data, offset + 4)? as usize;

        if offset + 8 + data_length > data.len() {
            return Err(Error::Corrupted(format!(
                "record {raw_type} claims {data_length} payload bytes beyond data bounds"
            )));
        }
        let payload = &data[offset + 8..offset + 8 + data_length];

        let body = match RecordType::from(raw_type) {
            RecordType::TextHeaderAtom => RecordBody::TextHeader {
                text_type: TextType::from_raw(read_u32_le(payload, 0)?),
            },
            RecordType::TextBytesAtom => {
                RecordBody::TextBytes(TextBytesAtom::from_payload(Bytes::copy_from_slice(payload)))
            }
            RecordType::TextCharsAtom => {
                RecordBody::TextChars(TextCharsAtom::from_payload(Bytes::copy_from_slice(payload)))
            }
            RecordType::StyleTextPropAtom => RecordBody::StyleTextProp {
                data: Bytes::copy_from_slice(payload),
            },
            RecordType::MasterTextPropAtom => {
                RecordBody::MasterTextProp(MasterTextPropAtom::parse(payload)?)
            }
            RecordType::TextRulerAtom => RecordBody::TextRuler {
                data: Bytes::copy_from_slice(payload),
            },
            RecordType::TextSpecInfoAtom => {
                RecordBody::TextSpecInfo(TextSpecInfoAtom::from_payload(payload))
            }
            RecordType::OutlineTextRefAtom => RecordBody::OutlineTextRef {
                text_index: read_i32_le(payload, 0)?,
            },
            RecordType::Unknown => RecordBody::Unknown {
                raw_type,
                data: Bytes::copy_from_slice(payload),
            },
        };

        Ok((
            Self {
                version,
                instance,
                body,
            },
            8 + data_length,
        ))
    }

    /// Parse a flat sequence of records until the data is exhausted.
    pub fn parse_all(data: &[u8]) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let (record, consumed) = Record::parse(data, offset)?;
            records.push(record);
            offset += consumed;
        }
        Ok(records)
    }

    fn payload(&self) -> Vec<u8> {
        match &self.body {
            RecordBody::TextHeader { text_type } => text_type.as_raw().to_le_bytes().to_vec(),
            RecordBody::TextBytes(atom) => atom.payload().to_vec(),
            RecordBody::TextChars(atom) => atom.payload().to_vec(),
            RecordBody::StyleTextProp { data } => data.to_vec(),
            RecordBody::MasterTextProp(atom) => atom.payload(),
            RecordBody::TextRuler { data } => data.to_vec(),
            RecordBody::TextSpecInfo(atom) => atom.payload().to_vec(),
            RecordBody::OutlineTextRef { text_index } => text_index.to_le_bytes().to_vec(),
            RecordBody::Unknown { data, .. } => data.to_vec(),
        }
    }

    /// The `recType` tag this record serializes with.
    pub fn type_id(&self) -> u16 {
        match &self.body {
            RecordBody::Unknown { raw_type, .. } => *raw_type,
            _ => self.record_type().type_id(),
        }
    }

    /// Write the record, header and payload, to the given writer.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let payload = self.payload();
        let version_instance = ((self.instance & 0x0FFF) << 4) | (self.version & 0x000F);
        w.write_all(&version_instance.to_le_bytes())?;
        w.write_all(&self.type_id().to_le_bytes())?;
        w.write_all(&(payload.len() as u32).to_le_bytes())?;
        w.write_all(&payload)
    }
}
