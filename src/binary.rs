//! Little-endian primitives and text codecs for record payloads.
use crate::error::{Error, Result};
use encoding_rs::{UTF_16LE, WINDOWS_1252};
use zerocopy::{FromBytes, I16, I32, LE, U16, U32};

/// Read a little-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(Error::Corrupted("Not enough data for u16".to_string()));
    }
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| Error::Corrupted("Failed to read u16".to_string()))
}

/// Read a little-endian i16 from a byte slice at the given offset.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    if offset + 2 > data.len() {
        return Err(Error::Corrupted("Not enough data for i16".to_string()));
    }
    I16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| Error::Corrupted("Failed to read i16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(Error::Corrupted("Not enough data for u32".to_string()));
    }
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| Error::Corrupted("Failed to read u32".to_string()))
}

/// Read a little-endian i32 from a byte slice at the given offset.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    if offset + 4 > data.len() {
        return Err(Error::Corrupted("Not enough data for i32".to_string()));
    }
    I32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| Error::Corrupted("Failed to read i32".to_string()))
}

/// Decode a TextCharsAtom payload (UTF-16LE code units, no terminator).
/// A leading byte-order mark is text, not framing, and is kept.
pub fn decode_utf16le(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    let (text, _) = UTF_16LE.decode_without_bom_handling(data);
    text.into_owned()
}

/// Encode text into a TextCharsAtom payload.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Decode a TextBytesAtom payload (Windows-1252 bytes).
pub fn decode_windows1252(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(data);
    text.into_owned()
}

/// Encode text into a TextBytesAtom payload, or `None` if any character
/// has no single-byte Windows-1252 form. The caller switches the whole
/// block to wide storage in that case, never a mix.
pub fn encode_windows1252(text: &str) -> Option<Vec<u8>> {
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(text);
    if had_unmappable {
        None
    } else {
        Some(bytes.into_owned())
    }
}
