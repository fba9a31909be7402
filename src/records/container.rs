//! The host container for one shape's text records.
use crate::consts::RecordType;
use crate::error::Result;
use crate::records::record::Record;
use std::ops::Range;

/// An owned, ordered list of text records belonging to one textbox shape,
/// together with the cached flattened byte form the drawing layer reads.
///
/// The container is the only thing the serializer mutates: records are
/// swapped and spliced in place, then [`write_through`] refreshes the
/// cache so the host tree sees the new children. The serializer is the
/// single writer; nothing else touches the children behind its back.
///
/// [`write_through`]: TextboxRecords::write_through
#[derive(Debug, Clone)]
pub struct TextboxRecords {
    shape_id: i32,
    children: Vec<Record>,
    cached: Vec<u8>,
}

impl TextboxRecords {
    /// Parse a container from the flattened byte form.
    pub fn from_bytes(data: &[u8], shape_id: i32) -> Result<Self> {
        Ok(Self {
            shape_id,
            children: Record::parse_all(data)?,
            cached: data.to_vec(),
        })
    }

    /// An empty container for a newly created text shape.
    pub fn new_empty(shape_id: i32) -> Self {
        Self {
            shape_id,
            children: Vec::new(),
            cached: Vec::new(),
        }
    }

    pub fn shape_id(&self) -> i32 {
        self.shape_id
    }

    pub fn children(&self) -> &[Record] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Record] {
        &mut self.children
    }

    /// Append a record at the end of the child list.
    pub fn append_child(&mut self, record: Record) {
        self.children.push(record);
    }

    /// Insert a record immediately after the child at `after`, preserving
    /// the order of all other siblings. Returns the new record's index.
    pub fn add_child_after(&mut self, record: Record, after: usize) -> usize {
        debug_assert!(after < self.children.len());
        self.children.insert(after + 1, record);
        after + 1
    }

    /// Swap out the child at `index`.
    pub fn replace_child(&mut self, index: usize, record: Record) {
        self.children[index] = record;
    }

    /// Index of the first child of the given type.
    pub fn find_first_of_type(&self, record_type: RecordType) -> Option<usize> {
        self.children
            .iter()
            .position(|r| r.record_type() == record_type)
    }

    /// The child index range of the `ordinal`-th text block: from its
    /// header record up to (not including) the next header or the end of
    /// the child list.
    pub fn block_span(&self, ordinal: usize) -> Option<Range<usize>> {
        let mut headers = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, r)| r.record_type() == RecordType::TextHeaderAtom)
            .map(|(i, _)| i)
            .skip(ordinal);
        let start = headers.next()?;
        let end = headers.next().unwrap_or(self.children.len());
        Some(start..end)
    }

    /// Re-encode the children into the cached byte form. Any failure here
    /// aborts the save that requested it; there is no partial rewrite.
    pub fn write_through(&mut self) -> Result<()> {
        let mut out = Vec::with_capacity(self.cached.len());
        for record in &self.children {
            record.write(&mut out)?;
        }
        self.cached = out;
        Ok(())
    }

    /// The flattened byte form as of the last parse or write-through.
    pub fn cached_bytes(&self) -> &[u8] {
        &self.cached
    }
}
