//! Reconstruction of paragraph/run models from flat record sequences.
//!
//! The scan walks a record list, groups everything between one text header
//! and the next into a block, splits the stored text into paragraphs at
//! `\r` boundaries and distributes the pre-existing style spans across the
//! new runs proportionally to their character counts.
use crate::consts::RecordType;
use crate::error::{Error, Result};
use crate::records::record::{IndentProp, Record, RecordBody};
use crate::records::TextboxRecords;
use crate::text::master::SheetText;
use crate::text::paragraph::{split_after_cr, split_at_char, TextBlock, TextParagraph, TextRun};
use crate::text::prop::{PropKind, TextPropCollection};
use crate::text::style_atom::StyleTextPropAtom;
use bytes::Bytes;
use tracing::{debug, info, warn};

/// Scan a flat record sequence and build one [`TextBlock`] per text
/// header found.
///
/// With `assign_indices` set (slide-list containers), blocks and their
/// paragraphs receive their running position as index; drawing-based
/// blocks keep -1 and are matched by identity instead.
pub fn find_text_blocks(records: &[Record], assign_indices: bool) -> Result<Vec<TextBlock>> {
    let mut blocks = Vec::new();
    let mut pos = 0usize;
    let mut ordinal = 0usize;

    loop {
        let header = records
            .iter()
            .enumerate()
            .skip(pos)
            .find_map(|(i, r)| match r.body {
                RecordBody::TextHeader { text_type } => Some((i, text_type)),
                _ => None,
            });
        let Some((header_pos, text_type)) = header else {
            break;
        };
        let end = records[header_pos + 1..]
            .iter()
            .position(|r| r.record_type() == RecordType::TextHeaderAtom)
            .map(|p| p + header_pos + 1)
            .unwrap_or(records.len());
        let group = &records[header_pos..end];

        let mut byte_text: Option<String> = None;
        let mut char_text: Option<String> = None;
        let mut ruler: Option<Bytes> = None;
        let mut indents: Option<&[IndentProp]> = None;
        for record in &group[1..] {
            match &record.body {
                RecordBody::TextBytes(atom) => byte_text = Some(atom.text()),
                RecordBody::TextChars(atom) => char_text = Some(atom.text()),
                RecordBody::TextRuler { data } => ruler = Some(data.clone()),
                RecordBody::MasterTextProp(atom) => indents = Some(atom.entries()),
                _ => {}
            }
        }

        let raw_text = match (char_text, byte_text) {
            (Some(text), _) => text,
            (None, Some(text)) => text,
            (None, None) => {
                debug!("bytes nor chars atom exists, text record will be created on save");
                String::new()
            }
        };

        let styles = find_style_atom(group, raw_text.chars().count())?;

        let index = if assign_indices { ordinal as i32 } else { -1 };
        let mut paragraphs = Vec::new();
        for segment in split_after_cr(&raw_text) {
            let mut paragraph = TextParagraph::new(text_type);
            paragraph.set_index(index);
            paragraph.set_ruler(ruler.clone());
            paragraph
                .paragraph_style_mut()
                .update_text_size(segment.chars().count() as u32);
            paragraph.add_run(TextRun::with_raw_text(segment.to_string()));
            paragraphs.push(paragraph);
        }

        apply_character_styles(&mut paragraphs, styles.character_styles())?;
        apply_paragraph_styles(&mut paragraphs, styles.paragraph_styles());
        if let Some(indents) = indents {
            apply_paragraph_indents(&mut paragraphs, indents)?;
        }

        blocks.push(TextBlock::new(text_type, index, ordinal, paragraphs));
        ordinal += 1;
        pos = end;
    }

    if blocks.is_empty() {
        debug!("no text records found");
    }
    Ok(blocks)
}

/// Locate the style atom of a block's record group, or synthesize a
/// placeholder to be materialized on the next save.
fn find_style_atom(group: &[Record], text_len: usize) -> Result<StyleTextPropAtom> {
    let mut found = None;
    for record in group {
        if let RecordBody::StyleTextProp { data } = &record.body {
            found = Some(data);
        }
    }
    match found {
        Some(data) => StyleTextPropAtom::parse(data, text_len),
        None => {
            info!("styles atom doesn't exist, synthesizing default spans for later saving");
            Ok(StyleTextPropAtom::synthesize(text_len))
        }
    }
}

/// Distribute character style spans over the runs, splitting a run in two
/// wherever a span boundary falls strictly inside it. The final span
/// absorbs one extra character of coverage for the block terminator.
pub(crate) fn apply_character_styles(
    paragraphs: &mut [TextParagraph],
    char_styles: &[TextPropCollection],
) -> Result<()> {
    let para_count = paragraphs.len();
    let mut para_idx = 0usize;
    let mut run_idx = 0usize;

    for (cs_idx, span) in char_styles.iter().enumerate() {
        let cc_style = span.characters_covered();
        let mut cc_run = 0u32;
        while cc_run < cc_style {
            let paragraph = paragraphs.get_mut(para_idx).ok_or_else(|| {
                Error::MalformedInput(
                    "character style spans cover more characters than the text holds".to_string(),
                )
            })?;
            let len = paragraph.runs()[run_idx].len() as u32;

            if cc_run + len <= cc_style {
                cc_run += len;
            } else {
                // boundary inside the run: split at the exact offset,
                // the just-consumed span styles the first piece
                let keep = (cc_style - cc_run) as usize;
                let text = paragraph.runs()[run_idx].raw_text().to_string();
                let (head, tail) = split_at_char(&text, keep);
                let tail = TextRun::with_raw_text(tail.to_string());
                paragraph.runs_mut()[run_idx].set_raw_text(head.to_string());
                paragraph.runs_mut().insert(run_idx + 1, tail);
                cc_run = cc_style;
            }

            let mut style = TextPropCollection::new(0, PropKind::Character);
            style.copy_from(span);

            let mut styled_len = paragraph.runs()[run_idx].len() as u32;
            if para_idx == para_count - 1 && run_idx == paragraph.runs().len() - 1 {
                if cs_idx < char_styles.len() - 1 {
                    // the text is exhausted but spans remain: they belong
                    // to an empty trailing run
                    paragraph.runs_mut().push(TextRun::with_raw_text(String::new()));
                    if cc_run < cc_style {
                        return Err(Error::MalformedInput(
                            "character style span extends past the end of the text".to_string(),
                        ));
                    }
                } else {
                    // the last span also covers the block terminator
                    styled_len += 1;
                    cc_run += 1;
                }
            }
            style.update_text_size(styled_len);
            paragraph.runs_mut()[run_idx].set_character_style_owned(style);

            run_idx += 1;
            if run_idx == paragraph.runs().len() {
                para_idx += 1;
                run_idx = 0;
            }
        }
    }
    Ok(())
}

/// Distribute paragraph style spans, one paragraph at a time. A
/// paragraph's coverage is the sum of its run lengths, plus one for the
/// terminator on the final paragraph.
///
/// The `cc_para >= cc_style - 1` guard reproduces the historical walk
/// exactly: a span covering a single character ends the distribution
/// without being applied. Files in the wild rely on the resulting
/// styles, so the guard stays as is.
pub(crate) fn apply_paragraph_styles(
    paragraphs: &mut [TextParagraph],
    para_styles: &[TextPropCollection],
) {
    let para_count = paragraphs.len();
    let mut para_idx = 0usize;
    for span in para_styles {
        let cc_style = span.characters_covered();
        let mut cc_para = 0u32;
        while cc_para < cc_style {
            if para_idx >= para_count || cc_para >= cc_style - 1 {
                return;
            }
            let paragraph = &mut paragraphs[para_idx];
            let mut style = TextPropCollection::new(0, PropKind::Paragraph);
            style.copy_from(span);
            let mut len = paragraph.text_len() as u32;
            if para_idx == para_count - 1 {
                len += 1;
            }
            style.update_text_size(len);
            paragraph.set_paragraph_style_owned(style);
            cc_para += len;
            para_idx += 1;
        }
    }
}

/// Apply indentation rules to the paragraphs they cover. Each paragraph
/// consumes its text length plus one terminator from the rule's coverage.
pub(crate) fn apply_paragraph_indents(
    paragraphs: &mut [TextParagraph],
    indents: &[IndentProp],
) -> Result<()> {
    let mut para_idx = 0usize;
    for prop in indents {
        let mut cc = 0u32;
        while cc < prop.characters_covered {
            let paragraph = paragraphs.get_mut(para_idx).ok_or_else(|| {
                Error::MalformedInput(
                    "indent rules cover more characters than the text holds".to_string(),
                )
            })?;
            let len = paragraph.text_len() as u32;
            paragraph.set_indent_level(prop.indent_level as i16);
            cc += len + 1;
            para_idx += 1;
        }
    }
    Ok(())
}

/// Text resolved for one textbox container.
#[derive(Debug)]
pub enum ContainerText {
    /// The container holds no text block.
    None,
    /// The container owns its paragraphs.
    Owned(TextBlock),
    /// An outline-reference container borrowing sheet blocks: positions
    /// into the sheet's block list, so edits through the sheet stay
    /// visible here.
    SheetRefs(Vec<usize>),
}

/// Resolve the text of one textbox container.
///
/// A container holding an outline reference borrows paragraphs from the
/// sheet and owns none itself; resolving one without a sheet context is a
/// structural violation. An unresolved reference yields an empty borrow
/// list, which is legitimate in some decks and therefore only logged.
pub fn resolve_container(
    container: &TextboxRecords,
    sheet: Option<&dyn SheetText>,
) -> Result<ContainerText> {
    let outline_ref = container.children().iter().find_map(|r| match r.body {
        RecordBody::OutlineTextRef { text_index } => Some(text_index),
        _ => None,
    });

    if let Some(text_index) = outline_ref {
        let Some(sheet) = sheet else {
            return Err(Error::StructuralViolation(
                "outline atom reference can't be resolved without a sheet record".to_string(),
            ));
        };
        return Ok(ContainerText::SheetRefs(resolve_outline_reference(
            text_index,
            sheet.text_blocks(),
        )));
    }

    let mut blocks = find_text_blocks(container.children(), false)?;
    match blocks.len() {
        0 => Ok(ContainerText::None),
        1 => {
            let mut block = blocks.remove(0);
            block.set_shape_id(container.shape_id());
            Ok(ContainerText::Owned(block))
        }
        _ => Err(Error::StructuralViolation(
            "text box contains more than one list of paragraphs".to_string(),
        )),
    }
}

/// Positions of the sheet blocks an outline reference points at.
pub fn resolve_outline_reference(text_index: i32, sheet_blocks: &[TextBlock]) -> Vec<usize> {
    let mut refs = Vec::new();
    for (i, block) in sheet_blocks.iter().enumerate() {
        if block.index() > text_index {
            break;
        }
        if block.index() == text_index {
            refs.push(i);
        }
    }
    if refs.is_empty() {
        warn!(text_index, "text block not found for outline reference");
    }
    refs
}
