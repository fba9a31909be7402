//! Serialization of edited paragraph/run models back into records.
//!
//! A save rewrites the block's text storage record (switching between the
//! narrow and wide form when needed), regenerates its style spans by
//! merging equal-styled neighbors, refreshes the auxiliary length record
//! and finally forces the host container to rewrite its cached byte form.
use crate::binary::encode_windows1252;
use crate::consts::TextType;
use crate::error::{Error, Result};
use crate::records::record::{Record, RecordBody, TextBytesAtom, TextCharsAtom};
use crate::records::TextboxRecords;
use crate::text::paragraph::{split_after_cr, to_internal_string, TextBlock, TextParagraph, TextRun};
use crate::text::style_atom::StyleTextPropAtom;
use bytes::Bytes;

impl TextBlock {
    /// Serialize this block back into its host container. See
    /// [`store_text`].
    pub fn save(&mut self, container: &mut TextboxRecords) -> Result<()> {
        store_text(container, self)
    }

    /// Append text to the end of the block. See [`append_text`].
    pub fn append_text(
        &mut self,
        container: &mut TextboxRecords,
        text: &str,
        new_paragraph: bool,
    ) -> Result<()> {
        append_text(container, self, text, new_paragraph)
    }

    /// Overwrite the block's text. See [`set_text`].
    pub fn set_text(&mut self, container: &mut TextboxRecords, text: &str) -> Result<()> {
        set_text(container, self, text)
    }
}

/// Ensure every paragraph but the last ends its final run with `\r`.
/// A paragraph without runs cannot be repaired and fails the save.
fn fix_line_endings(paragraphs: &mut [TextParagraph]) -> Result<()> {
    let count = paragraphs.len();
    for (i, paragraph) in paragraphs.iter_mut().enumerate() {
        let Some(last_run) = paragraph.runs_mut().last_mut() else {
            return Err(Error::StructuralViolation(
                "paragraph without text runs found".to_string(),
            ));
        };
        if i + 1 < count && !last_run.raw_text().ends_with('\r') {
            last_run.push_raw('\r');
        }
    }
    Ok(())
}

/// Saves the modified paragraphs/runs of one block to the records and
/// updates the style spans to the new text length.
pub fn store_text(container: &mut TextboxRecords, block: &mut TextBlock) -> Result<()> {
    if block.paragraphs().is_empty() {
        return Err(Error::StructuralViolation(
            "text block without paragraphs".to_string(),
        ));
    }
    fix_line_endings(block.paragraphs_mut())?;

    let raw_text = block.raw_text();
    let char_len = raw_text.chars().count();

    // one storage form for the whole block: wide as soon as a single
    // character has no narrow encoding
    let narrow = encode_windows1252(&raw_text);

    let span = container.block_span(block.header_ordinal()).ok_or_else(|| {
        Error::StructuralViolation("text header record not found in container".to_string())
    })?;
    let header_idx = span.start;

    let mut text_idx = None;
    let mut style_idx = None;
    let mut spec_idx = None;
    for i in span {
        match container.children()[i].body {
            RecordBody::TextBytes(_) | RecordBody::TextChars(_) => text_idx = Some(i),
            RecordBody::StyleTextProp { .. } => style_idx = Some(i),
            RecordBody::TextSpecInfo(_) => spec_idx = Some(i),
            _ => {}
        }
    }

    let new_body = match &narrow {
        Some(bytes) => RecordBody::TextBytes(TextBytesAtom::from_encoded(bytes.clone())),
        None => RecordBody::TextChars(TextCharsAtom::from_text(&raw_text)),
    };

    let text_idx = match text_idx {
        Some(i) => {
            let existing_wide = matches!(container.children()[i].body, RecordBody::TextChars(_));
            if existing_wide == narrow.is_none() {
                // same storage form, swap the payload in place
                container.children_mut()[i].body = new_body;
            } else {
                // wrong form: a fresh record takes the old one's position
                container.replace_child(i, Record::new(new_body));
            }
            i
        }
        None => {
            // the block never had a text record, put one right after the
            // header; siblings behind it shift by one
            let i = container.add_child_after(Record::new(new_body), header_idx);
            if let Some(s) = style_idx.as_mut()
                && *s >= i
            {
                *s += 1;
            }
            if let Some(s) = spec_idx.as_mut()
                && *s >= i
            {
                *s += 1;
            }
            i
        }
    };

    let styles = regenerate_styles(block);
    let payload: Bytes = styles.write_payload().into();
    match style_idx {
        Some(i) => container.children_mut()[i].body = RecordBody::StyleTextProp { data: payload },
        None => {
            let i = container.add_child_after(
                Record::new(RecordBody::StyleTextProp { data: payload }),
                text_idx,
            );
            if let Some(s) = spec_idx.as_mut()
                && *s >= i
            {
                *s += 1;
            }
        }
    }

    if let Some(i) = spec_idx
        && let RecordBody::TextSpecInfo(atom) = &mut container.children_mut()[i].body
    {
        atom.set_parent_size(char_len as u32 + 1);
    }

    container.write_through()
}

/// Rebuild the block's style spans from its paragraphs and runs.
///
/// Walking in order, a paragraph or run starts a new span only when its
/// style differs structurally from the previous one; equal-styled
/// neighbors extend the previous span's coverage instead. The final
/// paragraph span and the final character span each absorb one extra
/// character for the block terminator, as do the styles held by the model
/// itself.
fn regenerate_styles(block: &mut TextBlock) -> StyleTextPropAtom {
    let mut atom = StyleTextPropAtom::empty();
    let mut last_p: Option<usize> = None;
    let mut last_r: Option<usize> = None;

    let para_count = block.paragraphs().len();
    for pi in 0..para_count {
        block.paragraphs_mut()[pi]
            .paragraph_style_mut()
            .update_text_size(0);

        let lp = match last_p {
            Some(i)
                if atom.paragraph_styles()[i]
                    .same_style(block.paragraphs()[pi].paragraph_style()) =>
            {
                i
            }
            _ => {
                let i = atom.add_paragraph_collection(0);
                atom.paragraph_styles_mut()[i]
                    .copy_from(block.paragraphs()[pi].paragraph_style());
                i
            }
        };
        last_p = Some(lp);

        let run_count = block.paragraphs()[pi].runs().len();
        for ri in 0..run_count {
            block.paragraphs_mut()[pi].runs_mut()[ri]
                .character_style_mut()
                .update_text_size(0);

            let lr = match last_r {
                Some(i)
                    if atom.character_styles()[i]
                        .same_style(block.paragraphs()[pi].runs()[ri].character_style()) =>
                {
                    i
                }
                _ => {
                    let i = atom.add_character_collection(0);
                    atom.character_styles_mut()[i]
                        .copy_from(block.paragraphs()[pi].runs()[ri].character_style());
                    i
                }
            };
            last_r = Some(lr);

            let len = block.paragraphs()[pi].runs()[ri].len() as u32;

            let paragraph_style = block.paragraphs_mut()[pi].paragraph_style_mut();
            let covered = paragraph_style.characters_covered();
            paragraph_style.update_text_size(covered + len);

            block.paragraphs_mut()[pi].runs_mut()[ri]
                .character_style_mut()
                .update_text_size(len);

            let merged = &mut atom.paragraph_styles_mut()[lp];
            let covered = merged.characters_covered();
            merged.update_text_size(covered + len);

            let merged = &mut atom.character_styles_mut()[lr];
            let covered = merged.characters_covered();
            merged.update_text_size(covered + len);
        }
    }

    // the implicit terminator counts into the final spans, both in the
    // regenerated streams and in the model's own styles
    let last_pi = para_count - 1;
    let paragraph_style = block.paragraphs_mut()[last_pi].paragraph_style_mut();
    let covered = paragraph_style.characters_covered();
    paragraph_style.update_text_size(covered + 1);

    let last_ri = block.paragraphs()[last_pi].runs().len() - 1;
    let run_style = block.paragraphs_mut()[last_pi].runs_mut()[last_ri].character_style_mut();
    let covered = run_style.characters_covered();
    run_style.update_text_size(covered + 1);

    if let Some(i) = last_p {
        let merged = &mut atom.paragraph_styles_mut()[i];
        let covered = merged.characters_covered();
        merged.update_text_size(covered + 1);
    }
    if let Some(i) = last_r {
        let merged = &mut atom.character_styles_mut()[i];
        let covered = merged.characters_covered();
        merged.update_text_size(covered + 1);
    }

    atom
}

/// Append text onto the end of a block.
///
/// Line breaks are normalized to the internal `\r` convention first. The
/// first segment extends the current last run (reusing it when empty,
/// otherwise adding a sibling run with a copy of its style), unless
/// `new_paragraph` asks for a fresh paragraph cloning the previous
/// paragraph's style. Every later segment always starts a new paragraph.
/// Finishes by saving the block.
pub fn append_text(
    container: &mut TextboxRecords,
    block: &mut TextBlock,
    text: &str,
    new_paragraph: bool,
) -> Result<()> {
    let text = to_internal_string(text);

    let reference_style = {
        let Some(paragraph) = block.paragraphs().last() else {
            return Err(Error::StructuralViolation(
                "text block without paragraphs".to_string(),
            ));
        };
        let Some(run) = paragraph.runs().last() else {
            return Err(Error::StructuralViolation(
                "paragraph without text runs found".to_string(),
            ));
        };
        run.character_style().clone()
    };

    let mut is_first = !new_paragraph;
    for segment in split_after_cr(&text) {
        if !is_first {
            let previous = &block.paragraphs()[block.paragraphs().len() - 1];
            let next = TextParagraph::cloned_after(previous);
            block.paragraphs_mut().push(next);
        }
        is_first = false;

        let last = block.paragraphs().len() - 1;
        let paragraph = &mut block.paragraphs_mut()[last];
        match paragraph.runs_mut().last_mut() {
            // special case, the last run is empty, reuse it
            Some(run) if run.is_empty() => run.set_raw_text(segment.to_string()),
            _ => {
                let mut run = TextRun::with_raw_text(segment.to_string());
                run.set_character_style(&reference_style);
                paragraph.add_run(run);
            }
        }
    }

    store_text(container, block)
}

/// Overwrite the block's text, keeping the styles of its first paragraph
/// and first run for the new content.
pub fn set_text(container: &mut TextboxRecords, block: &mut TextBlock, text: &str) -> Result<()> {
    if block.paragraphs().is_empty() || block.paragraphs()[0].runs().is_empty() {
        return Err(Error::StructuralViolation(
            "text block without paragraphs".to_string(),
        ));
    }

    block.paragraphs_mut().truncate(1);
    let paragraph = &mut block.paragraphs_mut()[0];
    paragraph.runs_mut().truncate(1);
    paragraph.runs_mut()[0].set_raw_text(String::new());

    append_text(container, block, text, false)
}

/// A minimal container and block for a freshly created text shape: a
/// header, an empty narrow text record and a style atom whose two spans
/// cover just the terminator character.
pub fn create_empty_block(text_type: TextType) -> (TextboxRecords, TextBlock) {
    let mut container = TextboxRecords::new_empty(-1);
    container.append_child(Record::new(RecordBody::TextHeader { text_type }));
    container.append_child(Record::new(RecordBody::TextBytes(TextBytesAtom::default())));

    let mut styles = StyleTextPropAtom::empty();
    styles.add_paragraph_collection(1);
    styles.add_character_collection(1);
    container.append_child(Record::new(RecordBody::StyleTextProp {
        data: styles.write_payload().into(),
    }));

    let mut paragraph = TextParagraph::new(text_type);
    paragraph.paragraph_style_mut().update_text_size(1);
    let mut run = TextRun::new();
    run.character_style_mut().update_text_size(1);
    paragraph.add_run(run);

    let block = TextBlock::new(text_type, -1, 0, vec![paragraph]);
    (container, block)
}
