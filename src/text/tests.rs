//! Integration tests for the parse/edit/serialize cycle
//!
//! These tests drive whole text blocks through record parsing, edits and
//! re-serialization and check the invariants the format demands: span
//! coverage always equals text length plus one terminator, line endings
//! are repaired on save, and a parse of freshly written records yields
//! the model that produced them.
use crate::binary::encode_windows1252;
use crate::consts::{RecordType, TextType};
use crate::error::Error;
use crate::records::record::{Record, RecordBody, TextBytesAtom, TextSpecInfoAtom};
use crate::records::TextboxRecords;
use crate::text::master::SheetText;
use crate::text::paragraph::{TextBlock, TextParagraph, TextRun};
use crate::text::parser::{find_text_blocks, resolve_container, ContainerText};
use crate::text::store::{create_empty_block, store_text};
use crate::text::style_atom::StyleTextPropAtom;
use proptest::prelude::*;

fn header_record(text_type: TextType) -> Record {
    Record::new(RecordBody::TextHeader { text_type })
}

fn bytes_record(text: &str) -> Record {
    let encoded = encode_windows1252(text).expect("test text must be narrow");
    Record::new(RecordBody::TextBytes(TextBytesAtom::from_encoded(encoded)))
}

fn style_record(styles: &StyleTextPropAtom) -> Record {
    Record::new(RecordBody::StyleTextProp {
        data: styles.write_payload().into(),
    })
}

/// Styles for "AB\rCD": two paragraph spans and two character spans of
/// three characters each, the second pair covering the terminator.
fn two_span_styles() -> StyleTextPropAtom {
    let mut styles = StyleTextPropAtom::empty();
    let p0 = styles.add_paragraph_collection(3);
    styles.paragraph_styles_mut()[p0].set_value("alignment", 1).unwrap();
    let p1 = styles.add_paragraph_collection(3);
    styles.paragraph_styles_mut()[p1].set_value("alignment", 2).unwrap();
    let c0 = styles.add_character_collection(3);
    styles.character_styles_mut()[c0].set_value("font.size", 10).unwrap();
    let c1 = styles.add_character_collection(3);
    styles.character_styles_mut()[c1].set_value("font.size", 20).unwrap();
    styles
}

fn two_paragraph_container() -> TextboxRecords {
    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Body));
    container.append_child(bytes_record("AB\rCD"));
    container.append_child(style_record(&two_span_styles()));
    container
}

fn style_payload(container: &TextboxRecords) -> Vec<u8> {
    container
        .children()
        .iter()
        .find_map(|r| match &r.body {
            RecordBody::StyleTextProp { data } => Some(data.to_vec()),
            _ => None,
        })
        .expect("container has no style record")
}

#[test]
fn test_split_correctness() {
    let container = two_paragraph_container();
    let blocks = find_text_blocks(container.children(), false).unwrap();
    assert_eq!(blocks.len(), 1);

    let paragraphs = blocks[0].paragraphs();
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0].runs().len(), 1);
    assert_eq!(paragraphs[1].runs().len(), 1);
    assert_eq!(paragraphs[0].runs()[0].raw_text(), "AB\r");
    assert_eq!(paragraphs[1].runs()[0].raw_text(), "CD");
    assert_eq!(
        paragraphs[0].runs()[0].character_style().value_of("font.size"),
        Some(10)
    );
    assert_eq!(
        paragraphs[1].runs()[0].character_style().value_of("font.size"),
        Some(20)
    );
    assert_eq!(
        paragraphs[0].paragraph_style().value_of("alignment"),
        Some(1)
    );
    assert_eq!(
        paragraphs[1].paragraph_style().value_of("alignment"),
        Some(2)
    );
    assert_eq!(blocks[0].text(), "AB\nCD");
}

#[test]
fn test_round_trip_is_byte_stable() {
    let mut container = two_paragraph_container();
    container.write_through().unwrap();
    let original = container.cached_bytes().to_vec();

    let mut blocks = find_text_blocks(container.children(), false).unwrap();
    store_text(&mut container, &mut blocks[0]).unwrap();
    assert_eq!(container.cached_bytes(), &original[..]);

    // and the reparsed model matches the one that was stored
    let reparsed = find_text_blocks(container.children(), false).unwrap();
    assert_eq!(reparsed[0].text(), blocks[0].text());
    assert_eq!(reparsed[0].paragraphs().len(), blocks[0].paragraphs().len());
    for (a, b) in reparsed[0]
        .paragraphs()
        .iter()
        .zip(blocks[0].paragraphs().iter())
    {
        assert!(a.paragraph_style().same_style(b.paragraph_style()));
        assert_eq!(a.runs().len(), b.runs().len());
    }
}

#[test]
fn test_coverage_invariant_after_save() {
    let mut container = two_paragraph_container();
    let mut blocks = find_text_blocks(container.children(), false).unwrap();

    blocks[0].append_text(&mut container, "!", false).unwrap();
    let raw_len = blocks[0].raw_text().chars().count();
    assert_eq!(raw_len, 6);

    let styles = StyleTextPropAtom::parse(&style_payload(&container), raw_len).unwrap();
    assert_eq!(styles.paragraph_coverage(), raw_len as u32 + 1);
    assert_eq!(styles.character_coverage(), raw_len as u32 + 1);
}

#[test]
fn test_terminator_repair_on_save() {
    // the first paragraph's run lacks its trailing \r
    let mut first = TextParagraph::new(TextType::Body);
    first.paragraph_style_mut().update_text_size(3);
    first.add_run(TextRun::with_raw_text("AB".to_string()));
    let mut second = TextParagraph::new(TextType::Body);
    second.paragraph_style_mut().update_text_size(2);
    second.add_run(TextRun::with_raw_text("CD".to_string()));
    let mut block = TextBlock::new(TextType::Body, -1, 0, vec![first, second]);

    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Body));
    container.append_child(bytes_record(""));

    store_text(&mut container, &mut block).unwrap();
    assert_eq!(block.paragraphs()[0].runs()[0].raw_text(), "AB\r");
    assert_eq!(block.raw_text(), "AB\rCD");
}

#[test]
fn test_paragraph_without_runs_fails_save() {
    let mut block = TextBlock::new(
        TextType::Body,
        -1,
        0,
        vec![TextParagraph::new(TextType::Body)],
    );
    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Body));

    let result = store_text(&mut container, &mut block);
    assert!(matches!(result, Err(Error::StructuralViolation(_))));
}

#[test]
fn test_merge_adjacent_same_style_runs() {
    // paragraph one: two runs with the same bold style; paragraph two:
    // one run styled differently
    let mut first = TextParagraph::new(TextType::Body);
    let mut run_a = TextRun::with_raw_text("AB".to_string());
    run_a.character_style_mut().set_value("char.flags", 1).unwrap();
    let mut run_b = TextRun::with_raw_text("CD\r".to_string());
    run_b.character_style_mut().set_value("char.flags", 1).unwrap();
    first.add_run(run_a);
    first.add_run(run_b);

    let mut second = TextParagraph::new(TextType::Body);
    let mut run_c = TextRun::with_raw_text("E".to_string());
    run_c.character_style_mut().set_value("font.size", 12).unwrap();
    second.add_run(run_c);

    let mut block = TextBlock::new(TextType::Body, -1, 0, vec![first, second]);
    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Body));

    store_text(&mut container, &mut block).unwrap();

    let styles = StyleTextPropAtom::parse(&style_payload(&container), 6).unwrap();
    // the two bold runs collapse into one span of their combined length
    assert_eq!(styles.character_styles().len(), 2);
    assert_eq!(styles.character_styles()[0].characters_covered(), 5);
    assert_eq!(styles.character_styles()[0].value_of("char.flags"), Some(1));
    assert_eq!(styles.character_styles()[1].characters_covered(), 2);
    // both paragraphs share a default style and merge into a single span
    assert_eq!(styles.paragraph_styles().len(), 1);
    assert_eq!(styles.paragraph_styles()[0].characters_covered(), 7);
}

#[test]
fn test_append_semantics() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    block.paragraphs_mut()[0].runs_mut()[0]
        .character_style_mut()
        .set_value("font.size", 42)
        .unwrap();

    block.append_text(&mut container, "X\nY", false).unwrap();

    assert_eq!(block.paragraphs().len(), 2);
    assert_eq!(block.paragraphs()[0].runs()[0].raw_text(), "X\r");
    assert_eq!(block.paragraphs()[1].runs()[0].raw_text(), "Y");
    // the first segment reused the empty run, the second got a style clone
    assert_eq!(
        block.paragraphs()[0].runs()[0].character_style().value_of("font.size"),
        Some(42)
    );
    assert_eq!(
        block.paragraphs()[1].runs()[0].character_style().value_of("font.size"),
        Some(42)
    );
    assert_eq!(block.text(), "X\nY");
}

#[test]
fn test_append_as_new_paragraph() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    block.set_text(&mut container, "first").unwrap();
    block.paragraphs_mut()[0].set_indent_level(2);

    block.append_text(&mut container, "second", true).unwrap();

    assert_eq!(block.paragraphs().len(), 2);
    assert_eq!(block.paragraphs()[0].runs()[0].raw_text(), "first\r");
    assert_eq!(block.paragraphs()[1].runs()[0].raw_text(), "second");
    // the fresh paragraph clones the previous paragraph's style
    assert_eq!(block.paragraphs()[1].indent_level(), 2);
}

#[test]
fn test_append_to_non_empty_run_creates_sibling() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    block.set_text(&mut container, "head").unwrap();

    block.append_text(&mut container, "tail", false).unwrap();

    assert_eq!(block.paragraphs().len(), 1);
    let runs = block.paragraphs()[0].runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].raw_text(), "head");
    assert_eq!(runs[1].raw_text(), "tail");
}

#[test]
fn test_set_text_idempotent() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    block.set_text(&mut container, "Hello World").unwrap();
    assert_eq!(block.paragraphs().len(), 1);
    assert_eq!(block.paragraphs()[0].runs().len(), 1);

    let text = block.text();
    block.set_text(&mut container, &text).unwrap();
    assert_eq!(block.text(), "Hello World");
    assert_eq!(block.paragraphs().len(), 1);
    assert_eq!(block.paragraphs()[0].runs().len(), 1);

    // with an internal line break the paragraph count reflects the split
    block.set_text(&mut container, "a\nb").unwrap();
    let text = block.text();
    block.set_text(&mut container, &text).unwrap();
    assert_eq!(block.text(), "a\nb");
    assert_eq!(block.paragraphs().len(), 2);
}

#[test]
fn test_encoding_promotion_to_wide() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    // a single character outside the narrow encoding flips the whole
    // block to wide storage
    block
        .set_text(&mut container, "mostly ascii \u{4e16}")
        .unwrap();

    let types: Vec<RecordType> = container.children().iter().map(Record::record_type).collect();
    assert!(types.contains(&RecordType::TextCharsAtom));
    assert!(!types.contains(&RecordType::TextBytesAtom));

    let blocks = find_text_blocks(container.children(), false).unwrap();
    assert_eq!(blocks[0].text(), "mostly ascii \u{4e16}");
}

#[test]
fn test_encoding_demotion_to_narrow() {
    let (mut container, mut block) = create_empty_block(TextType::Other);
    block.set_text(&mut container, "wide \u{4e16}").unwrap();
    block.set_text(&mut container, "narrow again").unwrap();

    let types: Vec<RecordType> = container.children().iter().map(Record::record_type).collect();
    assert!(types.contains(&RecordType::TextBytesAtom));
    assert!(!types.contains(&RecordType::TextCharsAtom));

    // windows-1252 characters beyond ASCII still count as narrow
    block.set_text(&mut container, "caf\u{e9} \u{2019}quote\u{2019}").unwrap();
    let types: Vec<RecordType> = container.children().iter().map(Record::record_type).collect();
    assert!(types.contains(&RecordType::TextBytesAtom));
}

#[test]
fn test_record_swap_preserves_siblings() {
    let mut container = two_paragraph_container();
    container.append_child(Record::new(RecordBody::Unknown {
        raw_type: 4063,
        data: vec![1, 2, 3].into(),
    }));

    let mut blocks = find_text_blocks(container.children(), false).unwrap();
    blocks[0]
        .set_text(&mut container, "needs wide \u{4e16}")
        .unwrap();

    let types: Vec<RecordType> = container.children().iter().map(Record::record_type).collect();
    assert_eq!(
        types,
        vec![
            RecordType::TextHeaderAtom,
            RecordType::TextCharsAtom,
            RecordType::StyleTextPropAtom,
            RecordType::Unknown,
        ]
    );
}

#[test]
fn test_missing_records_materialized_on_save() {
    // a block with neither text nor style record parses as an empty
    // placeholder and materializes both records on the first save
    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Body));

    let mut blocks = find_text_blocks(container.children(), false).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].raw_text(), "");
    assert_eq!(blocks[0].paragraphs().len(), 1);

    blocks[0].set_text(&mut container, "created").unwrap();

    let types: Vec<RecordType> = container.children().iter().map(Record::record_type).collect();
    assert_eq!(
        types,
        vec![
            RecordType::TextHeaderAtom,
            RecordType::TextBytesAtom,
            RecordType::StyleTextPropAtom,
        ]
    );
    let reparsed = find_text_blocks(container.children(), false).unwrap();
    assert_eq!(reparsed[0].text(), "created");
}

#[test]
fn test_spec_info_record_updated() {
    let mut container = two_paragraph_container();
    let mut spec = TextSpecInfoAtom::from_payload(&[0, 0, 0, 0, 0, 0, 0, 0]);
    spec.set_parent_size(6);
    container.append_child(Record::new(RecordBody::TextSpecInfo(spec)));

    let mut blocks = find_text_blocks(container.children(), false).unwrap();
    blocks[0].set_text(&mut container, "Hello\nWorld").unwrap();

    let updated = container
        .children()
        .iter()
        .find_map(|r| match &r.body {
            RecordBody::TextSpecInfo(atom) => atom.parent_size(),
            _ => None,
        })
        .unwrap();
    assert_eq!(updated, 12);
}

/// Spans as any writer produces them: one paragraph and one character
/// span covering the text plus its terminator.
fn full_cover_styles(text_len: u32) -> StyleTextPropAtom {
    let mut styles = StyleTextPropAtom::empty();
    styles.add_paragraph_collection(text_len + 1);
    styles.add_character_collection(text_len + 1);
    styles
}

#[test]
fn test_second_block_save_leaves_first_alone() {
    let mut container = TextboxRecords::new_empty(1);
    container.append_child(header_record(TextType::Title));
    container.append_child(bytes_record("Title"));
    container.append_child(style_record(&full_cover_styles(5)));
    container.append_child(header_record(TextType::Body));
    container.append_child(bytes_record("Body"));
    container.append_child(style_record(&full_cover_styles(4)));

    let mut blocks = find_text_blocks(container.children(), true).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].index(), 0);
    assert_eq!(blocks[1].index(), 1);

    blocks[1].set_text(&mut container, "Edited").unwrap();

    let reparsed = find_text_blocks(container.children(), true).unwrap();
    assert_eq!(reparsed[0].text(), "Title");
    assert_eq!(reparsed[1].text(), "Edited");
}

struct StubSheet {
    blocks: Vec<TextBlock>,
}

impl SheetText for StubSheet {
    fn text_blocks(&self) -> &[TextBlock] {
        &self.blocks
    }
}

fn outline_container(text_index: i32) -> TextboxRecords {
    let mut container = TextboxRecords::new_empty(9);
    container.append_child(Record::new(RecordBody::OutlineTextRef { text_index }));
    container
}

#[test]
fn test_outline_reference_resolution() {
    let mut sheet_records = TextboxRecords::new_empty(1);
    sheet_records.append_child(header_record(TextType::Title));
    sheet_records.append_child(bytes_record("Title"));
    sheet_records.append_child(header_record(TextType::Body));
    sheet_records.append_child(bytes_record("Outline body"));
    let sheet = StubSheet {
        blocks: find_text_blocks(sheet_records.children(), true).unwrap(),
    };

    match resolve_container(&outline_container(1), Some(&sheet)).unwrap() {
        ContainerText::SheetRefs(refs) => {
            assert_eq!(refs, vec![1]);
            assert_eq!(sheet.blocks[refs[0]].text(), "Outline body");
        }
        other => panic!("expected sheet refs, got {other:?}"),
    }

    // a dangling reference is not fatal, it just resolves to nothing
    match resolve_container(&outline_container(7), Some(&sheet)).unwrap() {
        ContainerText::SheetRefs(refs) => assert!(refs.is_empty()),
        other => panic!("expected sheet refs, got {other:?}"),
    }

    // without a sheet context the alias cannot be resolved at all
    let result = resolve_container(&outline_container(1), None);
    assert!(matches!(result, Err(Error::StructuralViolation(_))));
}

#[test]
fn test_resolve_owned_and_empty_containers() {
    let container = two_paragraph_container();
    match resolve_container(&container, None).unwrap() {
        ContainerText::Owned(block) => {
            assert_eq!(block.text(), "AB\nCD");
            assert_eq!(block.paragraphs()[0].shape_id(), 1);
        }
        other => panic!("expected owned block, got {other:?}"),
    }

    let mut empty = TextboxRecords::new_empty(2);
    empty.append_child(Record::new(RecordBody::Unknown {
        raw_type: 4063,
        data: vec![].into(),
    }));
    assert!(matches!(
        resolve_container(&empty, None).unwrap(),
        ContainerText::None
    ));
}

proptest! {
    #[test]
    fn prop_set_text_round_trip(text in "[a-zA-Z0-9 .\r\u{e9}\u{4e16}]{0,48}") {
        let (mut container, mut block) = create_empty_block(TextType::Other);
        block.set_text(&mut container, &text).unwrap();
        let raw_len = block.raw_text().chars().count();

        let blocks = find_text_blocks(container.children(), false).unwrap();
        prop_assert_eq!(blocks.len(), 1);
        prop_assert_eq!(blocks[0].text(), block.text());
        prop_assert_eq!(blocks[0].paragraphs().len(), block.paragraphs().len());

        // coverage invariant, read straight from the regenerated record
        let styles = StyleTextPropAtom::parse(&style_payload(&container), raw_len).unwrap();
        prop_assert_eq!(styles.paragraph_coverage(), raw_len as u32 + 1);
        prop_assert_eq!(styles.character_coverage(), raw_len as u32 + 1);

        // a second save of the reparsed model must not change a byte
        let mut container_again = container.clone();
        let mut reparsed = blocks.into_iter().next().unwrap();
        reparsed.save(&mut container_again).unwrap();
        prop_assert_eq!(container_again.cached_bytes(), container.cached_bytes());
    }

    #[test]
    fn prop_append_keeps_coverage(
        first in "[a-z \r]{0,16}",
        second in "[A-Z0-9\n]{0,16}",
        new_paragraph: bool,
    ) {
        let (mut container, mut block) = create_empty_block(TextType::Body);
        block.set_text(&mut container, &first).unwrap();
        block.append_text(&mut container, &second, new_paragraph).unwrap();

        let raw_len = block.raw_text().chars().count();
        let styles = StyleTextPropAtom::parse(&style_payload(&container), raw_len).unwrap();
        prop_assert_eq!(styles.paragraph_coverage(), raw_len as u32 + 1);
        prop_assert_eq!(styles.character_coverage(), raw_len as u32 + 1);

        // every non-final paragraph ends with the internal separator
        let paragraphs = block.paragraphs();
        for paragraph in &paragraphs[..paragraphs.len() - 1] {
            prop_assert!(paragraph.raw_text().ends_with('\r'));
        }
    }
}
