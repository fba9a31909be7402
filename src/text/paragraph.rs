//! The in-memory paragraph/run model for one text block.
//!
//! A block owns an ordered, non-empty list of paragraphs; a paragraph owns
//! an ordered list of runs; a run owns raw text plus one character style
//! span. Raw text uses `\r` as the line separator, exactly as stored on
//! disk; `\n` only appears in the external form handed to callers.
use crate::consts::TextType;
use crate::text::master::MasterStyles;
use crate::text::prop::{
    CHAR_FLAGS, CharFlags, PARAGRAPH_FLAGS, ParagraphFlags, PropKind, TextPropCollection,
};
use bytes::Bytes;
use memchr::memchr_iter;
use smallvec::SmallVec;
use std::rc::{Rc, Weak};
use tracing::warn;

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => TextAlign::Center,
            2 => TextAlign::Right,
            3 => TextAlign::Justify,
            _ => TextAlign::Left,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            TextAlign::Left => 0,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
            TextAlign::Justify => 3,
        }
    }
}

/// Convert externally supplied text into the internal representation:
/// `\r\n` and bare `\n` both become `\r`.
pub fn to_internal_string(text: &str) -> String {
    text.replace("\r\n", "\r").replace('\n', "\r")
}

/// Convert raw text into the external form: `\r` becomes `\n`, and the
/// `0x0B` control character becomes a line break in titles (or when the
/// text type is unknown) and a blank everywhere else.
pub fn to_external_string(raw_text: &str, text_type: Option<TextType>) -> String {
    let text = raw_text.replace('\r', "\n");
    if text_type.is_none_or(TextType::vertical_tab_breaks) {
        text.replace('\u{0B}', "\n")
    } else {
        text.replace('\u{0B}', " ")
    }
}

/// Split text into segments ending immediately after each `\r`, keeping
/// the delimiter. Empty input yields one empty segment; a trailing empty
/// segment is never produced.
pub(crate) fn split_after_cr(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for pos in memchr_iter(b'\r', text.as_bytes()) {
        segments.push(&text[start..=pos]);
        start = pos + 1;
    }
    if start < text.len() || segments.is_empty() {
        segments.push(&text[start..]);
    }
    segments
}

/// Split at a character offset (not a byte offset). Offsets past the end
/// yield an empty right half.
pub(crate) fn split_at_char(text: &str, chars: usize) -> (&str, &str) {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => text.split_at(idx),
        None => (text, ""),
    }
}

/// A run of text sharing one character style.
#[derive(Debug, Clone)]
pub struct TextRun {
    raw_text: String,
    style: TextPropCollection,
}

impl TextRun {
    pub fn new() -> Self {
        Self {
            raw_text: String::new(),
            style: TextPropCollection::new(1, PropKind::Character),
        }
    }

    pub(crate) fn with_raw_text(raw_text: String) -> Self {
        Self {
            raw_text,
            style: TextPropCollection::new(1, PropKind::Character),
        }
    }

    /// The text as stored, with `\r` line separators.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Replace the run's text, normalizing external line breaks.
    pub fn set_text(&mut self, text: &str) {
        self.raw_text = to_internal_string(text);
    }

    pub(crate) fn set_raw_text(&mut self, raw_text: String) {
        self.raw_text = raw_text;
    }

    pub(crate) fn push_raw(&mut self, ch: char) {
        self.raw_text.push(ch);
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.raw_text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }

    pub fn character_style(&self) -> &TextPropCollection {
        &self.style
    }

    pub fn character_style_mut(&mut self) -> &mut TextPropCollection {
        &mut self.style
    }

    /// Replace the character style with a copy of `style`.
    pub fn set_character_style(&mut self, style: &TextPropCollection) {
        self.style.copy_from(style);
    }

    pub(crate) fn set_character_style_owned(&mut self, style: TextPropCollection) {
        self.style = style;
    }

    fn local_flags(&self) -> Option<CharFlags> {
        self.style
            .value_of(CHAR_FLAGS)
            .map(|v| CharFlags::from_bits_truncate(v as u16))
    }

    /// Locally set character flag, ignoring master fallback. For the
    /// resolved view use [`TextParagraph::run_flag`].
    pub fn has_flag(&self, flag: CharFlags) -> bool {
        self.local_flags().is_some_and(|f| f.contains(flag))
    }

    pub fn is_bold(&self) -> bool {
        self.has_flag(CharFlags::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.has_flag(CharFlags::ITALIC)
    }

    pub fn is_underlined(&self) -> bool {
        self.has_flag(CharFlags::UNDERLINE)
    }

    /// Set or clear a character flag on the local style.
    pub fn set_flag(&mut self, flag: CharFlags, value: bool) -> crate::Result<()> {
        let current = self.local_flags().unwrap_or(CharFlags::empty());
        let updated = if value { current | flag } else { current - flag };
        self.style.set_value(CHAR_FLAGS, updated.bits() as i32)
    }

    pub fn font_size(&self) -> Option<i32> {
        self.style.value_of("font.size")
    }

    pub fn set_font_size(&mut self, size: i32) -> crate::Result<()> {
        self.style.set_value("font.size", size)
    }

    pub fn font_index(&self) -> Option<i32> {
        self.style.value_of("font.index")
    }

    pub fn font_color(&self) -> Option<i32> {
        self.style.value_of("font.color")
    }

    pub fn set_font_color(&mut self, color: i32) -> crate::Result<()> {
        self.style.set_value("font.color", color)
    }

    /// Baseline offset in percent, positive for superscript and negative
    /// for subscript.
    pub fn superscript(&self) -> Option<i32> {
        self.style.value_of("superscript")
    }
}

impl Default for TextRun {
    fn default() -> Self {
        Self::new()
    }
}

/// One paragraph: an ordered sequence of runs plus a paragraph style span.
///
/// The parent shape and sheet are non-owning relations, supplied by an
/// explicit attach step after construction; the paragraph never keeps its
/// host alive.
#[derive(Debug, Clone)]
pub struct TextParagraph {
    runs: SmallVec<[TextRun; 1]>,
    style: TextPropCollection,
    text_type: TextType,
    index: i32,
    shape_id: i32,
    ruler: Option<Bytes>,
    master: Option<Weak<dyn MasterStyles>>,
}

impl TextParagraph {
    pub fn new(text_type: TextType) -> Self {
        Self {
            runs: SmallVec::new(),
            style: TextPropCollection::new(1, PropKind::Paragraph),
            text_type,
            index: -1,
            shape_id: -1,
            ruler: None,
            master: None,
        }
    }

    /// A paragraph inheriting everything but text and ruler from `other`,
    /// as created when an edit appends a paragraph after an existing one.
    pub(crate) fn cloned_after(other: &TextParagraph) -> Self {
        let mut style = TextPropCollection::new(1, PropKind::Paragraph);
        style.copy_from(&other.style);
        Self {
            runs: SmallVec::new(),
            style,
            text_type: other.text_type,
            index: other.index,
            shape_id: other.shape_id,
            ruler: None,
            master: other.master.clone(),
        }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut SmallVec<[TextRun; 1]> {
        &mut self.runs
    }

    pub fn add_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn paragraph_style(&self) -> &TextPropCollection {
        &self.style
    }

    pub fn paragraph_style_mut(&mut self) -> &mut TextPropCollection {
        &mut self.style
    }

    /// Replace the paragraph style with a copy of `style`.
    pub fn set_paragraph_style(&mut self, style: &TextPropCollection) {
        self.style.copy_from(style);
    }

    pub(crate) fn set_paragraph_style_owned(&mut self, style: TextPropCollection) {
        self.style = style;
    }

    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    /// 0-based index of the owning block in its slide-list container, -1
    /// for drawing-based text.
    pub fn index(&self) -> i32 {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: i32) {
        self.index = index;
    }

    pub fn shape_id(&self) -> i32 {
        self.shape_id
    }

    pub fn set_shape_id(&mut self, shape_id: i32) {
        self.shape_id = shape_id;
    }

    pub fn ruler(&self) -> Option<&Bytes> {
        self.ruler.as_ref()
    }

    pub(crate) fn set_ruler(&mut self, ruler: Option<Bytes>) {
        self.ruler = ruler;
    }

    /// Attach the master-style provider used for fallback lookups. The
    /// paragraph holds a weak handle; dropping the provider silently
    /// disables fallback.
    pub fn attach_master(&mut self, master: &Rc<dyn MasterStyles>) {
        self.master = Some(Rc::downgrade(master));
    }

    fn master(&self) -> Option<Rc<dyn MasterStyles>> {
        self.master.as_ref().and_then(Weak::upgrade)
    }

    /// Total character count of the paragraph's runs.
    pub fn text_len(&self) -> usize {
        self.runs.iter().map(TextRun::len).sum()
    }

    /// The paragraph's raw text: its runs concatenated.
    pub fn raw_text(&self) -> String {
        self.runs.iter().map(TextRun::raw_text).collect()
    }

    /// Indentation level, -1 if never set.
    pub fn indent_level(&self) -> i16 {
        self.style.indent_level()
    }

    /// Set the indentation level, clamped to the valid range `[0, 4]`.
    pub fn set_indent_level(&mut self, level: i16) {
        self.style.set_indent_level(level.clamp(0, 4));
    }

    /// Resolve a paragraph property: local style first, then the attached
    /// master provider, unless the paragraph's flags property is present
    /// with value zero, which marks every attribute as hard and suppresses
    /// fallback entirely.
    pub fn resolved_attr(&self, name: &str) -> Option<i32> {
        let local = self.style.value_of(name);
        let hard = self
            .style
            .find_by_name(PARAGRAPH_FLAGS)
            .is_some_and(|p| p.value() == 0);
        if local.is_none() && !hard {
            return match self.master() {
                Some(master) => {
                    master.style_attribute(self.text_type, self.indent_level(), name, false)
                }
                None => {
                    warn!("master sheet is not available");
                    None
                }
            };
        }
        local
    }

    /// Resolve a character property of one of this paragraph's runs, with
    /// the same fallback rules as [`resolved_attr`] but keyed on the
    /// character flags property.
    ///
    /// [`resolved_attr`]: Self::resolved_attr
    pub fn resolved_run_attr(&self, run: &TextRun, name: &str) -> Option<i32> {
        let local = run.character_style().value_of(name);
        let hard = run
            .character_style()
            .find_by_name(CHAR_FLAGS)
            .is_some_and(|p| p.value() == 0);
        if local.is_none() && !hard {
            return match self.master() {
                Some(master) => {
                    master.style_attribute(self.text_type, self.indent_level(), name, true)
                }
                None => {
                    warn!("master sheet is not available");
                    None
                }
            };
        }
        local
    }

    /// Resolved paragraph flag bit: local flags word if present, else the
    /// master's.
    pub fn flag(&self, flag: ParagraphFlags) -> bool {
        let word = self.style.value_of(PARAGRAPH_FLAGS).or_else(|| {
            match self.master() {
                Some(master) => self.master_flags_word(&*master, false),
                None => {
                    warn!("master sheet is not available");
                    None
                }
            }
        });
        word.is_some_and(|v| ParagraphFlags::from_bits_truncate(v as u16).contains(flag))
    }

    fn master_flags_word(&self, master: &dyn MasterStyles, is_character: bool) -> Option<i32> {
        let name = if is_character { CHAR_FLAGS } else { PARAGRAPH_FLAGS };
        master.style_attribute(self.text_type, self.indent_level(), name, is_character)
    }

    /// Resolved character flag bit for one of this paragraph's runs.
    pub fn run_flag(&self, run: &TextRun, flag: CharFlags) -> bool {
        let word = run.character_style().value_of(CHAR_FLAGS).or_else(|| {
            match self.master() {
                Some(master) => self.master_flags_word(&*master, true),
                None => {
                    warn!("master sheet is not available");
                    None
                }
            }
        });
        word.is_some_and(|v| CharFlags::from_bits_truncate(v as u16).contains(flag))
    }

    pub fn set_flag(&mut self, flag: ParagraphFlags, value: bool) -> crate::Result<()> {
        let current = self
            .style
            .value_of(PARAGRAPH_FLAGS)
            .map(|v| ParagraphFlags::from_bits_truncate(v as u16))
            .unwrap_or(ParagraphFlags::empty());
        let updated = if value { current | flag } else { current - flag };
        self.style.set_value(PARAGRAPH_FLAGS, updated.bits() as i32)
    }

    pub fn alignment(&self) -> TextAlign {
        self.resolved_attr("alignment")
            .map(TextAlign::from_raw)
            .unwrap_or_default()
    }

    pub fn set_alignment(&mut self, align: TextAlign) -> crate::Result<()> {
        self.style.set_value("alignment", align.as_raw())
    }

    /// Line spacing; zero when neither the paragraph nor the master sets it.
    pub fn line_spacing(&self) -> i32 {
        self.resolved_attr("linespacing").unwrap_or(0)
    }

    pub fn set_line_spacing(&mut self, spacing: i32) -> crate::Result<()> {
        self.style.set_value("linespacing", spacing)
    }

    /// Spacing before the paragraph. Non-negative values are a percentage
    /// of the line height, negative values are absolute master units.
    pub fn space_before(&self) -> i32 {
        self.resolved_attr("spacebefore").unwrap_or(0)
    }

    pub fn set_space_before(&mut self, value: i32) -> crate::Result<()> {
        self.style.set_value("spacebefore", value)
    }

    /// Spacing after the paragraph, same units as [`space_before`].
    ///
    /// [`space_before`]: Self::space_before
    pub fn space_after(&self) -> i32 {
        self.resolved_attr("spaceafter").unwrap_or(0)
    }

    pub fn set_space_after(&mut self, value: i32) -> crate::Result<()> {
        self.style.set_value("spaceafter", value)
    }

    pub fn left_margin(&self) -> Option<i32> {
        self.resolved_attr("text.offset")
    }

    pub fn set_left_margin(&mut self, value: i32) -> crate::Result<()> {
        self.style.set_value("text.offset", value)
    }

    pub fn bullet_offset(&self) -> Option<i32> {
        self.resolved_attr("bullet.offset")
    }

    pub fn is_bullet(&self) -> bool {
        self.flag(ParagraphFlags::BULLET)
    }

    pub fn set_bullet(&mut self, value: bool) -> crate::Result<()> {
        self.set_flag(ParagraphFlags::BULLET, value)
    }

    pub fn bullet_char(&self) -> Option<char> {
        self.resolved_attr("bullet.char")
            .and_then(|v| char::from_u32(v as u32))
    }

    pub fn set_bullet_char(&mut self, ch: char) -> crate::Result<()> {
        self.style.set_value("bullet.char", ch as i32)
    }

    pub fn bullet_font(&self) -> Option<i32> {
        self.resolved_attr("bullet.font")
    }

    pub fn bullet_size(&self) -> Option<i32> {
        self.resolved_attr("bullet.size")
    }
}

/// One text block: the ordered paragraphs sharing a single header record
/// and a single text storage record.
#[derive(Debug, Clone)]
pub struct TextBlock {
    paragraphs: Vec<TextParagraph>,
    text_type: TextType,
    index: i32,
    header_ordinal: usize,
}

impl TextBlock {
    pub(crate) fn new(
        text_type: TextType,
        index: i32,
        header_ordinal: usize,
        paragraphs: Vec<TextParagraph>,
    ) -> Self {
        Self {
            paragraphs,
            text_type,
            index,
            header_ordinal,
        }
    }

    pub fn paragraphs(&self) -> &[TextParagraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut Vec<TextParagraph> {
        &mut self.paragraphs
    }

    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    /// 0-based index of this block in its slide-list container, -1 for
    /// drawing-based blocks. Outline references resolve against it.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// Position of this block's header among the header records of its
    /// container; anchors record surgery during a save.
    pub fn header_ordinal(&self) -> usize {
        self.header_ordinal
    }

    /// Concatenated raw text of all runs across all paragraphs.
    pub fn raw_text(&self) -> String {
        self.paragraphs
            .iter()
            .flat_map(|p| p.runs().iter())
            .map(TextRun::raw_text)
            .collect()
    }

    /// The block's text in external form, with `\n` line breaks.
    pub fn text(&self) -> String {
        to_external_string(&self.raw_text(), Some(self.text_type))
    }

    /// Attach the master-style provider to every paragraph.
    pub fn attach_master(&mut self, master: &Rc<dyn MasterStyles>) {
        for paragraph in &mut self.paragraphs {
            paragraph.attach_master(master);
        }
    }

    /// Record the owning shape on every paragraph.
    pub fn set_shape_id(&mut self, shape_id: i32) {
        for paragraph in &mut self.paragraphs {
            paragraph.set_shape_id(shape_id);
        }
    }
}
