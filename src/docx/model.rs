//! In-memory body model for the parts of WordprocessingML this crate writes.
//!
//! Units: lengths on paragraphs and tables are twips (1/20 pt); image extents
//! are EMU (914400 per inch); font sizes are points.

/// Twips per inch.
pub const TWIPS_PER_INCH: u32 = 1440;
/// EMU per inch.
pub const EMU_PER_INCH: u64 = 914_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Justify => "both",
        }
    }
}

/// Direct run formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunProps {
    pub char_style: Option<&'static str>,
    pub font: Option<&'static str>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// `RRGGBB`
    pub color: Option<&'static str>,
    pub size_pt: Option<u32>,
}

impl RunProps {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// An embedded picture, already registered with the package.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub rel_id: String,
    pub doc_pr_id: u32,
    pub name: String,
    pub cx: u64,
    pub cy: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text { text: String, props: RunProps },
    /// Internal hyperlink to a bookmark.
    Link { bookmark: String, text: String },
    Picture(Picture),
    LineBreak,
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub style: Option<&'static str>,
    pub numbering: Option<NumberingRef>,
    /// (before, after) in twips.
    pub spacing: Option<(u32, u32)>,
    pub indent_left: Option<u32>,
    pub align: Option<Align>,
    pub bookmark: Option<Bookmark>,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(style: &'static str) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing = Some((before, after));
        self
    }

    pub fn indent_left(mut self, twips: u32) -> Self {
        self.indent_left = Some(twips);
        self
    }

    pub fn numbering(mut self, num_id: u32, level: u8) -> Self {
        self.numbering = Some(NumberingRef { num_id, level });
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.run(text, RunProps::default())
    }

    pub fn run(mut self, text: impl Into<String>, props: RunProps) -> Self {
        self.push_run(text, props);
        self
    }

    pub fn push_run(&mut self, text: impl Into<String>, props: RunProps) {
        self.inlines.push(Inline::Text {
            text: text.into(),
            props,
        });
    }

    pub fn push(&mut self, inline: Inline) {
        self.inlines.push(inline);
    }

    pub fn page_break() -> Self {
        Self {
            inlines: vec![Inline::PageBreak],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub width: u32,
    pub fill: Option<&'static str>,
    /// Only a left border of this colour; other sides hidden.
    pub left_border: Option<&'static str>,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableModel {
    pub style: Option<&'static str>,
    pub align: Option<Align>,
    /// Repeat the first row on every page.
    pub header_row: bool,
    pub rows: Vec<Vec<Cell>>,
}

impl TableModel {
    pub fn grid(&self) -> Vec<u32> {
        self.rows
            .first()
            .map(|row| row.iter().map(|c| c.width).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(TableModel),
    /// Word table-of-contents field over heading levels 1-3.
    TableOfContents { placeholder: String },
}

/// Image extent at `width_in` inches wide, keeping the pixel aspect ratio.
pub fn extent_for(width_px: u32, height_px: u32, width_in: f64) -> (u64, u64) {
    let cx = (width_in * EMU_PER_INCH as f64).round() as u64;
    if width_px == 0 {
        return (cx, cx);
    }
    let cy = (cx as f64 * height_px as f64 / width_px as f64).round() as u64;
    (cx, cy)
}
