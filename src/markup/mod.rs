//! Source markup classification.
//!
//! Instruction parts are markdown with a few house conventions on top:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `{INTERFACE} text` | interface callout |
//! | `{TECHNICAL} text` | technical callout |
//! | `[СКРИНШОТ: name.png]`, `**name.png**` | screenshot reference |
//! | `[text](#anchor)` | internal cross-reference |
//!
//! [`classify`] makes a single pass over a part's text and produces a
//! closed list of [`Block`]s. Both output formats consume the same blocks,
//! so a line means the same thing in the document and on the site.
//!
//! Each [`Classified`] block keeps the source lines it was built from; the
//! site output passes most blocks through verbatim.

mod block;
pub mod inline;
pub mod table;

pub use block::{CODE_FENCE, Rules, classify, parse_callout};
pub use inline::{CodeSegment, Span, bookmark_name, parse_spans};
pub use table::Table;

/// The two callout flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Interface,
    Technical,
}

impl CalloutKind {
    pub const ALL: [CalloutKind; 2] = [CalloutKind::Interface, CalloutKind::Technical];

    /// Line prefix introducing the callout.
    pub fn marker(self) -> &'static str {
        match self {
            CalloutKind::Interface => "{INTERFACE}",
            CalloutKind::Technical => "{TECHNICAL}",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            CalloutKind::Interface => "Интерфейс",
            CalloutKind::Technical => "Техническое",
        }
    }

    /// Admonition type name on the site.
    pub fn admonition(self) -> &'static str {
        match self {
            CalloutKind::Interface => "interface",
            CalloutKind::Technical => "technical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Numbered,
    /// Indented `- ` item; tier 1 for two spaces, 2 for four.
    Nested { tier: u8 },
}

/// How a screenshot was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotForm {
    /// `[СКРИНШОТ: name]`
    Tagged,
    /// A line naming a `.png` file.
    Filename,
    /// A line that only mentions "скриншот".
    Mention,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotRef {
    /// Name to resolve. Empty for a tag that could not be parsed.
    pub filename: String,
    /// Caption shown under the image.
    pub caption: String,
    pub form: ScreenshotForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Body,
    /// Contains an attention keyword.
    Note,
    /// `URL...: value` line, rendered verbatim as a note.
    Label,
}

/// One classified unit of source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Callout {
        kind: CalloutKind,
        text: String,
        /// Sits inside a code fence; its line belongs to the code block's source.
        in_fence: bool,
    },
    CodeBlock {
        lines: Vec<String>,
    },
    Blank,
    Heading {
        level: u8,
        text: String,
        /// Set for levels 1 and 2.
        bookmark: Option<String>,
    },
    Table(Table),
    Screenshot(ScreenshotRef),
    ListItem {
        kind: ListKind,
        text: String,
    },
    Url(String),
    InlineCode(Vec<CodeSegment>),
    Paragraph {
        text: String,
        kind: ParagraphKind,
    },
}

/// A block with the source lines it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub block: Block,
    pub source: Vec<String>,
    /// List nesting at this point: 0 outside lists, 1 for top-level items,
    /// 2 for nested ones. Informational.
    pub list_level: u8,
}
