use regex::Regex;
use std::sync::LazyLock;

use super::inline::{bookmark_name, code_segments, strip_stray_markers, visible_text};
use super::table::parse_table;
use super::{
    Block, CalloutKind, Classified, ListKind, ParagraphKind, ScreenshotForm, ScreenshotRef,
};

static SCREENSHOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[СКРИНШОТ:\s*([^\]]+)\]").expect("valid tag regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("valid numbered regex"));

pub const CODE_FENCE: &str = "```";
const TAG_OPEN: &str = "[СКРИНШОТ:";

/// Classification settings.
#[derive(Debug, Clone, Copy)]
pub struct Rules<'a> {
    /// Lowercase words that turn a paragraph into a note.
    pub attention_keywords: &'a [String],
}

struct Classifier<'a> {
    rules: Rules<'a>,
    out: Vec<Classified>,
    list_level: u8,
}

impl Classifier<'_> {
    fn push(&mut self, block: Block, source: &[&str]) {
        self.out.push(Classified {
            block,
            source: source.iter().map(|s| s.to_string()).collect(),
            list_level: self.list_level,
        });
    }
}

/// Classify a part's text into blocks, in source order.
///
/// Precedence per line, first match wins: callout, code fence, blank,
/// heading, table, screenshot, URL label, list item, bare URL, inline code,
/// paragraph. Callouts are recognised even inside an open code fence; such a
/// callout is pushed with `in_fence` set and its line stays in the code
/// block's source.
///
/// Source lines keep trailing whitespace (only `\r` is removed); decisions
/// and block text use the right-trimmed line.
pub fn classify(text: &str, rules: Rules<'_>) -> Vec<Classified> {
    let raw: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let lines: Vec<&str> = raw.iter().map(|&line| line.trim_end()).collect();
    let mut c = Classifier {
        rules,
        out: Vec::new(),
        list_level: 0,
    };
    let mut fence: Option<Fence<'_>> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some((kind, rest)) = parse_callout(line) {
            c.list_level = 0;
            let in_fence = fence.is_some();
            let block = Block::Callout {
                kind,
                text: rest.to_string(),
                in_fence,
            };
            match fence.as_mut() {
                Some(open) => {
                    open.source.push(raw[i]);
                    c.push(block, &[]);
                }
                None => c.push(block, &[raw[i]]),
            }
            i += 1;
            continue;
        }

        if line.trim() == CODE_FENCE {
            match fence.take() {
                Some(mut open) => {
                    open.source.push(raw[i]);
                    c.push(code_block(&open.code), &open.source);
                }
                None => {
                    fence = Some(Fence {
                        code: Vec::new(),
                        source: vec![raw[i]],
                    })
                }
            }
            i += 1;
            continue;
        }

        if let Some(open) = fence.as_mut() {
            open.code.push(line);
            open.source.push(raw[i]);
            i += 1;
            continue;
        }

        if line.is_empty() {
            c.list_level = 0;
            c.push(Block::Blank, &[raw[i]]);
            i += 1;
            continue;
        }

        if let Some(block) = heading(line) {
            c.list_level = 0;
            c.push(block, &[raw[i]]);
            i += 1;
            continue;
        }

        if line.starts_with('|') {
            let end = table_end(&lines, i);
            c.list_level = 0;
            c.push(Block::Table(parse_table(&lines[i..=end])), &raw[i..=end]);
            i = end + 1;
            continue;
        }

        let block = if let Some(shot) = screenshot(line) {
            c.list_level = 0;
            Block::Screenshot(shot)
        } else if line.starts_with("URL") && line.contains(':') {
            c.list_level = 0;
            Block::Paragraph {
                text: line.to_string(),
                kind: ParagraphKind::Label,
            }
        } else if let Some((kind, text)) = list_item(line) {
            c.list_level = if matches!(kind, ListKind::Nested { .. }) { 2 } else { 1 };
            Block::ListItem { kind, text }
        } else if line.starts_with("http://") || line.starts_with("https://") {
            c.list_level = 0;
            Block::Url(line.to_string())
        } else if line.contains('`') {
            c.list_level = 0;
            Block::InlineCode(code_segments(line))
        } else {
            c.list_level = 0;
            paragraph(line, c.rules)
        };
        c.push(block, &[raw[i]]);
        i += 1;
    }

    if let Some(open) = fence {
        c.push(code_block(&open.code), &open.source);
    }
    c.out
}

/// An open code fence.
struct Fence<'t> {
    /// Right-trimmed code lines, callouts excluded.
    code: Vec<&'t str>,
    /// Raw lines from the opening fence on, callouts included.
    source: Vec<&'t str>,
}

/// `{INTERFACE}` / `{TECHNICAL}` marker at the start of `line`, with the
/// trimmed remainder.
pub fn parse_callout(line: &str) -> Option<(CalloutKind, &str)> {
    CalloutKind::ALL.into_iter().find_map(|kind| {
        line.strip_prefix(kind.marker())
            .map(|rest| (kind, rest.trim()))
    })
}

fn code_block(code: &[&str]) -> Block {
    Block::CodeBlock {
        lines: code.iter().map(|s| s.to_string()).collect(),
    }
}

fn heading(line: &str) -> Option<Block> {
    let (level, rest) = if let Some(rest) = line.strip_prefix("# ") {
        (1, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (2, rest)
    } else if let Some(rest) = line.strip_prefix("### ") {
        (3, rest)
    } else {
        return None;
    };
    let text = rest.trim().to_string();
    let bookmark = (level <= 2).then(|| bookmark_name(&text));
    Some(Block::Heading {
        level,
        text,
        bookmark,
    })
}

/// Index of the last pipe line of the table starting at `start`.
///
/// Blank lines inside the table are skipped; a heading or any other
/// non-empty line ends it.
fn table_end(lines: &[&str], start: usize) -> usize {
    let mut end = start;
    for (offset, next) in lines[start + 1..].iter().enumerate() {
        let next = next.trim();
        if next.starts_with('#') || (!next.is_empty() && !next.starts_with('|')) {
            break;
        }
        if next.starts_with('|') {
            end = start + 1 + offset;
        }
    }
    end
}

fn screenshot(line: &str) -> Option<ScreenshotRef> {
    if line.contains(TAG_OPEN) {
        let filename = SCREENSHOT_TAG
            .captures(line)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();
        return Some(ScreenshotRef {
            caption: filename.clone(),
            filename,
            form: ScreenshotForm::Tagged,
        });
    }
    let names_png = line.contains(".png");
    if !names_png && !line.to_lowercase().contains("скриншот") {
        return None;
    }
    let clean = line.replace('*', "");
    let clean = clean.trim();
    let (filename, caption) = match clean.split_once(" - ") {
        Some((name, description)) => {
            let name = name.trim();
            (name.to_string(), format!("{name} - {}", description.trim()))
        }
        None => (clean.to_string(), clean.to_string()),
    };
    Some(ScreenshotRef {
        filename,
        caption,
        form: if names_png {
            ScreenshotForm::Filename
        } else {
            ScreenshotForm::Mention
        },
    })
}

fn list_item(line: &str) -> Option<(ListKind, String)> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some((ListKind::Bullet, rest.trim().to_string()));
    }
    if let Some(m) = NUMBERED.find(line) {
        let text = strip_stray_markers(&line[m.end()..]);
        return Some((ListKind::Numbered, text.trim().to_string()));
    }
    if line.starts_with("  - ") || line.starts_with("    - ") {
        let indent_level = (line.len() - line.trim_start().len()) / 2;
        let tier = (indent_level / 2 + 1) as u8;
        let text = line.trim_start()[2..].trim().to_string();
        return Some((ListKind::Nested { tier }, text));
    }
    None
}

fn paragraph(line: &str, rules: Rules<'_>) -> Block {
    let text = line.trim();
    let visible = visible_text(text).to_lowercase();
    let is_note = rules
        .attention_keywords
        .iter()
        .any(|k| visible.contains(k.as_str()));
    Block::Paragraph {
        text: text.to_string(),
        kind: if is_note {
            ParagraphKind::Note
        } else {
            ParagraphKind::Body
        },
    }
}
