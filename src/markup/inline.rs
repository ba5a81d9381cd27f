//! Inline span parsing: bold runs, internal links, code segments.

use regex::Regex;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(#([^)]+)\)").expect("valid link regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"));
static STRAY_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#`]").expect("valid marker regex"));

/// A styled piece of paragraph text.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Bold(String),
    /// `[text](#anchor)`; `anchor` keeps its leading `#`.
    Link { text: String, anchor: String },
}

/// Split paragraph text into plain, bold, and link spans.
///
/// Markers left over after span extraction (`*`, `#`, backticks) are
/// removed from plain text. Empty plain pieces are dropped.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in LINK.captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_bold_spans(&text[last..whole.start], &mut spans);
        spans.push(Span::Link {
            text: caps[1].to_string(),
            anchor: format!("#{}", &caps[2]),
        });
        last = whole.end;
    }
    push_bold_spans(&text[last..], &mut spans);
    spans
}

fn push_bold_spans(text: &str, spans: &mut Vec<Span>) {
    let mut last = 0;
    for caps in BOLD.captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        push_plain(&text[last..whole.start], spans);
        spans.push(Span::Bold(caps[1].to_string()));
        last = whole.end;
    }
    push_plain(&text[last..], spans);
}

fn push_plain(text: &str, spans: &mut Vec<Span>) {
    let clean = strip_stray_markers(text);
    if !clean.is_empty() {
        spans.push(Span::Text(clean));
    }
}

/// Remove `*`, `#` and backticks.
pub fn strip_stray_markers(text: &str) -> String {
    STRAY_MARKERS.replace_all(text, "").into_owned()
}

/// Plain text of a paragraph with all markup removed, as a reader sees it.
pub fn visible_text(text: &str) -> String {
    parse_spans(text)
        .into_iter()
        .map(|span| match span {
            Span::Text(t) | Span::Bold(t) => t,
            Span::Link { text, .. } => text,
        })
        .collect()
}

/// A piece of a line split on backticks.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSegment {
    pub text: String,
    pub code: bool,
}

/// Split a line on backticks: odd segments are code, even ones plain text.
///
/// All `*` are removed first; bold is not interpreted on this path.
pub fn code_segments(line: &str) -> Vec<CodeSegment> {
    line.replace('*', "")
        .split('`')
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| CodeSegment {
            text: part.to_string(),
            code: i % 2 == 1,
        })
        .collect()
}

/// Bookmark name for a heading: spaces, dots and hyphens become `_`,
/// parentheses are removed.
pub fn bookmark_name(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if matches!(c, ' ' | '.' | '-') { '_' } else { c })
        .collect()
}

/// Rewrite every `(#anchor)` link target that `resolve` knows.
///
/// Unknown links are left untouched and returned alongside the result as
/// `(anchor, text)` pairs.
pub fn rewrite_links<F>(line: &str, mut resolve: F) -> (String, Vec<(String, String)>)
where
    F: FnMut(&str) -> Option<String>,
{
    let mut unresolved = Vec::new();
    let out = LINK.replace_all(line, |caps: &regex::Captures<'_>| {
        let anchor = format!("#{}", &caps[2]);
        match resolve(&anchor) {
            Some(target) => format!("[{}]({})", &caps[1], target),
            None => {
                unresolved.push((anchor, caps[1].to_string()));
                caps[0].to_string()
            }
        }
    });
    (out.into_owned(), unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    fn bold(s: &str) -> Span {
        Span::Bold(s.to_string())
    }

    // =========================================================================
    // parse_spans
    // =========================================================================

    #[test]
    fn plain_text_is_one_span() {
        assert_eq!(parse_spans("Просто текст"), vec![text("Просто текст")]);
    }

    #[test]
    fn bold_spans_leave_surroundings_plain() {
        assert_eq!(
            parse_spans("Нажмите **Сохранить** и **Закрыть** сразу"),
            vec![
                text("Нажмите "),
                bold("Сохранить"),
                text(" и "),
                bold("Закрыть"),
                text(" сразу"),
            ]
        );
    }

    #[test]
    fn links_are_extracted_with_hash() {
        assert_eq!(
            parse_spans("См. [FAQ](#faq) и **важное**"),
            vec![
                text("См. "),
                Span::Link {
                    text: "FAQ".into(),
                    anchor: "#faq".into()
                },
                text(" и "),
                bold("важное"),
            ]
        );
    }

    #[test]
    fn stray_markers_removed_from_plain_text() {
        assert_eq!(parse_spans("a * b # c `d`"), vec![text("a  b  c d")]);
    }

    #[test]
    fn external_links_are_plain_text() {
        assert_eq!(
            parse_spans("[сайт](https://example.com)"),
            vec![text("[сайт](https://example.com)")]
        );
    }

    #[test]
    fn visible_text_drops_markup() {
        assert_eq!(visible_text("**Важно**: см. [FAQ](#faq)"), "Важно: см. FAQ");
    }

    // =========================================================================
    // code_segments
    // =========================================================================

    #[test]
    fn code_segments_alternate() {
        let segs = code_segments("Выполните `GET /api` и **ждите** `200`");
        assert_eq!(
            segs,
            vec![
                CodeSegment { text: "Выполните ".into(), code: false },
                CodeSegment { text: "GET /api".into(), code: true },
                CodeSegment { text: " и ждите ".into(), code: false },
                CodeSegment { text: "200".into(), code: true },
            ]
        );
    }

    #[test]
    fn code_segments_leading_backtick() {
        let segs = code_segments("`x` y");
        assert_eq!(segs[0], CodeSegment { text: "x".into(), code: true });
        assert_eq!(segs[1], CodeSegment { text: " y".into(), code: false });
    }

    // =========================================================================
    // bookmark_name
    // =========================================================================

    #[test]
    fn bookmark_name_normalizes() {
        assert_eq!(
            bookmark_name("РАЗДЕЛ I: БЫСТРЫЙ СТАРТ"),
            "РАЗДЕЛ_I:_БЫСТРЫЙ_СТАРТ"
        );
        assert_eq!(bookmark_name("Шаг 1.2 (опц.) - итог"), "Шаг_1_2_опц____итог");
    }

    // =========================================================================
    // rewrite_links
    // =========================================================================

    #[test]
    fn rewrite_known_anchor() {
        let (out, missing) = rewrite_links("See [FAQ](#faq) for details.", |a| {
            (a == "#faq").then(|| "../../faq.md".to_string())
        });
        assert_eq!(out, "See [FAQ](../../faq.md) for details.");
        assert!(missing.is_empty());
    }

    #[test]
    fn rewrite_leaves_unknown_anchor() {
        let (out, missing) = rewrite_links("[X](#нет) и [Y](#faq)", |a| {
            (a == "#faq").then(|| "faq.md".to_string())
        });
        assert_eq!(out, "[X](#нет) и [Y](faq.md)");
        assert_eq!(missing, vec![("#нет".to_string(), "X".to_string())]);
    }
}
