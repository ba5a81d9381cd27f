//! Structural emitter: feeds classified blocks into an output sink.
//!
//! The document and the site consume the same block stream. Each output
//! implements [`Sink`], one method per block kind, and [`emit_text`] does the
//! classification and the dispatch. Adding a block kind is a compile error in
//! every sink until it is handled.
//!
//! Sinks never fail on content problems (a missing screenshot, an unknown
//! anchor); those become [`Warning`]s in the sink's [`Diagnostics`]. The
//! sink's `Error` type is reserved for I/O and packaging failures.

use std::path::PathBuf;

use crate::markup::{
    self, Block, CalloutKind, Classified, CodeSegment, ListKind, ParagraphKind, Rules,
    ScreenshotRef, Table,
};
use crate::screenshots::Tier;

/// A content problem that was worked around.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    UnresolvedLink { anchor: String, text: String },
    ScreenshotNotFound { name: String },
    MalformedScreenshotTag { line: String },
    ImageUnreadable { path: PathBuf, reason: String },
    RowsDropped { count: usize },
    DuplicateBookmark { name: String },
    /// The part's file exists but could not be read; placeholder used.
    SourceUnreadable { key: String, reason: String },
}

/// Detail shown with `--verbose`.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Bookmark { name: String },
    LinkResolved { anchor: String, target: String },
    ScreenshotResolved { name: String, path: PathBuf, tier: Tier },
    ScreenshotSkipped { name: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
    pub traces: Vec<Trace>,
}

impl Diagnostics {
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn trace(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.traces.is_empty()
    }
}

/// An output that classified blocks are written into.
///
/// `source` is the raw lines the block was classified from. A callout with
/// `in_fence` set has none: its line is part of the enclosing code block's
/// source.
pub trait Sink {
    type Error;

    fn callout(
        &mut self,
        kind: CalloutKind,
        text: &str,
        in_fence: bool,
        source: &[String],
    ) -> Result<(), Self::Error>;
    fn code_block(&mut self, lines: &[String], source: &[String]) -> Result<(), Self::Error>;
    fn blank(&mut self, source: &[String]) -> Result<(), Self::Error>;
    fn heading(
        &mut self,
        level: u8,
        text: &str,
        bookmark: Option<&str>,
        source: &[String],
    ) -> Result<(), Self::Error>;
    fn table(&mut self, table: &Table, source: &[String]) -> Result<(), Self::Error>;
    fn screenshot(&mut self, shot: &ScreenshotRef, source: &[String]) -> Result<(), Self::Error>;
    fn list_item(&mut self, kind: ListKind, text: &str, source: &[String])
    -> Result<(), Self::Error>;
    fn url(&mut self, url: &str, source: &[String]) -> Result<(), Self::Error>;
    fn inline_code(&mut self, segments: &[CodeSegment], source: &[String])
    -> Result<(), Self::Error>;
    fn paragraph(&mut self, text: &str, kind: ParagraphKind, source: &[String])
    -> Result<(), Self::Error>;
}

/// Dispatch one classified block to the matching sink method.
pub fn emit_block<S: Sink>(sink: &mut S, item: &Classified) -> Result<(), S::Error> {
    let source = item.source.as_slice();
    match &item.block {
        Block::Callout {
            kind,
            text,
            in_fence,
        } => sink.callout(*kind, text, *in_fence, source),
        Block::CodeBlock { lines } => sink.code_block(lines, source),
        Block::Blank => sink.blank(source),
        Block::Heading {
            level,
            text,
            bookmark,
        } => sink.heading(*level, text, bookmark.as_deref(), source),
        Block::Table(table) => sink.table(table, source),
        Block::Screenshot(shot) => sink.screenshot(shot, source),
        Block::ListItem { kind, text } => sink.list_item(*kind, text, source),
        Block::Url(url) => sink.url(url, source),
        Block::InlineCode(segments) => sink.inline_code(segments, source),
        Block::Paragraph { text, kind } => sink.paragraph(text, *kind, source),
    }
}

/// Classify `text` and emit every block in source order.
///
/// Returns the number of blocks emitted.
pub fn emit_text<S: Sink>(sink: &mut S, text: &str, rules: Rules<'_>) -> Result<usize, S::Error> {
    let blocks = markup::classify(text, rules);
    for item in &blocks {
        emit_block(sink, item)?;
    }
    Ok(blocks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    /// Records one tag per call.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Sink for Recorder {
        type Error = Infallible;

        fn callout(
            &mut self,
            kind: CalloutKind,
            text: &str,
            _: bool,
            _: &[String],
        ) -> Result<(), Infallible> {
            self.calls.push(format!("callout:{}:{text}", kind.admonition()));
            Ok(())
        }
        fn code_block(&mut self, lines: &[String], _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("code:{}", lines.len()));
            Ok(())
        }
        fn blank(&mut self, _: &[String]) -> Result<(), Infallible> {
            self.calls.push("blank".into());
            Ok(())
        }
        fn heading(
            &mut self,
            level: u8,
            text: &str,
            _: Option<&str>,
            _: &[String],
        ) -> Result<(), Infallible> {
            self.calls.push(format!("h{level}:{text}"));
            Ok(())
        }
        fn table(&mut self, table: &Table, _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("table:{}", table.rows.len()));
            Ok(())
        }
        fn screenshot(&mut self, shot: &ScreenshotRef, _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("shot:{}", shot.filename));
            Ok(())
        }
        fn list_item(&mut self, _: ListKind, text: &str, _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("li:{text}"));
            Ok(())
        }
        fn url(&mut self, url: &str, _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("url:{url}"));
            Ok(())
        }
        fn inline_code(&mut self, segments: &[CodeSegment], _: &[String]) -> Result<(), Infallible> {
            self.calls.push(format!("inline:{}", segments.len()));
            Ok(())
        }
        fn paragraph(
            &mut self,
            text: &str,
            kind: ParagraphKind,
            _: &[String],
        ) -> Result<(), Infallible> {
            self.calls.push(format!("p:{kind:?}:{text}"));
            Ok(())
        }
    }

    #[test]
    fn blocks_dispatched_in_source_order() {
        let keywords = vec!["важно".to_string()];
        let mut sink = Recorder::default();
        let text = "# Заголовок\n{INTERFACE} Кнопка\n\n- пункт\nВажно: текст\n```\nx\n```";
        let n = emit_text(
            &mut sink,
            text,
            Rules {
                attention_keywords: &keywords,
            },
        )
        .unwrap();
        assert_eq!(n, 6);
        assert_eq!(
            sink.calls,
            vec![
                "h1:Заголовок",
                "callout:interface:Кнопка",
                "blank",
                "li:пункт",
                "p:Note:Важно: текст",
                "code:1",
            ]
        );
    }

    #[test]
    fn diagnostics_collect() {
        let mut d = Diagnostics::default();
        assert!(d.is_empty());
        d.warn(Warning::RowsDropped { count: 2 });
        d.trace(Trace::Bookmark { name: "x".into() });
        assert_eq!(d.warnings.len(), 1);
        assert_eq!(d.traces.len(), 1);
    }
}
