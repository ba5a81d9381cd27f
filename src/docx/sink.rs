//! Renders classified blocks into a [`Document`].

use crate::emit::{Diagnostics, Sink, Trace, Warning};
use crate::mappings::LinkMap;
use crate::markup::{
    CalloutKind, CodeSegment, ListKind, ParagraphKind, ScreenshotForm, ScreenshotRef, Span, Table,
    bookmark_name, inline::visible_text, parse_spans,
};
use crate::screenshots::{Resolution, ScreenshotResolver};

use super::model::{Align, BodyElement, Cell, Inline, Paragraph, RunProps, TableModel};
use super::xml::{BULLET_NUM_ID, TEXT_WIDTH};
use super::{DocxError, Document};

const INTERFACE_RUN: RunProps = RunProps {
    char_style: None,
    font: None,
    bold: false,
    italic: true,
    underline: false,
    color: Some("282828"),
    size_pt: None,
};
const TECHNICAL_RUN: RunProps = RunProps {
    char_style: None,
    font: Some("Consolas"),
    bold: false,
    italic: false,
    underline: false,
    color: Some("505050"),
    size_pt: Some(10),
};
const CODE_TITLE_RUN: RunProps = RunProps {
    char_style: None,
    font: None,
    bold: true,
    italic: false,
    underline: false,
    color: Some("ED1C24"),
    size_pt: Some(10),
};
const CODE_RUN: RunProps = RunProps {
    char_style: None,
    font: Some("Consolas"),
    bold: false,
    italic: false,
    underline: false,
    color: Some("282828"),
    size_pt: Some(9),
};
const TABLE_HEADER_RUN: RunProps = RunProps {
    char_style: None,
    font: None,
    bold: true,
    italic: false,
    underline: false,
    color: Some("FFFFFF"),
    size_pt: Some(10),
};
const TABLE_CELL_RUN: RunProps = RunProps {
    char_style: None,
    font: None,
    bold: false,
    italic: false,
    underline: false,
    color: Some("3C3C3C"),
    size_pt: Some(9),
};
const INLINE_CODE_RUN: RunProps = RunProps {
    char_style: Some("CodeText"),
    font: None,
    bold: false,
    italic: false,
    underline: false,
    color: None,
    size_pt: None,
};
const UNRESOLVED_LINK_COLOR: &str = "FF0000";
const TABLE_HEADER_FILL: &str = "2C3E50";
const CODE_FILL: &str = "F5F5F5";
const CODE_WIDTH: u32 = 8640;
const CODE_TITLE: &str = "API Endpoint:";
const URL_TITLE: &str = "URL:";

fn callout_colors(kind: CalloutKind) -> (&'static str, &'static str, RunProps) {
    match kind {
        CalloutKind::Interface => ("3498DB", "EBF3FD", INTERFACE_RUN),
        CalloutKind::Technical => ("E67E22", "FDF2E9", TECHNICAL_RUN),
    }
}

/// Lookups the document sink needs, shared by every part of a run.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub screenshots: ScreenshotResolver<'a>,
    /// `#anchor` → heading text.
    pub hyperlinks: &'a LinkMap,
    pub image_width_in: f64,
}

/// [`Sink`] appending to a [`Document`].
pub struct DocxSink<'a> {
    doc: &'a mut Document,
    ctx: &'a RenderContext<'a>,
    diagnostics: &'a mut Diagnostics,
    /// Numbering instance of the list currently being written.
    numbered_list: Option<u32>,
}

impl<'a> DocxSink<'a> {
    pub fn new(
        doc: &'a mut Document,
        ctx: &'a RenderContext<'a>,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            doc,
            ctx,
            diagnostics,
            numbered_list: None,
        }
    }

    /// Append inline spans of `text` to `p`, on top of `base` formatting.
    fn push_spans(&mut self, p: &mut Paragraph, text: &str, base: RunProps) {
        for span in parse_spans(text) {
            match span {
                Span::Text(t) => p.push_run(t, base),
                Span::Bold(t) => p.push_run(t, base.with_bold()),
                Span::Link { text, anchor } => match self.ctx.hyperlinks.resolve(&anchor) {
                    Some(target) => {
                        self.diagnostics.trace(Trace::LinkResolved {
                            anchor: anchor.clone(),
                            target: target.to_string(),
                        });
                        p.push(Inline::Link {
                            bookmark: bookmark_name(target),
                            text,
                        });
                    }
                    None => {
                        p.push_run(
                            text.clone(),
                            RunProps {
                                color: Some(UNRESOLVED_LINK_COLOR),
                                ..base
                            },
                        );
                        self.diagnostics
                            .warn(Warning::UnresolvedLink { anchor, text });
                    }
                },
            }
        }
    }

    fn end_list(&mut self) {
        self.numbered_list = None;
    }

    /// Single shaded cell holding a title and preformatted lines.
    fn preformatted(&mut self, title: &str, lines: &[String]) {
        let mut code = Paragraph::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                code.push(Inline::LineBreak);
            }
            code.push_run(line.as_str(), CODE_RUN);
        }
        let cell = Cell {
            width: CODE_WIDTH,
            fill: Some(CODE_FILL),
            left_border: None,
            paragraphs: vec![
                Paragraph::new().run(title, CODE_TITLE_RUN),
                Paragraph::new(),
                code,
            ],
        };
        self.doc.push(BodyElement::Table(TableModel {
            style: Some("TableGrid"),
            rows: vec![vec![cell]],
            ..TableModel::default()
        }));
    }

    fn embed(&mut self, shot: &ScreenshotRef) -> Result<(), DocxError> {
        let path = match self.ctx.screenshots.resolve(&shot.filename) {
            Resolution::Found { path, tier } => {
                self.diagnostics.trace(Trace::ScreenshotResolved {
                    name: shot.filename.clone(),
                    path: path.clone(),
                    tier,
                });
                path
            }
            Resolution::NotFound => {
                if shot.form == ScreenshotForm::Mention {
                    self.diagnostics.trace(Trace::ScreenshotSkipped {
                        name: shot.filename.clone(),
                    });
                } else {
                    self.diagnostics.warn(Warning::ScreenshotNotFound {
                        name: shot.filename.clone(),
                    });
                }
                return Ok(());
            }
        };
        match self.doc.add_image(&path, self.ctx.image_width_in) {
            Ok(picture) => {
                let mut p = Paragraph::new().align(Align::Center);
                p.push(Inline::Picture(picture));
                self.doc.push_paragraph(p);
                self.doc.push_paragraph(
                    Paragraph::styled("ScreenshotReference")
                        .align(Align::Center)
                        .text(shot.caption.as_str()),
                );
            }
            Err(e) => self.diagnostics.warn(Warning::ImageUnreadable {
                path,
                reason: e.to_string(),
            }),
        }
        Ok(())
    }

    /// Section title: `Heading1` with a bookmark.
    pub fn section_heading(&mut self, title: &str) {
        self.end_list();
        let mut p = Paragraph::styled("Heading1").text(title);
        p.bookmark = self.bookmark(&bookmark_name(title));
        self.doc.push_paragraph(p);
    }

    pub fn page_break(&mut self) {
        self.end_list();
        self.doc.push_paragraph(Paragraph::page_break());
    }

    fn bookmark(&mut self, name: &str) -> Option<super::Bookmark> {
        let bookmark = self.doc.bookmark(name);
        match &bookmark {
            Some(_) => self.diagnostics.trace(Trace::Bookmark {
                name: name.to_string(),
            }),
            None => self.diagnostics.warn(Warning::DuplicateBookmark {
                name: name.to_string(),
            }),
        }
        bookmark
    }
}

impl Sink for DocxSink<'_> {
    type Error = DocxError;

    fn callout(
        &mut self,
        kind: CalloutKind,
        text: &str,
        _: bool,
        _: &[String],
    ) -> Result<(), DocxError> {
        self.end_list();
        let (border, fill, props) = callout_colors(kind);
        let mut p = Paragraph::new().spacing(120, 120);
        self.push_spans(&mut p, text, props);
        self.doc.push(BodyElement::Table(TableModel {
            rows: vec![vec![Cell {
                width: TEXT_WIDTH,
                fill: Some(fill),
                left_border: Some(border),
                paragraphs: vec![p],
            }]],
            ..TableModel::default()
        }));
        Ok(())
    }

    fn code_block(&mut self, lines: &[String], _: &[String]) -> Result<(), DocxError> {
        self.end_list();
        if !lines.is_empty() {
            self.preformatted(CODE_TITLE, lines);
        }
        Ok(())
    }

    fn blank(&mut self, _: &[String]) -> Result<(), DocxError> {
        self.doc.push_paragraph(Paragraph::new());
        Ok(())
    }

    fn heading(
        &mut self,
        level: u8,
        text: &str,
        bookmark: Option<&str>,
        _: &[String],
    ) -> Result<(), DocxError> {
        self.end_list();
        let style = match level {
            1 => "Heading2",
            2 => "Heading3",
            _ => "Subheading",
        };
        let mut p = Paragraph::styled(style).text(text);
        if let Some(name) = bookmark {
            p.bookmark = self.bookmark(name);
        }
        self.doc.push_paragraph(p);
        Ok(())
    }

    fn table(&mut self, table: &Table, _: &[String]) -> Result<(), DocxError> {
        self.end_list();
        if table.dropped_rows > 0 {
            self.diagnostics.warn(Warning::RowsDropped {
                count: table.dropped_rows,
            });
        }
        if !table.is_renderable() {
            return Ok(());
        }
        let width = TEXT_WIDTH / table.header.len() as u32;
        let header = table
            .header
            .iter()
            .map(|h| Cell {
                width,
                fill: Some(TABLE_HEADER_FILL),
                left_border: None,
                paragraphs: vec![
                    Paragraph::new()
                        .align(Align::Center)
                        .run(h.as_str(), TABLE_HEADER_RUN),
                ],
            })
            .collect();
        let mut rows = vec![header];
        rows.extend(table.rows.iter().map(|row| {
            row.iter()
                .map(|c| Cell {
                    width,
                    paragraphs: vec![Paragraph::new().run(c.as_str(), TABLE_CELL_RUN)],
                    ..Cell::default()
                })
                .collect()
        }));
        self.doc.push(BodyElement::Table(TableModel {
            style: Some("TableGrid"),
            align: Some(Align::Left),
            header_row: true,
            rows,
        }));
        Ok(())
    }

    fn screenshot(&mut self, shot: &ScreenshotRef, source: &[String]) -> Result<(), DocxError> {
        self.end_list();
        if shot.filename.is_empty() {
            self.diagnostics.warn(Warning::MalformedScreenshotTag {
                line: source.join("\n"),
            });
            return Ok(());
        }
        self.embed(shot)
    }

    fn list_item(&mut self, kind: ListKind, text: &str, _: &[String]) -> Result<(), DocxError> {
        if text.is_empty() {
            return Ok(());
        }
        let p = match kind {
            ListKind::Bullet | ListKind::Nested { .. } => {
                let level = match kind {
                    ListKind::Nested { tier } => tier.min(2),
                    _ => 0,
                };
                let mut p = Paragraph::styled("ListBullet").numbering(BULLET_NUM_ID, level);
                self.push_spans(&mut p, text, RunProps::default());
                p
            }
            ListKind::Numbered => {
                let num_id = match self.numbered_list {
                    Some(id) => id,
                    None => {
                        let id = self.doc.numbered_list();
                        self.numbered_list = Some(id);
                        id
                    }
                };
                Paragraph::styled("ListNumber").numbering(num_id, 0).text(text)
            }
        };
        self.doc.push_paragraph(p);
        Ok(())
    }

    fn url(&mut self, url: &str, _: &[String]) -> Result<(), DocxError> {
        self.end_list();
        self.preformatted(URL_TITLE, &[url.to_string()]);
        Ok(())
    }

    fn inline_code(&mut self, segments: &[CodeSegment], _: &[String]) -> Result<(), DocxError> {
        self.end_list();
        let mut p = Paragraph::new();
        for seg in segments {
            let props = if seg.code {
                INLINE_CODE_RUN
            } else {
                RunProps::default()
            };
            p.push_run(seg.text.as_str(), props);
        }
        self.doc.push_paragraph(p);
        Ok(())
    }

    fn paragraph(&mut self, text: &str, kind: ParagraphKind, _: &[String]) -> Result<(), DocxError> {
        self.end_list();
        if visible_text(text).trim().is_empty() {
            return Ok(());
        }
        let p = match kind {
            ParagraphKind::Body => {
                let mut p = Paragraph::new().align(Align::Justify);
                self.push_spans(&mut p, text, RunProps::default());
                p
            }
            ParagraphKind::Note => {
                let mut p = Paragraph::styled("ImportantNote");
                self.push_spans(&mut p, text, RunProps::default());
                p
            }
            ParagraphKind::Label => Paragraph::styled("ImportantNote").text(text),
        };
        self.doc.push_paragraph(p);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::body_xml;
    use crate::emit::emit_text;
    use crate::mappings::ScreenshotMap;
    use crate::markup::Rules;
    use crate::test_helpers::write_png;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        screenshots: ScreenshotMap,
        hyperlinks: LinkMap,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            write_png(&tmp.path().join("shots/Вход.png"));
            let screenshots = ScreenshotMap::new(BTreeMap::from([(
                "Вход.png".to_string(),
                "shots/Вход.png".to_string(),
            )]));
            let hyperlinks = LinkMap::new(BTreeMap::from([(
                "#faq".to_string(),
                "Часто задаваемые вопросы".to_string(),
            )]));
            Self {
                tmp,
                screenshots,
                hyperlinks,
            }
        }

        fn render(&self, text: &str) -> (Document, Diagnostics) {
            let root: &Path = self.tmp.path();
            let shots_dir = root.join("shots");
            let ctx = RenderContext {
                screenshots: ScreenshotResolver::new(root, &shots_dir, &self.screenshots),
                hyperlinks: &self.hyperlinks,
                image_width_in: 6.0,
            };
            let keywords = vec!["важно".to_string()];
            let mut doc = Document::create().unwrap();
            let mut diagnostics = Diagnostics::default();
            {
                let mut sink = DocxSink::new(&mut doc, &ctx, &mut diagnostics);
                emit_text(
                    &mut sink,
                    text,
                    Rules {
                        attention_keywords: &keywords,
                    },
                )
                .unwrap();
            }
            (doc, diagnostics)
        }
    }

    #[test]
    fn mapped_link_becomes_hyperlink() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("См. [вопросы](#faq).");
        let xml = body_xml(doc.appended());
        assert!(xml.contains(r#"<w:hyperlink w:anchor="Часто_задаваемые_вопросы""#));
        assert!(diagnostics.warnings.is_empty());
    }

    #[test]
    fn unmapped_link_is_red_with_warning() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("См. [нет](#nope).");
        let xml = body_xml(doc.appended());
        assert!(xml.contains(r#"<w:color w:val="FF0000"/>"#));
        assert!(!xml.contains("w:hyperlink"));
        assert_eq!(
            diagnostics.warnings,
            vec![Warning::UnresolvedLink {
                anchor: "#nope".into(),
                text: "нет".into()
            }]
        );
    }

    #[test]
    fn screenshot_embedded_with_caption() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("[СКРИНШОТ: Вход.png]");
        let xml = body_xml(doc.appended());
        assert!(xml.contains("<w:drawing>"));
        assert!(xml.contains(r#"<w:pStyle w:val="ScreenshotReference"/>"#));
        assert!(diagnostics.warnings.is_empty());
        assert!(matches!(
            diagnostics.traces.as_slice(),
            [Trace::ScreenshotResolved { .. }]
        ));
    }

    #[test]
    fn missing_screenshot_warns_and_continues() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("**Нет.png**\nдальше");
        let xml = body_xml(doc.appended());
        assert!(!xml.contains("<w:drawing>"));
        assert!(xml.contains("дальше"));
        assert_eq!(
            diagnostics.warnings,
            vec![Warning::ScreenshotNotFound {
                name: "Нет.png".into()
            }]
        );
    }

    #[test]
    fn mention_without_match_is_only_traced() {
        let f = Fixture::new();
        let (_, diagnostics) = f.render("На скриншоте ниже показано меню");
        assert!(diagnostics.warnings.is_empty());
        assert_eq!(diagnostics.traces.len(), 1);
    }

    #[test]
    fn malformed_tag_warns() {
        let f = Fixture::new();
        let (_, diagnostics) = f.render("[СКРИНШОТ: без скобки");
        assert!(matches!(
            diagnostics.warnings.as_slice(),
            [Warning::MalformedScreenshotTag { .. }]
        ));
    }

    #[test]
    fn callouts_are_bordered_cells() {
        let f = Fixture::new();
        let (doc, _) = f.render("{INTERFACE} Кнопка **Сохранить**\n{TECHNICAL} GET /api");
        let xml = body_xml(doc.appended());
        assert!(xml.contains(r#"w:color="3498DB""#) && xml.contains(r#"w:fill="EBF3FD""#));
        assert!(xml.contains(r#"w:color="E67E22""#) && xml.contains(r#"w:fill="FDF2E9""#));
        assert!(xml.contains("<w:b/><w:i/>"));
    }

    #[test]
    fn numbered_lists_restart_after_other_blocks() {
        let f = Fixture::new();
        let (doc, _) = f.render("1. a\n\n2. b\nтекст\n1. c");
        let nums: Vec<u32> = doc
            .appended()
            .iter()
            .filter_map(|e| match e {
                BodyElement::Paragraph(p) => p.numbering.map(|n| n.num_id),
                _ => None,
            })
            .collect();
        assert_eq!(nums.len(), 3);
        assert_eq!(nums[0], nums[1]);
        assert_ne!(nums[1], nums[2]);
    }

    #[test]
    fn nested_bullets_use_deeper_levels() {
        let f = Fixture::new();
        let (doc, _) = f.render("- a\n  - b\n    - c");
        let levels: Vec<u8> = doc
            .appended()
            .iter()
            .filter_map(|e| match e {
                BodyElement::Paragraph(p) => p.numbering.map(|n| n.level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn table_header_is_filled_and_bad_rows_warned() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("| A | B |\n|---|---|\n| 1 | 2 |\n| 3 |");
        let xml = body_xml(doc.appended());
        assert_eq!(xml.matches(r#"w:fill="2C3E50""#).count(), 2);
        assert!(xml.contains(r#"<w:color w:val="FFFFFF"/>"#));
        assert_eq!(diagnostics.warnings, vec![Warning::RowsDropped { count: 1 }]);
    }

    #[test]
    fn duplicate_heading_bookmark_is_skipped() {
        let f = Fixture::new();
        let (doc, diagnostics) = f.render("# Вход\n# Вход");
        let bookmarks = doc
            .appended()
            .iter()
            .filter(|e| matches!(e, BodyElement::Paragraph(p) if p.bookmark.is_some()))
            .count();
        assert_eq!(bookmarks, 1);
        assert_eq!(
            diagnostics.warnings,
            vec![Warning::DuplicateBookmark {
                name: "Вход".into()
            }]
        );
    }

    #[test]
    fn notes_and_code() {
        let f = Fixture::new();
        let (doc, _) = f.render("Важно: сохраните\nВыполните `make`\nhttps://example.com\n```\nGET /x\n```");
        let xml = body_xml(doc.appended());
        assert!(xml.contains(r#"<w:pStyle w:val="ImportantNote"/>"#));
        assert!(xml.contains(r#"<w:rStyle w:val="CodeText"/>"#));
        assert!(xml.contains("URL:"));
        assert!(xml.contains("API Endpoint:"));
        assert!(xml.contains(r#"w:fill="F5F5F5""#));
    }
}
