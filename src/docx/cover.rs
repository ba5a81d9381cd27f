//! Cover page and contents page of a new document.

use std::fs;
use std::path::{Path, PathBuf};

use super::model::{Align, BodyElement, Cell, Inline, Paragraph, RunProps, TWIPS_PER_INCH, TableModel};
use super::Document;
use crate::config::{DocumentConfig, SectionSpec};
use crate::emit::{Diagnostics, Warning};
use crate::naming::display_title;

pub const CONTENTS_HEADING: &str = "ОГЛАВЛЕНИЕ";
const TOC_PLACEHOLDER: &str = "Нажмите F9, чтобы обновить оглавление.";
const TOC_INSTRUCTIONS: [&str; 4] = [
    "Если оглавление не появилось автоматически:",
    "1. Щелкните правой кнопкой мыши по полю выше",
    "2. Выберите 'Обновить поле' → 'Обновить целиком'",
    "3. Сохраните документ",
];
const LOGO_WIDTH_IN: f64 = 2.5;
const CONTACTS_HEADING: &str = "Контакты поддержки:";
const INFO_LABEL_WIDTH: u32 = 2600;
const INFO_VALUE_WIDTH: u32 = 5400;
const PREVIEW_INDENT: u32 = TWIPS_PER_INCH / 4;

/// First `.png`/`.jpg`/`.jpeg` in `dir`, by name.
pub fn find_logo(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

fn blank(doc: &mut Document) {
    doc.push_paragraph(Paragraph::new());
}

/// Logo, title block, info table, description, support contacts, page break.
///
/// An unreadable logo is left out with a warning.
pub fn write_cover(
    doc: &mut Document,
    config: &DocumentConfig,
    logo: Option<&Path>,
    date: &str,
    diagnostics: &mut Diagnostics,
) {
    if let Some(logo) = logo {
        match doc.add_image(logo, LOGO_WIDTH_IN) {
            Ok(picture) => {
                let mut p = Paragraph::new().align(Align::Center);
                p.push(Inline::Picture(picture));
                doc.push_paragraph(p);
                blank(doc);
            }
            Err(e) => diagnostics.warn(Warning::ImageUnreadable {
                path: logo.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    doc.push_paragraph(Paragraph::styled("CorporateTitle").text(&config.title));
    doc.push_paragraph(Paragraph::styled("CorporateSubtitle").text(&config.subtitle));
    blank(doc);
    blank(doc);

    if !config.info.is_empty() {
        let rows = config
            .info
            .iter()
            .map(|row| {
                vec![
                    Cell {
                        width: INFO_LABEL_WIDTH,
                        paragraphs: vec![Paragraph::new().run(&row.label, RunProps::bold())],
                        ..Cell::default()
                    },
                    Cell {
                        width: INFO_VALUE_WIDTH,
                        paragraphs: vec![Paragraph::new().text(row.value.replace("{date}", date))],
                        ..Cell::default()
                    },
                ]
            })
            .collect();
        doc.push(BodyElement::Table(TableModel {
            style: Some("TableGrid"),
            align: Some(Align::Center),
            header_row: false,
            rows,
        }));
    }

    blank(doc);
    blank(doc);
    doc.push_paragraph(
        Paragraph::new()
            .align(Align::Justify)
            .text(&config.description),
    );
    if !config.contacts.is_empty() {
        blank(doc);
        doc.push_paragraph(Paragraph::new().run(CONTACTS_HEADING, RunProps::bold()));
        for line in &config.contacts {
            doc.push_paragraph(Paragraph::new().text(line));
        }
    }
    doc.push_paragraph(Paragraph::page_break());
}

/// Contents heading, TOC field, update instructions, a preview of every
/// section with its parts numbered across the document, page break.
///
/// Section titles in the preview use `Subheading`, which is not an outline
/// level, so they stay out of the generated table of contents.
pub fn write_contents(doc: &mut Document, sections: &[SectionSpec]) {
    doc.push_paragraph(
        Paragraph::styled("Heading1")
            .align(Align::Center)
            .text(CONTENTS_HEADING),
    );
    doc.push(BodyElement::TableOfContents {
        placeholder: TOC_PLACEHOLDER.to_string(),
    });
    blank(doc);

    let mut note = Paragraph::styled("ImportantNote");
    for (i, line) in TOC_INSTRUCTIONS.iter().enumerate() {
        if i > 0 {
            note.push(Inline::LineBreak);
        }
        note.push_run(*line, RunProps::default());
    }
    doc.push_paragraph(note);
    blank(doc);

    let mut number = 0;
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            blank(doc);
        }
        doc.push_paragraph(Paragraph::styled("Subheading").text(&section.title));
        for part in &section.parts {
            number += 1;
            doc.push_paragraph(
                Paragraph::new()
                    .indent_left(PREVIEW_INDENT)
                    .text(format!("    {number}. {}", display_title(part))),
            );
        }
    }
    doc.push_paragraph(Paragraph::page_break());
}

/// Cover and contents for a freshly created document.
pub fn write_front_matter(
    doc: &mut Document,
    config: &DocumentConfig,
    sections: &[SectionSpec],
    logo_dir: &Path,
    date: &str,
    diagnostics: &mut Diagnostics,
) {
    let logo = find_logo(logo_dir);
    write_cover(doc, config, logo.as_deref(), date, diagnostics);
    write_contents(doc, sections);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::body_xml;
    use crate::test_helpers::write_png;
    use tempfile::TempDir;

    fn sections() -> Vec<SectionSpec> {
        vec![
            SectionSpec {
                key: "intro".into(),
                title: "РАЗДЕЛ I: СТАРТ".into(),
                parts: vec!["01_Первые_шаги".into(), "02_Вход".into()],
            },
            SectionSpec {
                key: "faq".into(),
                title: "РАЗДЕЛ II: FAQ".into(),
                parts: vec!["03_Вопросы".into()],
            },
        ]
    }

    #[test]
    fn logo_is_first_image_by_name() {
        let tmp = TempDir::new().unwrap();
        assert!(find_logo(tmp.path()).is_none());
        std::fs::write(tmp.path().join("readme.txt"), "x").unwrap();
        write_png(&tmp.path().join("b.png"));
        write_png(&tmp.path().join("a.PNG"));
        assert_eq!(find_logo(tmp.path()), Some(tmp.path().join("a.PNG")));
        assert!(find_logo(&tmp.path().join("missing")).is_none());
    }

    #[test]
    fn cover_substitutes_date() {
        let mut doc = Document::create().unwrap();
        let mut diagnostics = Diagnostics::default();
        write_cover(
            &mut doc,
            &DocumentConfig::default(),
            None,
            "16.10.2026",
            &mut diagnostics,
        );
        let xml = body_xml(doc.appended());
        assert!(xml.contains("Цифровой РОП"));
        assert!(xml.contains("16.10.2026"));
        assert!(!xml.contains("{date}"));
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn cover_lists_support_contacts() {
        let mut doc = Document::create().unwrap();
        let mut diagnostics = Diagnostics::default();
        write_cover(
            &mut doc,
            &DocumentConfig::default(),
            None,
            "16.10.2026",
            &mut diagnostics,
        );
        let xml = body_xml(doc.appended());
        let heading = xml.find(CONTACTS_HEADING).unwrap();
        assert!(heading < xml.find("Telegram: @tchashchin").unwrap());
        assert!(xml.contains("BVMax (https://bvmax.ru)"));

        let config = DocumentConfig {
            contacts: Vec::new(),
            ..DocumentConfig::default()
        };
        let mut doc = Document::create().unwrap();
        write_cover(&mut doc, &config, None, "16.10.2026", &mut diagnostics);
        assert!(!body_xml(doc.appended()).contains(CONTACTS_HEADING));
    }

    #[test]
    fn unreadable_logo_warns() {
        let tmp = TempDir::new().unwrap();
        let logo = tmp.path().join("logo.png");
        std::fs::write(&logo, b"broken").unwrap();
        let mut doc = Document::create().unwrap();
        let mut diagnostics = Diagnostics::default();
        write_cover(
            &mut doc,
            &DocumentConfig::default(),
            Some(&logo),
            "01.01.2026",
            &mut diagnostics,
        );
        assert!(matches!(
            diagnostics.warnings.as_slice(),
            [Warning::ImageUnreadable { .. }]
        ));
        assert!(!body_xml(doc.appended()).contains("<w:drawing>"));
    }

    #[test]
    fn contents_preview_numbers_parts_globally() {
        let mut doc = Document::create().unwrap();
        write_contents(&mut doc, &sections());
        let xml = body_xml(doc.appended());
        assert!(xml.contains(CONTENTS_HEADING));
        assert!(xml.contains("    1. Первые шаги"));
        assert!(xml.contains("    2. Вход"));
        assert!(xml.contains("    3. Вопросы"));
        assert!(xml.contains(r#"<w:pStyle w:val="Subheading"/>"#));
        assert!(!xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(xml.contains("fldSimple"));
    }
}
