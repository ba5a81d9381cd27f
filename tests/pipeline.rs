//! End-to-end runs of both pipelines against a project tree on disk.
//!
//! Drives the public API only: load a project, build the site, generate and
//! extend the document, then inspect the files that were written.

use std::fs;
use std::path::Path;

use instruction_gen::docx;
use instruction_gen::generate::{self, CreateReason, DocumentRequest, RunMode};
use instruction_gen::progress::{self, ProgressRecord};
use instruction_gen::project::Project;
use instruction_gen::site;
use tempfile::TempDir;

const CONFIG: &str = r##"
[paths]
parts_dir = "Части"
screenshots_dir = "СКРИНШОТЫ"
output_document = "Инструкция.docx"
progress_file = "progress.json"
screenshot_mapping = "screenshot_mapping.json"
hyperlink_mapping = "hyperlink_mapping.json"

[[sections]]
key = "start"
title = "РАЗДЕЛ I: НАЧАЛО"
parts = ["01_Обзор", "02_Настройки"]

[[sections]]
key = "help"
title = "РАЗДЕЛ II: ПОМОЩЬ"
parts = ["03_Справка"]

[[pages]]
source = "01_Обзор"
dest = "index.md"

[[pages]]
source = "02_Настройки"
dest = "admin/settings/general.md"

[[pages]]
source = "03_Справка"
dest = "help/index.md"

[anchors]
"#help" = "help/index.md"
"##;

const OVERVIEW: &str = "# Обзор

Система состоит из модулей.

{TECHNICAL} Сохраняйте изменения перед выходом

**Главный экран.png**
";

const SETTINGS: &str = "# Настройки

1. Откройте меню
2. Выберите пункт

| Параметр | Значение |
|----------|----------|
| Язык | Русский |

Вопросы: [Справка](#help).
";

const HELP: &str = "# Справка\n\nОбратитесь к администратору.\n";

fn write_png(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::new(8, 4)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

fn project_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("instruction.toml"), CONFIG).unwrap();
    fs::create_dir_all(root.join("Части")).unwrap();
    fs::write(root.join("Части/01_Обзор.md"), OVERVIEW).unwrap();
    fs::write(root.join("Части/02_Настройки.md"), SETTINGS).unwrap();
    fs::write(root.join("Части/03_Справка.md"), HELP).unwrap();
    write_png(&root.join("СКРИНШОТЫ/Экраны/Главный экран.png"));
    fs::write(
        root.join("screenshot_mapping.json"),
        r#"{"screenshot_mapping": {"Главный экран.png": "СКРИНШОТЫ/Экраны/Главный экран.png"}}"#,
    )
    .unwrap();
    fs::write(
        root.join("hyperlink_mapping.json"),
        r##"{"hyperlink_mapping": {"#help": "РАЗДЕЛ II: ПОМОЩЬ"}}"##,
    )
    .unwrap();
    tmp
}

fn request(sections: &[&str]) -> DocumentRequest {
    DocumentRequest {
        sections: sections.iter().map(|s| s.to_string()).collect(),
        date: "01.02.2026".to_string(),
        ..DocumentRequest::default()
    }
}

// =========================================================================
// Site
// =========================================================================

#[test]
fn site_pages_link_relative_to_their_depth() {
    let tmp = project_tree();
    let project = Project::load(tmp.path()).unwrap();
    let report = site::build_site(&project).unwrap();
    assert_eq!(report.pages.len(), 3);
    assert_eq!(report.assets.copied, 1);

    let docs = tmp.path().join("docs");
    let settings = fs::read_to_string(docs.join("admin/settings/general.md")).unwrap();
    assert!(settings.contains("Вопросы: [Справка](../../help/index.md)."));
    assert!(settings.contains("| Язык | Русский |"));

    let index = fs::read_to_string(docs.join("index.md")).unwrap();
    assert!(index.contains("!!! technical \"Техническое\""));
    assert!(index.contains("![Главный экран.png](images/главный-экран.png)"));
    assert!(docs.join("images/главный-экран.png").is_file());
}

// =========================================================================
// Document
// =========================================================================

#[test]
fn document_is_a_valid_package_with_embedded_screenshot() {
    let tmp = project_tree();
    let project = Project::load(tmp.path()).unwrap();
    let report = generate::generate_document(&project, &request(&[])).unwrap();
    assert_eq!(report.warning_count(), 0, "{report:?}");

    let path = &project.paths.output_document;
    let types = docx::read_part(path, "[Content_Types].xml").unwrap();
    assert!(types.contains(r#"Extension="png""#));
    let rels = docx::read_part(path, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains("media/image1.png"));

    let body = docx::read_document_xml(path).unwrap();
    assert!(body.contains("01.02.2026"));
    assert!(body.contains(r#"w:anchor="РАЗДЕЛ_II:_ПОМОЩЬ""#));
    assert!(body.contains(r#"w:name="РАЗДЕЛ_II:_ПОМОЩЬ""#));
}

#[test]
fn partial_then_full_run_matches_single_full_run() {
    let staged = project_tree();
    let project = Project::load(staged.path()).unwrap();
    generate::generate_document(&project, &request(&["start"])).unwrap();
    let report = generate::generate_document(&project, &request(&[])).unwrap();
    assert_eq!(report.mode, RunMode::Appended);
    assert_eq!(report.rendered_parts(), 1);
    let staged_body = docx::read_document_xml(&project.paths.output_document).unwrap();

    let single = project_tree();
    let project = Project::load(single.path()).unwrap();
    generate::generate_document(&project, &request(&[])).unwrap();
    let single_body = docx::read_document_xml(&project.paths.output_document).unwrap();

    assert_eq!(staged_body, single_body);
}

#[test]
fn repeated_runs_leave_document_untouched() {
    let tmp = project_tree();
    let project = Project::load(tmp.path()).unwrap();
    generate::generate_document(&project, &request(&[])).unwrap();
    let before = fs::read(&project.paths.output_document).unwrap();

    for _ in 0..2 {
        let report = generate::generate_document(&project, &request(&[])).unwrap();
        assert!(!report.saved);
    }
    assert_eq!(fs::read(&project.paths.output_document).unwrap(), before);
}

#[test]
fn crash_between_saves_rebuilds_instead_of_duplicating() {
    let tmp = project_tree();
    let project = Project::load(tmp.path()).unwrap();
    generate::generate_document(&project, &request(&["start"])).unwrap();
    let record_after_start = fs::read(&project.paths.progress_file).unwrap();

    // the document got the help section but the record was never written
    generate::generate_document(&project, &request(&["help"])).unwrap();
    fs::write(&project.paths.progress_file, record_after_start).unwrap();

    let report = generate::generate_document(&project, &request(&["help"])).unwrap();
    assert!(matches!(
        report.mode,
        RunMode::Created(CreateReason::Stale(_))
    ));
    let body = docx::read_document_xml(&project.paths.output_document).unwrap();
    assert_eq!(body.matches("Обратитесь к администратору.").count(), 1);
    assert_eq!(body.matches("Система состоит из модулей.").count(), 1);
    assert!(
        body.find("Система состоит из модулей.").unwrap()
            < body.find("Обратитесь к администратору.").unwrap()
    );

    let record = ProgressRecord::load(&project.paths.progress_file).unwrap();
    assert_eq!(record.completed_sections, vec!["start", "help"]);
    assert_eq!(
        record.document_sha256,
        Some(progress::hash_file(&project.paths.output_document).unwrap())
    );
}

#[test]
fn reset_removes_previous_state() {
    let tmp = project_tree();
    let project = Project::load(tmp.path()).unwrap();
    generate::generate_document(&project, &request(&[])).unwrap();

    fs::write(tmp.path().join("Части/03_Справка_NEW.md"), "# Справка\n\nНовый текст.\n")
        .unwrap();
    let mut req = request(&[]);
    req.reset = true;
    let report = generate::generate_document(&project, &req).unwrap();
    assert_eq!(report.mode, RunMode::Created(CreateReason::Reset));

    let body = docx::read_document_xml(&project.paths.output_document).unwrap();
    assert!(body.contains("Новый текст."));
    assert!(!body.contains("Обратитесь к администратору."));
}
