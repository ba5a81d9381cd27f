//! Shared test utilities.
//!
//! Builds a small but complete project tree in a temp directory: a config,
//! three parts across two sections, a screenshot with its mapping, and a
//! hyperlink mapping.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = project_fixture();
//! let project = Project::load(tmp.path()).unwrap();
//! assert_eq!(project.config.sections.len(), 2);
//! ```

use std::path::Path;
use tempfile::TempDir;

/// Fixed cover date used by every test run.
pub const FIXTURE_DATE: &str = "16.10.2026";

pub const FIXTURE_CONFIG: &str = r##"
[paths]
parts_dir = "parts"
screenshots_dir = "shots"
docs_dir = "docs"
output_document = "out/manual.docx"
progress_file = "out/progress.json"
screenshot_mapping = "screenshot_mapping.json"
hyperlink_mapping = "hyperlink_mapping.json"
anchor_mapping = "anchor_mapping.json"
logo_dir = "logo"

[document]
title = "Тестовая система"

[[sections]]
key = "intro"
title = "РАЗДЕЛ I: СТАРТ"
parts = ["01_Первые_шаги", "02_Вход"]

[[sections]]
key = "faq"
title = "РАЗДЕЛ II: FAQ"
parts = ["03_Вопросы"]

[[pages]]
source = "01_Первые_шаги"
dest = "index.md"

[[pages]]
source = "02_Вход"
dest = "guide/start/login.md"

[[pages]]
source = "03_Вопросы"
dest = "help/faq.md"

[anchors]
"#faq" = "help/faq.md"
"#login" = "guide/start/login.md"
"##;

pub const FIRST_STEPS: &str = "# Первые шаги

Добро пожаловать. См. [вопросы](#faq).

{INTERFACE} Главное меню слева

- пункт один
- пункт два
";

pub const LOGIN_BASE: &str = "# Вход\n\nСтарая версия.\n";

pub const LOGIN_REVISION: &str = "# Вход в систему

1. Откройте страницу
2. Введите пароль

[СКРИНШОТ: Вход.png]

Подробнее в разделе [FAQ](#faq).
";

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a tiny 4x2 PNG, creating parent directories.
pub fn write_png(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::new(4, 2)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write `<parts>/<key>.md` (or any other file name given as `key`).
pub fn write_part(root: &Path, file_stem: &str, text: &str) {
    let dir = root.join("parts");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{file_stem}.md")), text).unwrap();
}

/// A project whose third part has no source file.
pub fn project_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::write(root.join("instruction.toml"), FIXTURE_CONFIG).unwrap();

    write_part(root, "01_Первые_шаги", FIRST_STEPS);
    write_part(root, "02_Вход", LOGIN_BASE);
    write_part(root, "02_Вход_NEW", LOGIN_REVISION);

    write_png(&root.join("shots/Вход.png"));
    std::fs::write(
        root.join("screenshot_mapping.json"),
        r#"{"screenshot_mapping": {"Вход.png": "shots/Вход.png"}}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("hyperlink_mapping.json"),
        r##"{"hyperlink_mapping": {"#faq": "РАЗДЕЛ II: FAQ"}}"##,
    )
    .unwrap();
    tmp
}
