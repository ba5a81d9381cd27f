//! Project configuration module.
//!
//! Handles loading, validating, and merging `instruction.toml`. The stock
//! defaults describe the "Цифровой РОП" manual as it is laid out on disk;
//! a project only needs an `instruction.toml` when it deviates from them.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── instruction.toml             # optional, overrides stock defaults
//! ├── Части_инструкции/            # source parts: <key>.md, <key>_NEW.md
//! ├── СКРИНШОТЫ/                   # screenshots, walked as a last resort
//! ├── scripts/
//! │   ├── screenshot_mapping.json
//! │   ├── anchor_mapping.json      # optional site anchors
//! │   └── progress.json            # written by `docx`
//! └── hyperlink_mapping.json
//! ```
//!
//! ## Merging
//!
//! The stock config is serialized to a `toml::Value` and the user file is
//! merged on top of it with [`merge_toml`]:
//!
//! - tables merge key by key (`[paths]`, `[document]`, `[anchors]`);
//! - arrays replace the default wholesale (`[[sections]]`, `[[pages]]`),
//!   because a partially merged section list has no sensible meaning.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the optional project config file in the project root.
pub const CONFIG_FILENAME: &str = "instruction.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `instruction.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Locations of inputs and outputs, relative to the project root.
    pub paths: PathsConfig,
    /// Cover page text and paragraph classification settings.
    pub document: DocumentConfig,
    /// Document sections in output order.
    pub sections: Vec<SectionSpec>,
    /// Site pages in output order: source part key → path under `docs/`.
    pub pages: Vec<PageSpec>,
    /// Site anchors: `#anchor` → page path under `docs/`.
    pub anchors: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            document: DocumentConfig::default(),
            sections: default_sections(),
            pages: default_pages(),
            anchors: default_anchors(),
        }
    }
}

impl ProjectConfig {
    /// Validate structural invariants the pipelines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[sections]] entry is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if section.key.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "sections.key must not be empty".into(),
                ));
            }
            if !seen.insert(section.key.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate section key: {}",
                    section.key
                )));
            }
            if section.parts.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "section '{}' has no parts",
                    section.key
                )));
            }
        }
        for page in &self.pages {
            let dest = Path::new(&page.dest);
            let escapes = dest
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes || !page.dest.ends_with(".md") {
                return Err(ConfigError::Validation(format!(
                    "pages.dest must be a relative .md path inside docs/: {}",
                    page.dest
                )));
            }
        }
        let width = self.document.image_width_inches;
        if width.is_nan() || width <= 0.0 {
            return Err(ConfigError::Validation(
                "document.image_width_inches must be positive".into(),
            ));
        }
        if let Some(bad) = self.anchors.keys().find(|k| !k.starts_with('#')) {
            return Err(ConfigError::Validation(format!(
                "anchors keys must start with '#': {bad}"
            )));
        }
        Ok(())
    }

    /// Look up a section by key.
    pub fn section(&self, key: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.key == key)
    }
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub parts_dir: String,
    pub screenshots_dir: String,
    pub docs_dir: String,
    pub output_document: String,
    pub progress_file: String,
    pub screenshot_mapping: String,
    pub hyperlink_mapping: String,
    pub anchor_mapping: String,
    /// Directory holding the cover logo; the first `.jpg`/`.png` inside is used.
    pub logo_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            parts_dir: "Части_инструкции".to_string(),
            screenshots_dir: "СКРИНШОТЫ".to_string(),
            docs_dir: "docs".to_string(),
            output_document: "Финальная_инструкция.docx".to_string(),
            progress_file: "scripts/progress.json".to_string(),
            screenshot_mapping: "scripts/screenshot_mapping.json".to_string(),
            hyperlink_mapping: "hyperlink_mapping.json".to_string(),
            anchor_mapping: "scripts/anchor_mapping.json".to_string(),
            logo_dir: "LOGO".to_string(),
        }
    }
}

impl PathsConfig {
    /// Join every configured location onto the project root.
    pub fn resolve(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            root: root.to_path_buf(),
            parts_dir: root.join(&self.parts_dir),
            screenshots_dir: root.join(&self.screenshots_dir),
            docs_dir: root.join(&self.docs_dir),
            output_document: root.join(&self.output_document),
            progress_file: root.join(&self.progress_file),
            screenshot_mapping: root.join(&self.screenshot_mapping),
            hyperlink_mapping: root.join(&self.hyperlink_mapping),
            anchor_mapping: root.join(&self.anchor_mapping),
            logo_dir: root.join(&self.logo_dir),
        }
    }
}

/// Absolute (root-joined) project locations.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub parts_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub output_document: PathBuf,
    pub progress_file: PathBuf,
    pub screenshot_mapping: PathBuf,
    pub hyperlink_mapping: PathBuf,
    pub anchor_mapping: PathBuf,
    pub logo_dir: PathBuf,
}

/// A label/value row of the cover page info table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfoRow {
    pub label: String,
    /// `{date}` is replaced with the generation date (`dd.mm.YYYY`).
    pub value: String,
}

impl InfoRow {
    fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Cover page text and paragraph classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub title: String,
    pub subtitle: String,
    pub info: Vec<InfoRow>,
    pub description: String,
    /// Lines under a bold "Контакты поддержки:" on the cover; empty omits the block.
    pub contacts: Vec<String>,
    /// Text substituted for a part whose source file does not exist.
    pub placeholder: String,
    /// Lowercase keywords that turn a paragraph into an important note.
    pub attention_keywords: Vec<String>,
    /// Display width of embedded screenshots.
    pub image_width_inches: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: "Цифровой РОП".to_string(),
            subtitle: "Полное руководство пользователя".to_string(),
            info: vec![
                InfoRow::new("Система:", "Цифровой РОП (облачная версия)"),
                InfoRow::new("Разработчик:", "BVMax (https://bvmax.ru)"),
                InfoRow::new("Дата создания:", "{date}"),
                InfoRow::new("URL системы:", "https://rop.bvmax.ru/login"),
            ],
            description: "Данная инструкция содержит подробное описание всех функций облачной \
                системы анализа телефонных переговоров с использованием искусственного \
                интеллекта. Документ предназначен для менеджеров, руководителей отделов продаж \
                и администраторов компаний-клиентов платформы Цифровой РОП."
                .to_string(),
            contacts: vec![
                "Telegram: @tchashchin".to_string(),
                "Телефон: +79670047879".to_string(),
            ],
            placeholder: "Данный раздел находится в разработке и будет добавлен в следующих \
                версиях системы."
                .to_string(),
            attention_keywords: ["важно", "внимание", "примечание", "note"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            image_width_inches: 6.0,
        }
    }
}

/// One document chapter: a titled, ordered group of part keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSpec {
    pub key: String,
    pub title: String,
    pub parts: Vec<String>,
}

/// One site page: which part it is built from and where it lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    pub source: String,
    pub dest: String,
}

fn section(key: &str, title: &str, parts: &[&str]) -> SectionSpec {
    SectionSpec {
        key: key.to_string(),
        title: title.to_string(),
        parts: parts.iter().map(|p| p.to_string()).collect(),
    }
}

fn default_sections() -> Vec<SectionSpec> {
    vec![
        section(
            "intro",
            "РАЗДЕЛ I: БЫСТРЫЙ СТАРТ",
            &[
                "00_Что_такое_Цифровой_РОП",
                "00_Регистрация_и_вход",
                "00_Первые_шаги",
            ],
        ),
        section(
            "settings",
            "РАЗДЕЛ II: НАСТРОЙКИ",
            &[
                "01_Настройки_Шаблоны_скриптов",
                "01_Настройки_Скрипты_и_промты",
                "01_Настройки_Конверсия",
                "01_Настройки_Дополнительные_промты",
                "01_Настройки_Таблицы",
                "01_Настройки_Пользователи",
            ],
        ),
        section(
            "analytics",
            "РАЗДЕЛ III: АНАЛИТИКА",
            &[
                "02_Аналитика_Коммуникации",
                "02_Аналитика_История_сделок",
                "02_Аналитика_Менеджеры",
                "02_Аналитика_Таблицы",
            ],
        ),
        section(
            "charts",
            "РАЗДЕЛ IV: ГРАФИКИ",
            &["03_Графики_Оценка", "03_Графики_Менеджеры"],
        ),
        section("tests", "РАЗДЕЛ V: ТЕСТЫ", &["04_Тесты"]),
        section("billing", "РАЗДЕЛ VI: БИЛЛИНГ", &["05_Биллинг"]),
        section("faq", "РАЗДЕЛ VII: FAQ", &["06_FAQ"]),
        section(
            "glossary",
            "РАЗДЕЛ VIII: СЛОВАРЬ ТЕРМИНОВ",
            &["07_Словарь_терминов"],
        ),
    ]
}

fn default_pages() -> Vec<PageSpec> {
    [
        ("00_Что_такое_Цифровой_РОП", "start/about.md"),
        ("00_Регистрация_и_вход", "start/registration.md"),
        ("00_Первые_шаги", "start/first-steps.md"),
        ("01_Настройки_Шаблоны_скриптов", "settings/scripts-templates.md"),
        ("01_Настройки_Скрипты_и_промты", "settings/scripts-prompts.md"),
        ("01_Настройки_Конверсия", "settings/conversion.md"),
        ("01_Настройки_Дополнительные_промты", "settings/additional-prompts.md"),
        ("01_Настройки_Таблицы", "settings/tables.md"),
        ("01_Настройки_Пользователи", "settings/users.md"),
        ("02_Аналитика_Коммуникации", "analytics/communications.md"),
        ("02_Аналитика_История_сделок", "analytics/deals-history.md"),
        ("02_Аналитика_Менеджеры", "analytics/managers.md"),
        ("02_Аналитика_Таблицы", "analytics/tables.md"),
        ("03_Графики_Оценка", "charts/score.md"),
        ("03_Графики_Менеджеры", "charts/managers.md"),
        ("04_Тесты", "tests/index.md"),
        ("05_Биллинг", "billing/index.md"),
        ("06_FAQ", "faq.md"),
        ("07_Словарь_терминов", "glossary.md"),
    ]
    .iter()
    .map(|(source, dest)| PageSpec {
        source: source.to_string(),
        dest: dest.to_string(),
    })
    .collect()
}

fn default_anchors() -> BTreeMap<String, String> {
    [
        ("#что-такое-цифровой-роп", "start/about.md"),
        ("#регистрация-и-вход", "start/registration.md"),
        ("#первые-шаги", "start/first-steps.md"),
        ("#настройки-шаблоны-скриптов", "settings/scripts-templates.md"),
        ("#настройки-скрипты-и-промты", "settings/scripts-prompts.md"),
        ("#настройки-конверсия", "settings/conversion.md"),
        ("#настройки-дополнительные-промты", "settings/additional-prompts.md"),
        ("#настройки-таблицы", "settings/tables.md"),
        ("#настройки-пользователи", "settings/users.md"),
        ("#аналитика-коммуникации", "analytics/communications.md"),
        ("#аналитика-история-сделок", "analytics/deals-history.md"),
        ("#аналитика-менеджеры", "analytics/managers.md"),
        ("#аналитика-таблицы", "analytics/tables.md"),
        ("#графики-оценка", "charts/score.md"),
        ("#графики-менеджеры", "charts/managers.md"),
        ("#тесты", "tests/index.md"),
        ("#биллинг", "billing/index.md"),
        ("#faq", "faq.md"),
        ("#словарь-терминов", "glossary.md"),
        ("#шаблоны-скриптов", "settings/scripts-templates.md"),
        ("#скрипты", "settings/scripts-prompts.md"),
        ("#промты", "settings/additional-prompts.md"),
        ("#чек-листы", "settings/scripts-templates.md"),
        ("#таблицы", "settings/tables.md"),
        ("#пользователи", "settings/users.md"),
        ("#конверсия", "settings/conversion.md"),
        ("#коммуникации", "analytics/communications.md"),
        ("#звонки", "analytics/communications.md"),
        ("#менеджеры", "analytics/managers.md"),
        ("#история-сделок", "analytics/deals-history.md"),
    ]
    .iter()
    .map(|(anchor, path)| (anchor.to_string(), path.to_string()))
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ProjectConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `instruction.toml` from the project root as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ProjectConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config: stock defaults with `instruction.toml` on top.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

const STOCK_HEADER: &str = "\
# instruction-gen configuration
# =============================
# Place this file as instruction.toml in the project root.
# All settings are optional; the values below are the defaults.
#
# Tables ([paths], [document], [anchors]) merge key by key with the defaults.
# Arrays of tables ([[sections]], [[pages]]) replace the defaults entirely.
# Unknown keys are rejected.
#
# [document].info values may contain {date}, replaced with dd.mm.YYYY.

";

/// Returns the stock config as a commented TOML document.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> String {
    let body = toml::to_string_pretty(&ProjectConfig::default())
        .expect("default config must serialize");
    format!("{STOCK_HEADER}{body}")
}
