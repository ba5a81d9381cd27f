//! JSON lookup tables loaded once at startup.
//!
//! Each mapping file is a JSON object with a single top-level key wrapping the
//! actual table:
//!
//! ```json
//! { "screenshot_mapping": { "Аналитика.png": "СКРИНШОТЫ/Аналитика/Аналитика.png" } }
//! { "hyperlink_mapping":  { "#faq": "Часто задаваемые вопросы" } }
//! { "anchor_mapping":     { "#faq": "faq.md" } }
//! ```
//!
//! A missing file or a missing top-level key yields an empty table; malformed
//! JSON is an error. Tables are immutable after loading and are passed by
//! reference to whatever consults them.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SCREENSHOT_MAPPING_KEY: &str = "screenshot_mapping";
pub const HYPERLINK_MAPPING_KEY: &str = "hyperlink_mapping";
pub const ANCHOR_MAPPING_KEY: &str = "anchor_mapping";

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("{path}: \"{key}\" must be an object of strings")]
    Shape { path: String, key: String },
}

/// Display filename → path relative to the project root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenshotMap {
    entries: BTreeMap<String, String>,
}

impl ScreenshotMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        Ok(Self::new(load_table(path, SCREENSHOT_MAPPING_KEY)?))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Entries sorted by display filename.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `#anchor` → link target.
///
/// For the document the target is the text of the heading to jump to; for
/// the site it is a page path under `docs/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMap {
    entries: BTreeMap<String, String>,
}

impl LinkMap {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path, key: &str) -> Result<Self, MappingError> {
        Ok(Self::new(load_table(path, key)?))
    }

    /// Layer the entries of `path` (if present) on top of `defaults`.
    pub fn load_over(
        defaults: &BTreeMap<String, String>,
        path: &Path,
        key: &str,
    ) -> Result<Self, MappingError> {
        let mut entries = defaults.clone();
        entries.extend(load_table(path, key)?);
        Ok(Self::new(entries))
    }

    /// Look up an anchor. Accepts the token with or without its leading `#`.
    pub fn resolve(&self, anchor: &str) -> Option<&str> {
        let lookup = if anchor.starts_with('#') {
            self.entries.get(anchor)
        } else {
            self.entries.get(&format!("#{anchor}"))
        };
        lookup.map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_table(path: &Path, key: &str) -> Result<BTreeMap<String, String>, MappingError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)?;
    let display = path.display().to_string();
    let root: Value = serde_json::from_str(&content).map_err(|source| MappingError::Json {
        path: display.clone(),
        source,
    })?;
    let Some(table) = root.get(key) else {
        return Ok(BTreeMap::new());
    };
    let shape_error = || MappingError::Shape {
        path: display.clone(),
        key: key.to_string(),
    };
    let object = table.as_object().ok_or_else(shape_error)?;
    object
        .iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), s.to_string()))
                .ok_or_else(shape_error)
        })
        .collect()
}
