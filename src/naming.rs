//! Part key parsing for the `NN_Words` convention.
//!
//! Every instruction part is stored as `<key>.md` where the key is a two-digit
//! group prefix followed by underscore-separated words:
//!
//! - `00_Что_такое_Цифровой_РОП` → group 0, "Что такое Цифровой РОП"
//! - `12_API_документация_техническая` → group 12, "API документация техническая"
//!
//! A revised draft of a part lives next to it as `<key>_NEW.md`.

/// Filename suffix marking a newer revision of a part.
pub const REVISION_SUFFIX: &str = "_NEW";

/// Result of parsing a part key like `01_Аналитика_Менеджеры`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedKey {
    /// Group prefix if present (e.g., `1` from `01_Аналитика_Менеджеры`)
    pub number: Option<u32>,
    /// Raw name after `NN_`, underscores preserved. Empty if number-only.
    pub name: String,
    /// Display title: name with underscores converted to spaces.
    pub display_title: String,
}

/// Parse a part key following the `NN_name` convention.
///
/// - `"02_Графики_Оценка"` → number=Some(2), display_title="Графики Оценка"
/// - `"07"` → number=Some(7), name=""
/// - `"Введение"` → number=None, name="Введение"
pub fn parse_part_key(key: &str) -> ParsedKey {
    if let Some((prefix, raw)) = key.split_once('_')
        && let Ok(num) = prefix.parse::<u32>()
    {
        return ParsedKey {
            number: Some(num),
            name: raw.to_string(),
            display_title: raw.replace('_', " "),
        };
    }
    if let Ok(num) = key.parse::<u32>() {
        return ParsedKey {
            number: Some(num),
            name: String::new(),
            display_title: String::new(),
        };
    }
    ParsedKey {
        number: None,
        name: key.to_string(),
        display_title: key.replace('_', " "),
    }
}

/// Display title for a part key, falling back to the key itself when the
/// name portion is empty.
pub fn display_title(key: &str) -> String {
    let parsed = parse_part_key(key);
    if parsed.display_title.is_empty() {
        key.to_string()
    } else {
        parsed.display_title
    }
}

/// Split a file stem into its part key and whether it is a revision.
///
/// `"04_Другое_NEW"` → `("04_Другое", true)`.
pub fn split_revision(stem: &str) -> (&str, bool) {
    match stem.strip_suffix(REVISION_SUFFIX) {
        Some(base) if !base.is_empty() => (base, true),
        _ => (stem, false),
    }
}
