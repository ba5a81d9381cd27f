//! Content reader for instruction parts.
//!
//! A part key `K` is backed by `<parts_dir>/K.md`. A newer draft at
//! `<parts_dir>/K_NEW.md` takes precedence when present. A part with neither
//! file is replaced by placeholder text so the document keeps its structure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::emit::{Diagnostics, Warning};
use crate::naming::REVISION_SUFFIX;

/// Which file a part's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// `<key>_NEW.md`
    Revision,
    /// `<key>.md`
    Base,
    /// No file on disk; placeholder text.
    Placeholder,
}

/// The text of one instruction part.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceText {
    pub key: String,
    pub text: String,
    pub origin: Origin,
}

/// Candidate files for a part key, in precedence order.
pub fn candidate_paths(parts_dir: &Path, key: &str) -> [(PathBuf, Origin); 2] {
    [
        (
            parts_dir.join(format!("{key}{REVISION_SUFFIX}.md")),
            Origin::Revision,
        ),
        (parts_dir.join(format!("{key}.md")), Origin::Base),
    ]
}

/// The origin a read would use, without reading.
pub fn locate(parts_dir: &Path, key: &str) -> Origin {
    candidate_paths(parts_dir, key)
        .into_iter()
        .find(|(path, _)| path.is_file())
        .map(|(_, origin)| origin)
        .unwrap_or(Origin::Placeholder)
}

/// Read a part, preferring its revision, falling back to `placeholder`.
///
/// Only a file that exists but cannot be read is an error.
pub fn read_part(parts_dir: &Path, key: &str, placeholder: &str) -> io::Result<SourceText> {
    for (path, origin) in candidate_paths(parts_dir, key) {
        if path.is_file() {
            return Ok(SourceText {
                key: key.to_string(),
                text: fs::read_to_string(&path)?,
                origin,
            });
        }
    }
    Ok(SourceText {
        key: key.to_string(),
        text: placeholder.to_string(),
        origin: Origin::Placeholder,
    })
}

/// [`read_part`], with an unreadable file downgraded to a warning and the
/// placeholder.
pub fn read_part_or_placeholder(
    parts_dir: &Path,
    key: &str,
    placeholder: &str,
    diagnostics: &mut Diagnostics,
) -> SourceText {
    read_part(parts_dir, key, placeholder).unwrap_or_else(|e| {
        diagnostics.warn(Warning::SourceUnreadable {
            key: key.to_string(),
            reason: e.to_string(),
        });
        SourceText {
            key: key.to_string(),
            text: placeholder.to_string(),
            origin: Origin::Placeholder,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLACEHOLDER: &str = "Раздел в разработке.";

    #[test]
    fn reads_base_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("00_Вход.md"), "# Вход").unwrap();
        let src = read_part(tmp.path(), "00_Вход", PLACEHOLDER).unwrap();
        assert_eq!(src.text, "# Вход");
        assert_eq!(src.origin, Origin::Base);
        assert_eq!(src.key, "00_Вход");
    }

    #[test]
    fn revision_wins_over_base() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("00_Вход.md"), "old").unwrap();
        fs::write(tmp.path().join("00_Вход_NEW.md"), "new").unwrap();
        let src = read_part(tmp.path(), "00_Вход", PLACEHOLDER).unwrap();
        assert_eq!(src.text, "new");
        assert_eq!(src.origin, Origin::Revision);
        assert_eq!(locate(tmp.path(), "00_Вход"), Origin::Revision);
    }

    #[test]
    fn missing_part_yields_placeholder() {
        let tmp = TempDir::new().unwrap();
        let src = read_part(tmp.path(), "99_Нет", PLACEHOLDER).unwrap();
        assert_eq!(src.text, PLACEHOLDER);
        assert_eq!(src.origin, Origin::Placeholder);
        assert_eq!(locate(tmp.path(), "99_Нет"), Origin::Placeholder);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(read_part(tmp.path(), "bad", PLACEHOLDER).is_err());
    }

    #[test]
    fn unreadable_part_warns_and_uses_placeholder() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        let mut diagnostics = Diagnostics::default();
        let src = read_part_or_placeholder(tmp.path(), "bad", PLACEHOLDER, &mut diagnostics);
        assert_eq!(src.text, PLACEHOLDER);
        assert_eq!(src.origin, Origin::Placeholder);
        assert!(matches!(
            diagnostics.warnings.as_slice(),
            [Warning::SourceUnreadable { key, .. }] if key == "bad"
        ));
    }
}
