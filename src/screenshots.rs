//! Best-effort screenshot lookup.
//!
//! Source parts reference screenshots by display filename, often loosely
//! (missing extension, stray bold markers, a shortened name). Resolution
//! tries an ordered list of strategies and stops at the first hit:
//!
//! 1. [`Tier::Exact`]: the mapping has the filename as a key and the mapped
//!    file exists.
//! 2. [`Tier::MappedSubstring`]: a mapping key and the filename contain one
//!    another (case-insensitive, extension ignored); keys are tried in
//!    sorted order.
//! 3. [`Tier::DirectoryWalk`]: an image under the screenshots directory has
//!    the same name or contains / is contained by the filename. The walk is
//!    sorted so the result is deterministic.
//!
//! Every tier is a plain function so each can be exercised on its own.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::mappings::ScreenshotMap;

/// Resolution strategy that produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Exact,
    MappedSubstring,
    DirectoryWalk,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Exact, Tier::MappedSubstring, Tier::DirectoryWalk];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { path: PathBuf, tier: Tier },
    NotFound,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Trim, drop every `*`, and append `.png` when the name has no extension.
pub fn normalize_filename(name: &str) -> String {
    let cleaned = name.replace('*', "");
    let cleaned = cleaned.trim();
    if cleaned.ends_with(".png") {
        cleaned.to_string()
    } else {
        format!("{cleaned}.png")
    }
}

/// Lowercased name with `.png` / `.jpg` removed, for fuzzy comparison.
fn fuzzy_base(name: &str) -> String {
    name.to_lowercase().replace(".png", "").replace(".jpg", "")
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Resolves screenshot names against the mapping and the screenshots tree.
#[derive(Debug, Clone)]
pub struct ScreenshotResolver<'a> {
    root: &'a Path,
    screenshots_dir: &'a Path,
    mapping: &'a ScreenshotMap,
}

impl<'a> ScreenshotResolver<'a> {
    /// `root` is what mapping paths are relative to.
    pub fn new(root: &'a Path, screenshots_dir: &'a Path, mapping: &'a ScreenshotMap) -> Self {
        Self {
            root,
            screenshots_dir,
            mapping,
        }
    }

    /// Try every tier in order.
    pub fn resolve(&self, name: &str) -> Resolution {
        let filename = normalize_filename(name);
        for tier in Tier::ALL {
            if let Some(path) = self.try_tier(tier, &filename) {
                return Resolution::Found { path, tier };
            }
        }
        Resolution::NotFound
    }

    /// Run a single tier against an already normalized filename.
    pub fn try_tier(&self, tier: Tier, filename: &str) -> Option<PathBuf> {
        match tier {
            Tier::Exact => self.exact(filename),
            Tier::MappedSubstring => self.mapped_substring(filename),
            Tier::DirectoryWalk => self.directory_walk(filename),
        }
    }

    fn exact(&self, filename: &str) -> Option<PathBuf> {
        let path = self.root.join(self.mapping.get(filename)?);
        path.is_file().then_some(path)
    }

    fn mapped_substring(&self, filename: &str) -> Option<PathBuf> {
        let wanted = fuzzy_base(filename);
        if wanted.is_empty() {
            return None;
        }
        self.mapping
            .iter()
            .filter(|(key, _)| overlaps(&wanted, &fuzzy_base(key)))
            .map(|(_, rel)| self.root.join(rel))
            .find(|path| path.is_file())
    }

    fn directory_walk(&self, filename: &str) -> Option<PathBuf> {
        let wanted_lower = filename.to_lowercase();
        let wanted = fuzzy_base(filename);
        if wanted.is_empty() {
            return None;
        }
        WalkDir::new(self.screenshots_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                let name = entry.file_name().to_string_lossy().to_lowercase();
                let is_image = Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e));
                is_image && (name == wanted_lower || overlaps(&wanted, &fuzzy_base(&name)))
            })
            .map(|entry| entry.into_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_png;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn mapping(pairs: &[(&str, &str)]) -> ScreenshotMap {
        ScreenshotMap::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    // =========================================================================
    // normalize_filename
    // =========================================================================

    #[test]
    fn normalize_strips_stars_and_adds_extension() {
        assert_eq!(normalize_filename("  **Вход**  "), "Вход.png");
        assert_eq!(normalize_filename("Вход.png"), "Вход.png");
        assert_eq!(normalize_filename("фото.jpg"), "фото.jpg.png");
    }

    // =========================================================================
    // Individual tiers
    // =========================================================================

    #[test]
    fn exact_tier_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("shots/Вход.png"));
        let map = mapping(&[("Вход.png", "shots/Вход.png"), ("Нет.png", "shots/Нет.png")]);
        let shots = tmp.path().join("shots");
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(
            r.try_tier(Tier::Exact, "Вход.png"),
            Some(tmp.path().join("shots/Вход.png"))
        );
        assert_eq!(r.try_tier(Tier::Exact, "Нет.png"), None);
    }

    #[test]
    fn mapped_substring_tier_matches_partial_names() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("a/Аналитика_Менеджеры_общий.png"));
        let map = mapping(&[("Аналитика_Менеджеры_общий.png", "a/Аналитика_Менеджеры_общий.png")]);
        let shots = tmp.path().join("nowhere");
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(r.try_tier(Tier::Exact, "аналитика_менеджеры.png"), None);
        assert_eq!(
            r.try_tier(Tier::MappedSubstring, "аналитика_менеджеры.png"),
            Some(tmp.path().join("a/Аналитика_Менеджеры_общий.png"))
        );
    }

    #[test]
    fn directory_walk_tier_finds_case_insensitive_match() {
        let tmp = TempDir::new().unwrap();
        let shots = tmp.path().join("СКРИНШОТЫ");
        write_png(&shots.join("Глубоко/Вложено/Графики.PNG"));
        fs::write(shots.join("Графики.txt"), "not an image").unwrap();
        let map = ScreenshotMap::default();
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(
            r.try_tier(Tier::DirectoryWalk, "графики.png"),
            Some(shots.join("Глубоко/Вложено/Графики.PNG"))
        );
    }

    #[test]
    fn directory_walk_on_missing_dir_is_none() {
        let tmp = TempDir::new().unwrap();
        let map = ScreenshotMap::default();
        let shots = tmp.path().join("absent");
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(r.try_tier(Tier::DirectoryWalk, "x.png"), None);
    }

    // =========================================================================
    // Ordered resolution
    // =========================================================================

    #[test]
    fn exact_wins_over_walk() {
        let tmp = TempDir::new().unwrap();
        let shots = tmp.path().join("shots");
        write_png(&shots.join("Вход.png"));
        write_png(&tmp.path().join("mapped/Вход.png"));
        let map = mapping(&[("Вход.png", "mapped/Вход.png")]);
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(
            r.resolve("Вход"),
            Resolution::Found {
                path: tmp.path().join("mapped/Вход.png"),
                tier: Tier::Exact
            }
        );
    }

    #[test]
    fn falls_through_to_walk() {
        let tmp = TempDir::new().unwrap();
        let shots = tmp.path().join("shots");
        write_png(&shots.join("Вход.png"));
        let map = mapping(&[("Вход.png", "mapped/missing.png")]);
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        match r.resolve("**Вход.png**") {
            Resolution::Found { tier, .. } => assert_eq!(tier, Tier::DirectoryWalk),
            Resolution::NotFound => panic!("expected a hit"),
        }
    }

    #[test]
    fn nothing_matches() {
        let tmp = TempDir::new().unwrap();
        let shots = tmp.path().join("shots");
        write_png(&shots.join("Вход.png"));
        let map = ScreenshotMap::default();
        let r = ScreenshotResolver::new(tmp.path(), &shots, &map);
        assert_eq!(r.resolve("Биллинг"), Resolution::NotFound);
    }
}
