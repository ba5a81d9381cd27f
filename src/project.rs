//! A loaded project: configuration plus the mapping tables, read once.

use std::path::Path;

use thiserror::Error;

use crate::config::{self, ConfigError, ProjectConfig, ProjectPaths};
use crate::mappings::{
    ANCHOR_MAPPING_KEY, HYPERLINK_MAPPING_KEY, LinkMap, MappingError, ScreenshotMap,
};
use crate::markup::Rules;
use crate::screenshots::ScreenshotResolver;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Everything a run needs that does not change during it.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: ProjectConfig,
    pub paths: ProjectPaths,
    pub screenshots: ScreenshotMap,
    /// `#anchor` → heading text, for the document.
    pub hyperlinks: LinkMap,
    /// `#anchor` → page path, for the site: configured anchors overlaid by
    /// the anchor mapping file.
    pub anchors: LinkMap,
}

impl Project {
    /// Load `instruction.toml` (if any) and the mapping files it points at.
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let config = config::load_config(root)?;
        Self::from_config(root, config)
    }

    pub fn from_config(root: &Path, config: ProjectConfig) -> Result<Self, ProjectError> {
        let paths = config.paths.resolve(root);
        let screenshots = ScreenshotMap::load(&paths.screenshot_mapping)?;
        let hyperlinks = LinkMap::load(&paths.hyperlink_mapping, HYPERLINK_MAPPING_KEY)?;
        let anchors =
            LinkMap::load_over(&config.anchors, &paths.anchor_mapping, ANCHOR_MAPPING_KEY)?;
        Ok(Self {
            config,
            paths,
            screenshots,
            hyperlinks,
            anchors,
        })
    }

    pub fn rules(&self) -> Rules<'_> {
        Rules {
            attention_keywords: &self.config.document.attention_keywords,
        }
    }

    pub fn resolver(&self) -> ScreenshotResolver<'_> {
        ScreenshotResolver::new(
            &self.paths.root,
            &self.paths.screenshots_dir,
            &self.screenshots,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::project_fixture;
    use tempfile::TempDir;

    #[test]
    fn loads_fixture_project() {
        let tmp = project_fixture();
        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.config.sections.len(), 2);
        assert_eq!(project.screenshots.len(), 1);
        assert_eq!(project.hyperlinks.resolve("#faq"), Some("РАЗДЕЛ II: FAQ"));
        assert_eq!(project.anchors.resolve("faq"), Some("help/faq.md"));
        assert_eq!(project.paths.parts_dir, tmp.path().join("parts"));
    }

    #[test]
    fn anchor_file_overrides_configured_anchors() {
        let tmp = project_fixture();
        std::fs::write(
            tmp.path().join("anchor_mapping.json"),
            r##"{"anchor_mapping": {"#faq": "faq/index.md", "#new": "new.md"}}"##,
        )
        .unwrap();
        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.anchors.resolve("#faq"), Some("faq/index.md"));
        assert_eq!(project.anchors.resolve("#new"), Some("new.md"));
        assert_eq!(project.anchors.resolve("#login"), Some("guide/start/login.md"));
    }

    #[test]
    fn empty_directory_uses_stock_defaults() {
        let tmp = TempDir::new().unwrap();
        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.config, ProjectConfig::default());
        assert!(project.screenshots.is_empty());
        assert!(project.hyperlinks.is_empty());
        assert!(!project.anchors.is_empty());
    }

    #[test]
    fn malformed_mapping_is_fatal() {
        let tmp = project_fixture();
        std::fs::write(tmp.path().join("hyperlink_mapping.json"), "{ nope").unwrap();
        assert!(matches!(
            Project::load(tmp.path()),
            Err(ProjectError::Mapping(_))
        ));
    }
}
