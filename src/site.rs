//! Site converter: instruction parts → MkDocs page tree.
//!
//! ```text
//! docs/
//! ├── images/               # every mapped screenshot, under safe_filename()
//! ├── index.md              # one page per [[pages]] entry
//! └── guide/start/login.md  # links from here get a "../../" prefix
//! ```
//!
//! Pages are regenerated in full on every run. Most source lines pass
//! through verbatim; callouts become admonitions, screenshot references
//! become figures, and `(#anchor)` link targets are rewritten to page paths
//! relative to the page being written.

use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::atomic::write_atomic;
use crate::emit::{self, Diagnostics, Sink, Warning};
use crate::mappings::LinkMap;
use crate::markup::inline::rewrite_links;
use crate::markup::{
    CODE_FENCE, CalloutKind, CodeSegment, ListKind, ParagraphKind, Rules, ScreenshotForm,
    ScreenshotRef, Table, parse_callout,
};
use crate::project::Project;
use crate::screenshots::normalize_filename;
use crate::source::{self, Origin};

static BOLD_PNG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+\.png)\*\*").expect("valid figure regex"));

pub const IMAGES_DIR: &str = "images";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lowercase, spaces to `-`, `ё` to `е`, then keep only word characters,
/// `-` and `.`.
pub fn safe_filename(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .replace('ё', "е")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Directory depth of a page below `docs/`.
pub fn page_depth(dest: &str) -> usize {
    dest.matches('/').count()
}

/// [`Sink`] producing markdown lines for one page.
pub struct SiteSink<'a> {
    anchors: &'a LinkMap,
    /// `"../"` repeated once per directory level of the page.
    prefix: String,
    lines: Vec<String>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> SiteSink<'a> {
    pub fn new(anchors: &'a LinkMap, depth: usize, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            anchors,
            prefix: "../".repeat(depth),
            lines: Vec::new(),
            diagnostics,
        }
    }

    pub fn finish(self) -> String {
        self.lines.join("\n")
    }

    fn pass_through(&mut self, source: &[String]) {
        for line in source {
            let (rewritten, unresolved) = rewrite_links(line, |anchor| {
                self.anchors
                    .resolve(anchor)
                    .map(|path| format!("{}{path}", self.prefix))
            });
            for (anchor, text) in unresolved {
                self.diagnostics
                    .warn(Warning::UnresolvedLink { anchor, text });
            }
            self.lines.push(rewritten);
        }
    }

    fn figure(&mut self, name: &str) {
        self.lines.push(String::new());
        self.lines.push(format!(
            "![{name}]({}{IMAGES_DIR}/{})",
            self.prefix,
            safe_filename(name)
        ));
        self.lines.push(format!("<figcaption>{name}</figcaption>"));
        self.lines.push(String::new());
    }

    fn admonition(&mut self, kind: CalloutKind, text: &str) {
        self.lines.push(String::new());
        self.lines
            .push(format!("!!! {} \"{}\"", kind.admonition(), kind.label()));
        self.lines.push(format!("    {text}"));
        self.lines.push(String::new());
    }

    fn fenced(&mut self, open: &str, code: &[&String], close: Option<&String>) {
        self.lines.push(open.to_string());
        self.lines.extend(code.iter().map(|line| line.to_string()));
        self.lines.extend(close.cloned());
    }
}

impl Sink for SiteSink<'_> {
    type Error = Infallible;

    fn callout(
        &mut self,
        kind: CalloutKind,
        text: &str,
        in_fence: bool,
        _: &[String],
    ) -> Result<(), Infallible> {
        // in-fence callouts are written by code_block at their line
        if !in_fence {
            self.admonition(kind, text);
        }
        Ok(())
    }

    /// Writes the fence verbatim. A callout line inside it becomes an
    /// admonition at the same position, with the fence closed before it and
    /// reopened after it.
    fn code_block(&mut self, _: &[String], source: &[String]) -> Result<(), Infallible> {
        let Some((open, body)) = source.split_first() else {
            return Ok(());
        };
        let (body, close) = match body.split_last() {
            Some((last, rest)) if last.trim() == CODE_FENCE => (rest, Some(last)),
            _ => (body, None),
        };
        let interim_close = close.cloned().unwrap_or_else(|| CODE_FENCE.to_string());
        let mut code: Vec<&String> = Vec::new();
        let mut split = false;
        for line in body {
            match parse_callout(line.trim_end()) {
                Some((kind, text)) => {
                    if !code.is_empty() {
                        self.fenced(open, &code, Some(&interim_close));
                        code.clear();
                    }
                    self.admonition(kind, text);
                    split = true;
                }
                None => code.push(line),
            }
        }
        if !split || !code.is_empty() {
            self.fenced(open, &code, close);
        }
        Ok(())
    }

    fn blank(&mut self, source: &[String]) -> Result<(), Infallible> {
        self.lines.extend(source.iter().cloned());
        Ok(())
    }

    fn heading(
        &mut self,
        _: u8,
        _: &str,
        _: Option<&str>,
        source: &[String],
    ) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }

    fn table(&mut self, _: &Table, source: &[String]) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }

    fn screenshot(&mut self, shot: &ScreenshotRef, source: &[String]) -> Result<(), Infallible> {
        let name = match shot.form {
            ScreenshotForm::Tagged if shot.filename.is_empty() => {
                self.diagnostics.warn(Warning::MalformedScreenshotTag {
                    line: source.join("\n"),
                });
                None
            }
            ScreenshotForm::Tagged => Some(normalize_filename(&shot.filename)),
            ScreenshotForm::Filename => source
                .first()
                .and_then(|line| BOLD_PNG.captures(line))
                .map(|caps| caps[1].to_string()),
            ScreenshotForm::Mention => None,
        };
        match name {
            Some(name) => self.figure(&name),
            None => self.pass_through(source),
        }
        Ok(())
    }

    fn list_item(&mut self, _: ListKind, _: &str, source: &[String]) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }

    fn url(&mut self, _: &str, source: &[String]) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }

    fn inline_code(&mut self, _: &[CodeSegment], source: &[String]) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }

    fn paragraph(&mut self, _: &str, _: ParagraphKind, source: &[String]) -> Result<(), Infallible> {
        self.pass_through(source);
        Ok(())
    }
}

/// Convert one part's text for a page `depth` directories below `docs/`.
pub fn convert_text(
    text: &str,
    depth: usize,
    anchors: &LinkMap,
    rules: Rules<'_>,
    diagnostics: &mut Diagnostics,
) -> String {
    let mut sink = SiteSink::new(anchors, depth, diagnostics);
    match emit::emit_text(&mut sink, text, rules) {
        Ok(_) => {}
        Err(never) => match never {},
    }
    sink.finish()
}

/// Result of copying mapped screenshots into `docs/images/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetReport {
    pub copied: usize,
    /// Mapping entries whose file does not exist.
    pub missing: Vec<String>,
}

/// Copy every mapped screenshot that exists into `docs/images/`.
pub fn copy_screenshots(project: &Project) -> Result<AssetReport, SiteError> {
    let images = project.paths.docs_dir.join(IMAGES_DIR);
    fs::create_dir_all(&images)?;
    let mut report = AssetReport::default();
    for (name, rel) in project.screenshots.iter() {
        let src = project.paths.root.join(rel);
        if src.is_file() {
            fs::copy(&src, images.join(safe_filename(name)))?;
            report.copied += 1;
        } else {
            report.missing.push(name.to_string());
        }
    }
    Ok(report)
}

/// One written page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub source: String,
    pub dest: String,
    pub origin: Origin,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteReport {
    pub docs_dir: PathBuf,
    pub assets: AssetReport,
    pub pages: Vec<PageReport>,
}

/// Copy assets and write every page of the page map.
pub fn build_site(project: &Project) -> Result<SiteReport, SiteError> {
    let assets = copy_screenshots(project)?;
    let placeholder = &project.config.document.placeholder;
    let mut pages = Vec::with_capacity(project.config.pages.len());

    for page in &project.config.pages {
        let mut diagnostics = Diagnostics::default();
        let source = source::read_part_or_placeholder(
            &project.paths.parts_dir,
            &page.source,
            placeholder,
            &mut diagnostics,
        );
        let converted = convert_text(
            &source.text,
            page_depth(&page.dest),
            &project.anchors,
            project.rules(),
            &mut diagnostics,
        );
        write_atomic(&project.paths.docs_dir.join(&page.dest), converted.as_bytes())?;
        pages.push(PageReport {
            source: page.source.clone(),
            dest: page.dest.clone(),
            origin: source.origin,
            diagnostics,
        });
    }

    Ok(SiteReport {
        docs_dir: project.paths.docs_dir.clone(),
        assets,
        pages,
    })
}
