//! Document pipeline: sections and parts → `.docx`, incrementally.
//!
//! Reads the progress record, decides whether to append to the existing
//! document or start a new one, renders every requested part that is not
//! yet done, then commits.
//!
//! # Rebuild vs. append
//!
//! A new document (cover and contents included) is created when any of
//! these hold; otherwise the existing one is opened and appended to:
//!
//! | Condition | [`CreateReason`] |
//! |-----------|------------------|
//! | `--reset` (progress file and document deleted first) | `Reset` |
//! | `--force` | `Forced` |
//! | progress record unusable or not matching the document | `Stale` |
//! | no document on disk | `NoDocument` |
//!
//! Creating always clears the record, so every requested part is rendered.
//! A stale rebuild ignores `--sections` and renders every configured section,
//! so sections always appear in declared order.
//!
//! # Skip rules
//!
//! - A section marked done is skipped whole.
//! - Parts marked done are skipped without being read.
//! - A section heading is written only when none of its parts were done
//!   before this run, so finishing a section across runs never repeats it.
//! - A section that rendered anything ends with a page break.
//!
//! # Commit order
//!
//! The document is saved first (atomically) and its SHA-256 stored in the
//! record, then the record is saved (atomically). A crash between the two
//! leaves a fingerprint mismatch that the next run answers with a rebuild,
//! so no part is ever appended twice.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::SectionSpec;
use crate::docx::{self, DocxError, DocxSink, Document, RenderContext};
use crate::emit::{self, Diagnostics};
use crate::naming::display_title;
use crate::progress::{self, ProgressError, ProgressRecord, Staleness};
use crate::project::Project;
use crate::source::{self, Origin};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Document error: {0}")]
    Docx(#[from] DocxError),
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),
}

/// What the `docx` command was asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentRequest {
    /// Section keys to render; empty means all, in configured order.
    pub sections: Vec<String>,
    pub force: bool,
    pub reset: bool,
    /// Cover page date, already formatted.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateReason {
    NoDocument,
    Forced,
    Reset,
    Stale(Staleness),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Created(CreateReason),
    Appended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartOutcome {
    Rendered { origin: Origin, blocks: usize },
    AlreadyDone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartReport {
    pub key: String,
    pub title: String,
    pub outcome: PartOutcome,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Heading and every part written in this run.
    Written,
    /// Some parts were done before; the rest were appended without a heading.
    Continued,
    AlreadyDone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionReport {
    pub key: String,
    pub title: String,
    pub outcome: SectionOutcome,
    pub parts: Vec<PartReport>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub document: PathBuf,
    pub progress_file: PathBuf,
    pub mode: RunMode,
    /// Cover and contents diagnostics (new documents only).
    pub front_matter: Diagnostics,
    pub sections: Vec<SectionReport>,
    pub unknown_sections: Vec<String>,
    /// False when nothing was appended and the document was left untouched.
    pub saved: bool,
    pub completed_parts: usize,
}

impl DocumentReport {
    /// Parts rendered in this run.
    pub fn rendered_parts(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.parts)
            .filter(|p| matches!(p.outcome, PartOutcome::Rendered { .. }))
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.front_matter.warnings.len()
            + self
                .sections
                .iter()
                .map(|s| {
                    s.diagnostics.warnings.len()
                        + s.parts.iter().map(|p| p.diagnostics.warnings.len()).sum::<usize>()
                })
                .sum::<usize>()
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Load the record and decide between appending and rebuilding.
fn load_state(
    project: &Project,
    request: &DocumentRequest,
) -> Result<(ProgressRecord, Option<CreateReason>), GenerateError> {
    let paths = &project.paths;
    if request.reset {
        remove_if_exists(&paths.progress_file)?;
        remove_if_exists(&paths.output_document)?;
    }
    let (record, stale) = match ProgressRecord::load(&paths.progress_file) {
        Err(staleness) => (ProgressRecord::empty(), Some(staleness)),
        Ok(record) => match record.check_document(&paths.output_document)? {
            Some(staleness) => (ProgressRecord::empty(), Some(staleness)),
            None => (record, None),
        },
    };
    let reason = if request.reset {
        Some(CreateReason::Reset)
    } else if request.force {
        Some(CreateReason::Forced)
    } else if let Some(staleness) = stale {
        Some(CreateReason::Stale(staleness))
    } else if !paths.output_document.is_file() {
        Some(CreateReason::NoDocument)
    } else {
        None
    };
    Ok((record, reason))
}

/// Requested sections in order, and the keys that matched none.
fn select_sections<'a>(
    project: &'a Project,
    requested: &[String],
) -> (Vec<&'a SectionSpec>, Vec<String>) {
    if requested.is_empty() {
        return (project.config.sections.iter().collect(), Vec::new());
    }
    let mut found = Vec::new();
    let mut unknown = Vec::new();
    for key in requested {
        match project.config.section(key) {
            Some(section) => found.push(section),
            None => unknown.push(key.clone()),
        }
    }
    (found, unknown)
}

fn render_section(
    project: &Project,
    ctx: &RenderContext<'_>,
    doc: &mut Document,
    record: &mut ProgressRecord,
    section: &SectionSpec,
) -> Result<SectionReport, DocxError> {
    let mut report = SectionReport {
        key: section.key.clone(),
        title: section.title.clone(),
        outcome: SectionOutcome::AlreadyDone,
        parts: Vec::new(),
        diagnostics: Diagnostics::default(),
    };
    if record.is_section_done(&section.key) {
        return Ok(report);
    }

    let fresh = !section.parts.iter().any(|p| record.is_part_done(p));
    if fresh {
        DocxSink::new(doc, ctx, &mut report.diagnostics).section_heading(&section.title);
    }

    let mut rendered_any = false;
    for key in &section.parts {
        let mut part = PartReport {
            key: key.clone(),
            title: display_title(key),
            outcome: PartOutcome::AlreadyDone,
            diagnostics: Diagnostics::default(),
        };
        if !record.is_part_done(key) {
            let source = source::read_part_or_placeholder(
                &project.paths.parts_dir,
                key,
                &project.config.document.placeholder,
                &mut part.diagnostics,
            );
            let blocks = {
                let mut sink = DocxSink::new(doc, ctx, &mut part.diagnostics);
                emit::emit_text(&mut sink, &source.text, project.rules())?
            };
            record.mark_part_done(key);
            rendered_any = true;
            part.outcome = PartOutcome::Rendered {
                origin: source.origin,
                blocks,
            };
        }
        report.parts.push(part);
    }

    if rendered_any {
        DocxSink::new(doc, ctx, &mut report.diagnostics).page_break();
    }
    record.mark_section_done(&section.key);
    report.outcome = if fresh {
        SectionOutcome::Written
    } else {
        SectionOutcome::Continued
    };
    Ok(report)
}

/// Run the document pipeline.
pub fn generate_document(
    project: &Project,
    request: &DocumentRequest,
) -> Result<DocumentReport, GenerateError> {
    let paths = &project.paths;
    let (mut record, reason) = load_state(project, request)?;

    let mut front_matter = Diagnostics::default();
    let (mut doc, mode) = match reason {
        Some(reason) => {
            record.reset();
            let mut doc = Document::create()?;
            docx::cover::write_front_matter(
                &mut doc,
                &project.config.document,
                &project.config.sections,
                &paths.logo_dir,
                &request.date,
                &mut front_matter,
            );
            (doc, RunMode::Created(reason))
        }
        None => (Document::open(&paths.output_document)?, RunMode::Appended),
    };

    let ctx = RenderContext {
        screenshots: project.resolver(),
        hyperlinks: &project.hyperlinks,
        image_width_in: project.config.document.image_width_inches,
    };
    let requested: &[String] = match mode {
        RunMode::Created(CreateReason::Stale(_)) => &[],
        _ => &request.sections,
    };
    let (targets, unknown_sections) = select_sections(project, requested);
    let mut sections = Vec::with_capacity(targets.len());
    for section in targets {
        sections.push(render_section(project, &ctx, &mut doc, &mut record, section)?);
    }

    let saved = doc.is_modified();
    if saved {
        let bytes = doc.save(&paths.output_document)?;
        record.document_sha256 = Some(progress::hash_bytes(&bytes));
    }
    record.save(&paths.progress_file)?;

    Ok(DocumentReport {
        document: paths.output_document.clone(),
        progress_file: paths.progress_file.clone(),
        mode,
        front_matter,
        sections,
        unknown_sections,
        saved,
        completed_parts: record.completed_parts.len(),
    })
}
