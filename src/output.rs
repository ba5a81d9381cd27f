//! CLI output formatting for both pipelines.
//!
//! Output leads with what was built (section and part titles, page
//! destinations); file origins, warnings and traces follow as indented
//! context lines.
//!
//! # Output Format
//!
//! ## Document
//!
//! ```text
//! Document: Финальная_инструкция.docx (new: no document yet)
//! РАЗДЕЛ I: СТАРТ [intro]
//!     001 Первые шаги (base)
//!     002 Вход (revision)
//!         warning: unresolved link #faq ("FAQ")
//! РАЗДЕЛ II: FAQ [faq] already done
//!
//! Rendered 2 parts, 1 warning; 3 parts complete
//! ```
//!
//! ## Site
//!
//! ```text
//! Images: 12 copied, 1 missing
//!     missing: Старое_меню.png
//! 01_Первые_шаги → index.md
//! 02_Вход → guide/start/login.md (revision)
//!
//! Wrote 2 pages to docs, 0 warnings
//! ```
//!
//! Traces (bookmarks, resolved links and screenshots) appear only with
//! `--verbose`.
//!
//! # Architecture
//!
//! Every report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ProjectConfig;
use crate::emit::{Diagnostics, Trace, Warning};
use crate::generate::{
    CreateReason, DocumentReport, PartOutcome, RunMode, SectionOutcome, SectionReport,
};
use crate::naming::display_title;
use crate::progress::ProgressRecord;
use crate::screenshots::Tier;
use crate::site::SiteReport;
use crate::source::Origin;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Revision => "revision",
        Origin::Base => "base",
        Origin::Placeholder => "placeholder",
    }
}

fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::Exact => "exact",
        Tier::MappedSubstring => "mapped substring",
        Tier::DirectoryWalk => "directory walk",
    }
}

pub fn format_warning(warning: &Warning) -> String {
    let detail = match warning {
        Warning::UnresolvedLink { anchor, text } => {
            format!("unresolved link {anchor} (\"{text}\")")
        }
        Warning::ScreenshotNotFound { name } => format!("screenshot not found: {name}"),
        Warning::MalformedScreenshotTag { line } => format!("malformed screenshot tag: {line}"),
        Warning::ImageUnreadable { path, reason } => {
            format!("unreadable image {}: {reason}", path.display())
        }
        Warning::RowsDropped { count } => {
            format!("table: {} with wrong cell count dropped", plural(*count, "row"))
        }
        Warning::DuplicateBookmark { name } => format!("duplicate bookmark {name} skipped"),
        Warning::SourceUnreadable { key, reason } => {
            format!("cannot read {key}: {reason}; placeholder used")
        }
    };
    format!("warning: {detail}")
}

pub fn format_trace(trace: &Trace) -> String {
    match trace {
        Trace::Bookmark { name } => format!("bookmark {name}"),
        Trace::LinkResolved { anchor, target } => format!("link {anchor} \u{2192} {target}"),
        Trace::ScreenshotResolved { name, path, tier } => format!(
            "screenshot {name} \u{2192} {} ({})",
            path.display(),
            tier_label(*tier)
        ),
        Trace::ScreenshotSkipped { name } => format!("screenshot mention skipped: {name}"),
    }
}

/// Warnings, then traces when `verbose`, at `depth`.
fn diagnostic_lines(diagnostics: &Diagnostics, depth: usize, verbose: bool) -> Vec<String> {
    let pad = indent(depth);
    let mut lines: Vec<String> = diagnostics
        .warnings
        .iter()
        .map(|w| format!("{pad}{}", format_warning(w)))
        .collect();
    if verbose {
        lines.extend(
            diagnostics
                .traces
                .iter()
                .map(|t| format!("{pad}{}", format_trace(t))),
        );
    }
    lines
}

// ============================================================================
// Section listing
// ============================================================================

/// Configured sections and their parts, as `docx --list` shows them.
///
/// ```text
/// Available sections:
///   intro: РАЗДЕЛ I: СТАРТ
///       - 01_Первые_шаги
/// ```
pub fn format_sections(config: &ProjectConfig) -> Vec<String> {
    let mut lines = vec!["Available sections:".to_string()];
    for section in &config.sections {
        lines.push(format!("  {}: {}", section.key, section.title));
        lines.extend(section.parts.iter().map(|p| format!("      - {p}")));
    }
    lines
}

pub fn print_sections(config: &ProjectConfig) {
    for line in format_sections(config) {
        println!("{}", line);
    }
}

/// Per-part status: source file in use and whether the document has it.
///
/// ```text
/// РАЗДЕЛ I: СТАРТ [intro] done
///     001 Первые шаги (base) done
///     002 Вход (revision) pending
/// ```
pub fn format_status<F>(config: &ProjectConfig, record: &ProgressRecord, locate: F) -> Vec<String>
where
    F: Fn(&str) -> Origin,
{
    let mark = |done: bool| if done { "done" } else { "pending" };
    let mut lines = Vec::new();
    let mut number = 0;
    for section in &config.sections {
        lines.push(format!(
            "{} [{}] {}",
            section.title,
            section.key,
            mark(record.is_section_done(&section.key))
        ));
        for part in &section.parts {
            number += 1;
            lines.push(format!(
                "{}{} {} ({}) {}",
                indent(1),
                format_index(number),
                display_title(part),
                origin_label(locate(part)),
                mark(record.is_part_done(part))
            ));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "{} of {} complete",
        plural(record.completed_parts.len(), "part"),
        number
    ));
    lines
}

pub fn print_status<F>(config: &ProjectConfig, record: &ProgressRecord, locate: F)
where
    F: Fn(&str) -> Origin,
{
    for line in format_status(config, record, locate) {
        println!("{}", line);
    }
}

// ============================================================================
// Document output
// ============================================================================

fn mode_label(mode: &RunMode) -> String {
    match mode {
        RunMode::Appended => "appending".to_string(),
        RunMode::Created(CreateReason::NoDocument) => "new: no document yet".to_string(),
        RunMode::Created(CreateReason::Forced) => "new: --force".to_string(),
        RunMode::Created(CreateReason::Reset) => "new: --reset".to_string(),
        RunMode::Created(CreateReason::Stale(staleness)) => {
            format!("rebuilt, all sections: {staleness}")
        }
    }
}

fn section_lines(section: &SectionReport, verbose: bool) -> Vec<String> {
    let header = format!("{} [{}]", section.title, section.key);
    let header = match section.outcome {
        SectionOutcome::AlreadyDone => format!("{header} already done"),
        SectionOutcome::Continued => format!("{header} continued"),
        SectionOutcome::Written => header,
    };
    let mut lines = vec![header];
    lines.extend(diagnostic_lines(&section.diagnostics, 1, verbose));

    for (i, part) in section.parts.iter().enumerate() {
        let label = format!("{}{} {}", indent(1), format_index(i + 1), part.title);
        match &part.outcome {
            PartOutcome::Rendered { origin, blocks } if verbose => lines.push(format!(
                "{label} ({}, {})",
                origin_label(*origin),
                plural(*blocks, "block")
            )),
            PartOutcome::Rendered { origin, .. } => {
                lines.push(format!("{label} ({})", origin_label(*origin)))
            }
            PartOutcome::AlreadyDone => lines.push(format!("{label} already done")),
        }
        lines.extend(diagnostic_lines(&part.diagnostics, 2, verbose));
    }
    lines
}

/// Format a document run: mode, per-section part lines, totals.
pub fn format_document_report(report: &DocumentReport, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Document: {} ({})",
        report.document.display(),
        mode_label(&report.mode)
    )];
    lines.extend(diagnostic_lines(&report.front_matter, 1, verbose));
    for key in &report.unknown_sections {
        lines.push(format!("error: unknown section {key}, skipped"));
    }
    for section in &report.sections {
        lines.extend(section_lines(section, verbose));
    }

    lines.push(String::new());
    let mut summary = format!(
        "Rendered {}, {}; {} complete",
        plural(report.rendered_parts(), "part"),
        plural(report.warning_count(), "warning"),
        plural(report.completed_parts, "part")
    );
    if !report.saved {
        summary.push_str(" (document unchanged)");
    }
    lines.push(summary);
    lines
}

pub fn print_document_report(report: &DocumentReport, verbose: bool) {
    for line in format_document_report(report, verbose) {
        println!("{}", line);
    }
}

// ============================================================================
// Site output
// ============================================================================

/// Format a site run: asset copy summary, one line per page, totals.
pub fn format_site_report(report: &SiteReport, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "Images: {} copied, {} missing",
        report.assets.copied,
        report.assets.missing.len()
    )];
    lines.extend(
        report
            .assets
            .missing
            .iter()
            .map(|name| format!("{}missing: {name}", indent(1))),
    );

    let mut warnings = 0;
    for page in &report.pages {
        let line = format!("{} \u{2192} {}", page.source, page.dest);
        lines.push(match page.origin {
            Origin::Base => line,
            other => format!("{line} ({})", origin_label(other)),
        });
        lines.extend(diagnostic_lines(&page.diagnostics, 1, verbose));
        warnings += page.diagnostics.warnings.len();
    }

    lines.push(String::new());
    lines.push(format!(
        "Wrote {} to {}, {}",
        plural(report.pages.len(), "page"),
        report.docs_dir.display(),
        plural(warnings, "warning")
    ));
    lines
}

pub fn print_site_report(report: &SiteReport, verbose: bool) {
    for line in format_site_report(report, verbose) {
        println!("{}", line);
    }
}
