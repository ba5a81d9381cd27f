//! # Instruction Gen
//!
//! Builds a user manual from hand-written markdown "instruction parts". Each
//! part is published twice: as a page of an MkDocs site and as a chapter of a
//! single `.docx` document that grows run by run.
//!
//! # Architecture: One Classifier, Two Sinks
//!
//! ```text
//! parts/*.md ─→ source ─→ markup::classify ─→ emit ─┬─→ site::SiteSink  ─→ docs/**/*.md
//!                                                   └─→ docx::DocxSink  ─→ manual.docx
//! ```
//!
//! Both outputs consume the same closed [`markup::Block`] stream. A line is
//! classified once, with one precedence order, and each sink decides how to
//! render the block. The document side adds a progress record so later runs
//! only append what is new.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `instruction.toml` loading, merging over stock defaults, validation |
//! | [`mappings`] | JSON screenshot, hyperlink and anchor tables |
//! | [`project`] | Config plus mapping tables, loaded once per run |
//! | [`naming`] | `NN_Words` part key parser for titles and listings |
//! | [`source`] | Part reader: `_NEW` revision, then base file, then placeholder |
//! | [`screenshots`] | Ordered screenshot resolution tiers |
//! | [`markup`] | Line classification, inline spans, tables |
//! | [`emit`] | `Sink` trait, block dispatch, warnings and traces |
//! | [`site`] | Markdown sink, screenshot copy, page loop |
//! | [`docx`] | Body model, WordprocessingML, package append, cover page |
//! | [`progress`] | Persisted completion record with document fingerprint |
//! | [`generate`] | Section/part loop, append vs. rebuild, commit order |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Append, Don't Regenerate
//!
//! Parts are written by hand over weeks, and the document is reviewed as it
//! grows. A run opens the existing `.docx`, appends the body of every part
//! not yet recorded as done, and leaves earlier content byte-for-byte alone.
//! Styles, numbering and embedded media from previous runs survive because
//! the package is edited in place rather than rebuilt.
//!
//! ## Fingerprinted Progress
//!
//! The progress record stores the SHA-256 of the document it describes. If
//! the two disagree (a crash between saves, a hand-edited document) the next
//! run rebuilds from scratch instead of appending to something it cannot
//! trust.
//!
//! ## Warnings, Not Failures
//!
//! A missing screenshot, an unknown anchor or a malformed table never stops a
//! run. Sinks record a [`emit::Warning`] and carry on; only configuration,
//! mapping and I/O problems are errors.

pub mod atomic;
pub mod config;
pub mod docx;
pub mod emit;
pub mod generate;
pub mod mappings;
pub mod markup;
pub mod naming;
pub mod output;
pub mod progress;
pub mod project;
pub mod screenshots;
pub mod site;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helpers;
