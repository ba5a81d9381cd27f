//! Progress record for incremental document builds.
//!
//! Rendering every part into the document takes a while once screenshots are
//! embedded, and a run is often interrupted. The progress record lets the
//! next run append only what is missing.
//!
//! # Design
//!
//! The record holds two insertion-ordered key sets:
//!
//! - **completed parts**: a part key is added only after its content was
//!   appended to the in-memory document;
//! - **completed sections**: a section key is added only after every one of
//!   its parts ended the run marked done.
//!
//! ## Fingerprint
//!
//! The record also stores the SHA-256 of the document it describes. The
//! document is saved first and the record second; if the process dies in
//! between, the stored hash no longer matches the document on disk. Such a
//! record is treated as stale and the next run rebuilds the document from
//! scratch instead of appending on top of content it cannot account for.
//!
//! A record is also stale when it is unreadable, has a different format
//! version, or lists completed work for a document that no longer exists.
//!
//! ## Storage
//!
//! Pretty-printed JSON at `scripts/progress.json` (configurable), rewritten
//! in full at the end of every successful run.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::atomic::write_atomic;

/// Version of the progress file format. Bump this to force a rebuild when
/// the format or its meaning changes.
pub const PROGRESS_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted completion state of the document build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub version: u32,
    pub completed_sections: Vec<String>,
    pub completed_parts: Vec<String>,
    /// SHA-256 of the document this record describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_sha256: Option<String>,
}

/// Why a persisted record cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The file exists but is not a valid record.
    Corrupt,
    /// The file was written by a different format version.
    VersionMismatch { found: u32 },
    /// The record lists completed work but the document is gone.
    DocumentMissing,
    /// The document on disk is not the one the record describes.
    FingerprintMismatch,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::Corrupt => write!(f, "progress file is unreadable"),
            Staleness::VersionMismatch { found } => write!(
                f,
                "progress file version {found} (expected {PROGRESS_VERSION})"
            ),
            Staleness::DocumentMissing => {
                write!(f, "progress lists completed parts but the document is missing")
            }
            Staleness::FingerprintMismatch => {
                write!(f, "document does not match the recorded fingerprint")
            }
        }
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl ProgressRecord {
    pub fn empty() -> Self {
        Self {
            version: PROGRESS_VERSION,
            completed_sections: Vec::new(),
            completed_parts: Vec::new(),
            document_sha256: None,
        }
    }

    /// Load a record from disk.
    ///
    /// A missing file yields an empty record. A file that cannot be read as a
    /// record of the current version is reported as stale.
    pub fn load(path: &Path) -> Result<Self, Staleness> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(_) => return Err(Staleness::Corrupt),
        };
        let record: Self = serde_json::from_str(&content).map_err(|_| Staleness::Corrupt)?;
        if record.version != PROGRESS_VERSION {
            return Err(Staleness::VersionMismatch {
                found: record.version,
            });
        }
        Ok(record)
    }

    /// Check the record against the document it claims to describe.
    ///
    /// An existing document must carry the recorded fingerprint; a record with
    /// completed work requires the document to exist.
    pub fn check_document(&self, document: &Path) -> io::Result<Option<Staleness>> {
        if !document.exists() {
            if self.is_empty() {
                return Ok(None);
            }
            return Ok(Some(Staleness::DocumentMissing));
        }
        let actual = hash_file(document)?;
        if self.document_sha256.as_deref() == Some(actual.as_str()) {
            Ok(None)
        } else {
            Ok(Some(Staleness::FingerprintMismatch))
        }
    }

    /// Save the record atomically, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<(), ProgressError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.completed_sections.is_empty() && self.completed_parts.is_empty()
    }

    pub fn is_part_done(&self, key: &str) -> bool {
        self.completed_parts.iter().any(|k| k == key)
    }

    pub fn is_section_done(&self, key: &str) -> bool {
        self.completed_sections.iter().any(|k| k == key)
    }

    /// Record a part as done. Inserting an existing key is a no-op.
    pub fn mark_part_done(&mut self, key: &str) {
        if !self.is_part_done(key) {
            self.completed_parts.push(key.to_string());
        }
    }

    /// Record a section as done. Inserting an existing key is a no-op.
    pub fn mark_section_done(&mut self, key: &str) {
        if !self.is_section_done(key) {
            self.completed_sections.push(key.to_string());
        }
    }

    /// Forget all completed work and the document fingerprint.
    pub fn reset(&mut self) {
        self.completed_sections.clear();
        self.completed_parts.clear();
        self.document_sha256 = None;
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// SHA-256 hash of a byte buffer, returned as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
