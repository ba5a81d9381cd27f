//! Document writer.
//!
//! A [`Document`] is either a fresh package built from fixed templates or an
//! existing `.docx` opened for appending. New content is collected as
//! [`BodyElement`]s and spliced into the package on save:
//!
//! | Part | On append |
//! |------|-----------|
//! | `word/document.xml` | new body inserted before the final `w:sectPr` |
//! | `word/_rels/document.xml.rels` | image relationships added |
//! | `word/numbering.xml` | one `w:num` per numbered list added |
//! | `[Content_Types].xml` | image defaults ensured |
//! | `word/media/*` | new images added; existing ones kept |
//! | everything else | copied unchanged |
//!
//! Identifiers (bookmarks, drawings, relationships, media, lists) continue
//! above the ones already in the package, so repeated appends never collide.

pub mod cover;
pub mod model;
mod package;
pub mod sink;
pub mod xml;

use std::path::Path;

use thiserror::Error;

use crate::atomic::write_atomic;
pub use model::{Align, BodyElement, Bookmark, Cell, Inline, Paragraph, Picture, RunProps, TableModel};
use package::{IdAllocator, Package};
pub use sink::{DocxSink, RenderContext};

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// A document being built or appended to.
#[derive(Debug)]
pub struct Document {
    package: Package,
    ids: IdAllocator,
    body: Vec<BodyElement>,
    relationships: String,
    nums: String,
    media: Vec<(String, Vec<u8>)>,
}

impl Document {
    /// An empty document: page setup, styles and numbering, no body.
    pub fn create() -> Result<Self, DocxError> {
        Self::from_package(Package::template())
    }

    /// Open an existing `.docx` for appending.
    pub fn open(path: &Path) -> Result<Self, DocxError> {
        let bytes = std::fs::read(path)?;
        Self::from_package(Package::from_bytes(&bytes)?)
    }

    fn from_package(package: Package) -> Result<Self, DocxError> {
        let ids = IdAllocator::scan(&package)?;
        Ok(Self {
            package,
            ids,
            body: Vec::new(),
            relationships: String::new(),
            nums: String::new(),
            media: Vec::new(),
        })
    }

    pub fn push(&mut self, element: BodyElement) {
        self.body.push(element);
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.body.push(BodyElement::Paragraph(paragraph));
    }

    /// Elements added since the document was created or opened.
    pub fn appended(&self) -> &[BodyElement] {
        &self.body
    }

    /// True once anything was added.
    pub fn is_modified(&self) -> bool {
        !self.body.is_empty()
    }

    /// Register a bookmark; `None` if the name already exists in the document.
    pub fn bookmark(&mut self, name: &str) -> Option<Bookmark> {
        self.ids.bookmark(name).map(|id| Bookmark {
            id,
            name: name.to_string(),
        })
    }

    /// A new numbering instance for a decimal list starting at 1.
    pub fn numbered_list(&mut self) -> u32 {
        let num_id = self.ids.num_id();
        self.nums.push_str(&xml::decimal_num_xml(num_id));
        num_id
    }

    /// Embed a PNG or JPEG file `width_in` inches wide.
    pub fn add_image(&mut self, path: &Path, width_in: f64) -> Result<Picture, DocxError> {
        let data = std::fs::read(path)?;
        let extension = match image::guess_format(&data)? {
            image::ImageFormat::Png => "png",
            image::ImageFormat::Jpeg => "jpeg",
            other => return Err(DocxError::UnsupportedImage(format!("{other:?}"))),
        };
        let (w, h) = image::image_dimensions(path)?;
        let (cx, cy) = model::extent_for(w, h, width_in);

        let number = self.ids.media_number();
        let target = format!("media/image{number}.{extension}");
        let rel_id = self.ids.relationship();
        self.relationships
            .push_str(&xml::image_relationship_xml(&rel_id, &target));
        self.media.push((format!("word/{target}"), data));

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image{number}"));
        Ok(Picture {
            rel_id,
            doc_pr_id: self.ids.doc_pr(),
            name,
            cx,
            cy,
        })
    }

    /// The full package with everything appended so far.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut package = self.package.clone();
        if !self.body.is_empty() {
            let document = package.text(package::DOCUMENT_PART)?;
            let document = package::insert_before_last(
                &document,
                &["<w:sectPr", "</w:body>"],
                &xml::body_xml(&self.body),
            )?;
            package.put(package::DOCUMENT_PART, document.into_bytes());
        }
        if !self.relationships.is_empty() {
            let rels = package.text(package::DOCUMENT_RELS_PART)?;
            let rels =
                package::insert_before_last(&rels, &["</Relationships>"], &self.relationships)?;
            package.put(package::DOCUMENT_RELS_PART, rels.into_bytes());
        }
        if !self.nums.is_empty() {
            let numbering = package.text(package::NUMBERING_PART)?;
            let numbering =
                package::insert_before_last(&numbering, &["</w:numbering>"], &self.nums)?;
            package.put(package::NUMBERING_PART, numbering.into_bytes());
        }
        if !self.media.is_empty() {
            let mut types = package.text(package::CONTENT_TYPES_PART)?;
            for (name, _) in &self.media {
                if name.ends_with(".png") {
                    types = package::ensure_default_content_type(&types, "png", "image/png")?;
                } else {
                    types = package::ensure_default_content_type(&types, "jpeg", "image/jpeg")?;
                }
            }
            package.put(package::CONTENT_TYPES_PART, types.into_bytes());
            for (name, data) in &self.media {
                package.put(name, data.clone());
            }
        }
        package.to_bytes()
    }

    /// Write the package atomically.
    pub fn save(&self, path: &Path) -> Result<Vec<u8>, DocxError> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;
        Ok(bytes)
    }
}

/// Read one part of a saved document as text.
pub fn read_part(path: &Path, part: &str) -> Result<String, DocxError> {
    let bytes = std::fs::read(path)?;
    Package::from_bytes(&bytes)?.text(part)
}

/// The `word/document.xml` of a saved document.
pub fn read_document_xml(path: &Path) -> Result<String, DocxError> {
    read_part(path, package::DOCUMENT_PART)
}
