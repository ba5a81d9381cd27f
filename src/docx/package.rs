//! The `.docx` zip package: reading, patching and writing entries.
//!
//! An opened package is kept entry-for-entry. Appending touches exactly four
//! parts (the main document, its relationships, numbering and content types);
//! every other entry is written back byte-identical.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::sync::LazyLock;

use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::DocxError;
use super::xml;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const NUMBERING_PART: &str = "word/numbering.xml";

static BOOKMARK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<w:bookmarkStart w:id="(\d+)" w:name="([^"]*)""#).expect("valid bookmark regex")
});
static DOC_PR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<wp:docPr id="(\d+)""#).expect("valid docPr regex"));
static REL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Id="rId(\d+)""#).expect("valid relationship regex"));
static NUM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<w:num w:numId="(\d+)""#).expect("valid numId regex"));
static MEDIA_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^word/media/image(\d+)\.").expect("valid media regex"));

/// Package entries in archive order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// A complete package with an empty body.
    pub fn template() -> Self {
        let mut package = Self::default();
        package.put(CONTENT_TYPES_PART, xml::content_types_xml().as_bytes().to_vec());
        package.put("_rels/.rels", xml::rels_xml().as_bytes().to_vec());
        package.put(DOCUMENT_PART, xml::document_xml("").into_bytes());
        package.put(DOCUMENT_RELS_PART, xml::word_rels_xml("").into_bytes());
        package.put("word/styles.xml", xml::styles_xml().as_bytes().to_vec());
        package.put(NUMBERING_PART, xml::numbering_xml("").into_bytes());
        package.put("word/settings.xml", xml::settings_xml().as_bytes().to_vec());
        package
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Self::default();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            package.entries.push((name, data));
        }
        if package.get(DOCUMENT_PART).is_none() {
            return Err(DocxError::Malformed(format!("missing {DOCUMENT_PART}")));
        }
        Ok(package)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part decoded as UTF-8 XML.
    pub fn text(&self, name: &str) -> Result<String, DocxError> {
        let bytes = self
            .get(name)
            .ok_or_else(|| DocxError::Malformed(format!("missing {name}")))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DocxError::Malformed(format!("{name} is not UTF-8")))
    }

    /// Replace an entry in place, or append it.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Serialize with deflate and a fixed timestamp, so equal entries give
    /// equal bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// Insert `insert` before the last occurrence of the first marker found.
pub fn insert_before_last(
    haystack: &str,
    markers: &[&str],
    insert: &str,
) -> Result<String, DocxError> {
    let pos = markers
        .iter()
        .find_map(|m| haystack.rfind(m))
        .ok_or_else(|| DocxError::Malformed(format!("none of {markers:?} found")))?;
    let mut out = String::with_capacity(haystack.len() + insert.len());
    out.push_str(&haystack[..pos]);
    out.push_str(insert);
    out.push_str(&haystack[pos..]);
    Ok(out)
}

/// Add a `<Default>` content type for `extension` unless one is declared.
pub fn ensure_default_content_type(
    types: &str,
    extension: &str,
    mime: &str,
) -> Result<String, DocxError> {
    if types.contains(&format!(r#"Extension="{extension}""#)) {
        return Ok(types.to_string());
    }
    insert_before_last(
        types,
        &["</Types>"],
        &format!(r#"<Default Extension="{extension}" ContentType="{mime}"/>"#),
    )
}

fn max_capture(re: &Regex, text: &str) -> u32 {
    re.captures_iter(text)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// Hands out identifiers above everything already in the package.
#[derive(Debug, Clone, PartialEq)]
pub struct IdAllocator {
    next_bookmark: u32,
    next_doc_pr: u32,
    next_rel: u32,
    next_media: u32,
    next_num: u32,
    /// Escaped bookmark names already present.
    bookmark_names: BTreeSet<String>,
}

impl IdAllocator {
    pub fn scan(package: &Package) -> Result<Self, DocxError> {
        let document = package.text(DOCUMENT_PART)?;
        let rels = package.text(DOCUMENT_RELS_PART).unwrap_or_default();
        let numbering = package.text(NUMBERING_PART).unwrap_or_default();

        let mut next_bookmark = 0;
        let mut bookmark_names = BTreeSet::new();
        for caps in BOOKMARK_START.captures_iter(&document) {
            if let Ok(id) = caps[1].parse::<u32>() {
                next_bookmark = next_bookmark.max(id + 1);
            }
            bookmark_names.insert(caps[2].to_string());
        }
        let next_media = package
            .names()
            .filter_map(|n| MEDIA_NUMBER.captures(n))
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            next_bookmark,
            next_doc_pr: max_capture(&DOC_PR_ID, &document) + 1,
            next_rel: max_capture(&REL_ID, &rels).max(xml::TEMPLATE_MAX_REL_ID) + 1,
            next_media,
            next_num: max_capture(&NUM_ID, &numbering).max(xml::TEMPLATE_MAX_NUM_ID) + 1,
            bookmark_names,
        })
    }

    /// A fresh bookmark id, or `None` when `name` is already taken.
    pub fn bookmark(&mut self, name: &str) -> Option<u32> {
        if !self.bookmark_names.insert(xml::xml_escape_text(name)) {
            return None;
        }
        let id = self.next_bookmark;
        self.next_bookmark += 1;
        Some(id)
    }

    pub fn doc_pr(&mut self) -> u32 {
        let id = self.next_doc_pr;
        self.next_doc_pr += 1;
        id
    }

    pub fn relationship(&mut self) -> String {
        let id = self.next_rel;
        self.next_rel += 1;
        format!("rId{id}")
    }

    pub fn media_number(&mut self) -> u32 {
        let n = self.next_media;
        self.next_media += 1;
        n
    }

    pub fn num_id(&mut self) -> u32 {
        let id = self.next_num;
        self.next_num += 1;
        id
    }
}
