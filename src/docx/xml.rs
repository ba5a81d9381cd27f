//! WordprocessingML serialization.
//!
//! Body elements are written as XML fragments; the package parts that never
//! change between runs (styles, numbering, settings, relationships) are
//! fixed templates. Presentation constants live here and nowhere else.

use std::fmt::Write as _;

use super::model::{BodyElement, Cell, Inline, Paragraph, Picture, RunProps, TableModel};

pub const NS_WORDPROCESSING: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const REL_TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Numbering instance used by bullet lists at every level.
pub const BULLET_NUM_ID: u32 = 1;
/// Abstract numbering definition for decimal lists; each list gets its own
/// `w:num` pointing at it so numbering restarts.
pub const DECIMAL_ABSTRACT_ID: u32 = 1;
/// Highest `w:numId` defined by the numbering template.
pub const TEMPLATE_MAX_NUM_ID: u32 = 1;

pub fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// Body
// ============================================================================

pub fn body_xml(elements: &[BodyElement]) -> String {
    let mut out = String::new();
    for element in elements {
        match element {
            BodyElement::Paragraph(p) => paragraph_xml(p, &mut out),
            BodyElement::Table(t) => table_xml(t, &mut out),
            BodyElement::TableOfContents { placeholder } => toc_xml(placeholder, &mut out),
        }
    }
    out
}

fn paragraph_xml(p: &Paragraph, out: &mut String) {
    out.push_str("<w:p>");
    let has_props = p.style.is_some()
        || p.numbering.is_some()
        || p.spacing.is_some()
        || p.indent_left.is_some()
        || p.align.is_some();
    if has_props {
        out.push_str("<w:pPr>");
        if let Some(style) = p.style {
            let _ = write!(out, r#"<w:pStyle w:val="{style}"/>"#);
        }
        if let Some(num) = p.numbering {
            let _ = write!(
                out,
                r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
                num.level, num.num_id
            );
        }
        if let Some((before, after)) = p.spacing {
            let _ = write!(out, r#"<w:spacing w:before="{before}" w:after="{after}"/>"#);
        }
        if let Some(left) = p.indent_left {
            let _ = write!(out, r#"<w:ind w:left="{left}"/>"#);
        }
        if let Some(align) = p.align {
            let _ = write!(out, r#"<w:jc w:val="{}"/>"#, align.as_str());
        }
        out.push_str("</w:pPr>");
    }
    if let Some(b) = &p.bookmark {
        let _ = write!(
            out,
            r#"<w:bookmarkStart w:id="{}" w:name="{}"/>"#,
            b.id,
            xml_escape_text(&b.name)
        );
    }
    for inline in &p.inlines {
        inline_xml(inline, out);
    }
    if let Some(b) = &p.bookmark {
        let _ = write!(out, r#"<w:bookmarkEnd w:id="{}"/>"#, b.id);
    }
    out.push_str("</w:p>");
}

fn run_props_xml(props: &RunProps, out: &mut String) {
    if props.is_plain() {
        return;
    }
    out.push_str("<w:rPr>");
    if let Some(style) = props.char_style {
        let _ = write!(out, r#"<w:rStyle w:val="{style}"/>"#);
    }
    if let Some(font) = props.font {
        let _ = write!(
            out,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        );
    }
    if props.bold {
        out.push_str("<w:b/>");
    }
    if props.italic {
        out.push_str("<w:i/>");
    }
    if let Some(color) = props.color {
        let _ = write!(out, r#"<w:color w:val="{color}"/>"#);
    }
    if let Some(size) = props.size_pt {
        let _ = write!(out, r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size * 2);
    }
    if props.underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    out.push_str("</w:rPr>");
}

fn text_run_xml(text: &str, props: &RunProps, out: &mut String) {
    out.push_str("<w:r>");
    run_props_xml(props, out);
    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&xml_escape_text(text));
    out.push_str("</w:t></w:r>");
}

/// Formatting of internal links.
pub const LINK_PROPS: RunProps = RunProps {
    char_style: None,
    font: None,
    bold: false,
    italic: false,
    underline: true,
    color: Some("2A6099"),
    size_pt: None,
};

fn inline_xml(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text { text, props } => {
            if !text.is_empty() {
                text_run_xml(text, props, out);
            }
        }
        Inline::Link { bookmark, text } => {
            let _ = write!(
                out,
                r#"<w:hyperlink w:anchor="{}" w:history="1">"#,
                xml_escape_text(bookmark)
            );
            text_run_xml(text, &LINK_PROPS, out);
            out.push_str("</w:hyperlink>");
        }
        Inline::Picture(pic) => picture_xml(pic, out),
        Inline::LineBreak => out.push_str("<w:r><w:br/></w:r>"),
        Inline::PageBreak => out.push_str(r#"<w:r><w:br w:type="page"/></w:r>"#),
    }
}

fn picture_xml(pic: &Picture, out: &mut String) {
    let name = xml_escape_text(&pic.name);
    let _ = write!(
        out,
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="{name}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        cx = pic.cx,
        cy = pic.cy,
        id = pic.doc_pr_id,
        rel = pic.rel_id,
    );
}

fn cell_xml(cell: &Cell, out: &mut String) {
    out.push_str("<w:tc><w:tcPr>");
    let _ = write!(out, r#"<w:tcW w:w="{}" w:type="dxa"/>"#, cell.width);
    if let Some(color) = cell.left_border {
        let _ = write!(
            out,
            r#"<w:tcBorders><w:top w:val="nil"/><w:left w:val="single" w:sz="24" w:space="0" w:color="{color}"/><w:bottom w:val="nil"/><w:right w:val="nil"/></w:tcBorders>"#
        );
    }
    if let Some(fill) = cell.fill {
        let _ = write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#);
    }
    out.push_str("</w:tcPr>");
    if cell.paragraphs.is_empty() {
        out.push_str("<w:p/>");
    }
    for p in &cell.paragraphs {
        paragraph_xml(p, out);
    }
    out.push_str("</w:tc>");
}

fn table_xml(t: &TableModel, out: &mut String) {
    out.push_str("<w:tbl><w:tblPr>");
    if let Some(style) = t.style {
        let _ = write!(out, r#"<w:tblStyle w:val="{style}"/>"#);
    }
    out.push_str(r#"<w:tblW w:w="0" w:type="auto"/>"#);
    if let Some(align) = t.align {
        let _ = write!(out, r#"<w:jc w:val="{}"/>"#, align.as_str());
    }
    out.push_str(r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#);
    out.push_str("</w:tblPr><w:tblGrid>");
    for width in t.grid() {
        let _ = write!(out, r#"<w:gridCol w:w="{width}"/>"#);
    }
    out.push_str("</w:tblGrid>");
    for (i, row) in t.rows.iter().enumerate() {
        out.push_str("<w:tr>");
        if i == 0 && t.header_row {
            out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
        }
        for cell in row {
            cell_xml(cell, out);
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn toc_xml(placeholder: &str, out: &mut String) {
    let _ = write!(
        out,
        r#"<w:p><w:fldSimple w:instr=" TOC \o &quot;1-3&quot; \h \z \u "><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:fldSimple></w:p>"#,
        xml_escape_text(placeholder)
    );
}

// ============================================================================
// Package parts
// ============================================================================

/// A4 with 2.5 cm left margin and 2 cm elsewhere.
const SECTION_PROPERTIES: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1417" w:header="708" w:footer="708" w:gutter="0"/><w:cols w:space="708"/><w:docGrid w:linePitch="360"/></w:sectPr>"#;

/// Usable text width between the margins, in twips.
pub const TEXT_WIDTH: u32 = 11906 - 1417 - 1134;

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:wpc="http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas"
 xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
 xmlns:o="urn:schemas-microsoft-com:office:office"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math"
 xmlns:v="urn:schemas-microsoft-com:vml"
 xmlns:wp14="http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing"
 xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
 xmlns:w10="urn:schemas-microsoft-com:office:word"
 xmlns:w="{NS_WORDPROCESSING}"
 xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordprocessingml"
 xmlns:w15="http://schemas.microsoft.com/office/word/2012/wordprocessingml"
 xmlns:wpg="http://schemas.microsoft.com/office/word/2010/wordprocessingGroup"
 xmlns:wpi="http://schemas.microsoft.com/office/word/2010/wordprocessingInk"
 xmlns:wne="http://schemas.microsoft.com/office/word/2006/wordml"
 xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"
 mc:Ignorable="w14 w15 wp14">
<w:body>{body}{SECTION_PROPERTIES}</w:body>
</w:document>"#
    )
}

pub fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>
</Types>"#
}

pub fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

/// Relationship ids `rId1..=rId3` are taken by the fixed parts.
pub const TEMPLATE_MAX_REL_ID: u32 = 3;

pub fn word_rels_xml(extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>
{extra}</Relationships>"#
    )
}

pub fn image_relationship_xml(rel_id: &str, target: &str) -> String {
    format!(
        "  <Relationship Id=\"{rel_id}\" Type=\"{REL_TYPE_IMAGE}\" Target=\"{}\"/>\n",
        xml_escape_text(target)
    )
}

pub fn settings_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:updateFields w:val="true"/>
  <w:defaultTabStop w:val="708"/>
  <w:characterSpacingControl w:val="doNotCompress"/>
</w:settings>"#
}

/// A decimal list instance restarting at 1.
pub fn decimal_num_xml(num_id: u32) -> String {
    format!(
        r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="{DECIMAL_ABSTRACT_ID}"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#
    )
}

pub fn numbering_xml(extra_nums: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="hybridMultilevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="◦"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="1080" w:hanging="360"/></w:pPr></w:lvl>
    <w:lvl w:ilvl="2"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="▪"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="1440" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="{DECIMAL_ABSTRACT_ID}">
    <w:multiLevelType w:val="hybridMultilevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="0"/></w:num>
{extra_nums}</w:numbering>"#
    )
}

pub fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="ru-RU"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:widowControl/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="480" w:after="240"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:color w:val="ED1C24"/><w:sz w:val="40"/><w:szCs w:val="40"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="360" w:after="160"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:color w:val="282828"/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="2"/></w:pPr>
    <w:rPr><w:b/><w:color w:val="7A7A7A"/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:customStyle="1" w:styleId="Subheading">
    <w:name w:val="Subheading"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:pPr><w:keepNext/></w:pPr>
    <w:rPr><w:b/><w:color w:val="7A7A7A"/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:customStyle="1" w:styleId="CorporateTitle">
    <w:name w:val="Corporate Title"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="0" w:after="600"/><w:jc w:val="center"/></w:pPr>
    <w:rPr><w:b/><w:color w:val="ED1C24"/><w:sz w:val="56"/><w:szCs w:val="56"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:customStyle="1" w:styleId="CorporateSubtitle">
    <w:name w:val="Corporate Subtitle"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="480"/><w:jc w:val="center"/></w:pPr>
    <w:rPr><w:i/><w:color w:val="595959"/><w:sz w:val="36"/><w:szCs w:val="36"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:customStyle="1" w:styleId="ScreenshotReference">
    <w:name w:val="Screenshot Reference"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="120" w:after="60"/><w:ind w:left="360"/></w:pPr>
    <w:rPr><w:b/><w:i/><w:color w:val="70AD47"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:customStyle="1" w:styleId="ImportantNote">
    <w:name w:val="Important Note"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="160" w:after="160"/><w:ind w:left="720" w:right="360"/></w:pPr>
    <w:rPr><w:i/><w:color w:val="787878"/></w:rPr>
  </w:style>
  <w:style w:type="character" w:customStyle="1" w:styleId="CodeText">
    <w:name w:val="Code Text"/>
    <w:rPr><w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:cs="Consolas"/><w:color w:val="444444"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet">
    <w:name w:val="List Bullet"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:spacing w:after="60"/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListNumber">
    <w:name w:val="List Number"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="60"/></w:pPr>
  </w:style>
  <w:style w:type="table" w:default="1" w:styleId="TableNormal">
    <w:name w:val="Normal Table"/>
    <w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr>
  </w:style>
  <w:style w:type="table" w:styleId="TableGrid">
    <w:name w:val="Table Grid"/>
    <w:basedOn w:val="TableNormal"/>
    <w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr>
    <w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr>
  </w:style>
</w:styles>"#
}
