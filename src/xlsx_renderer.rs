//! # Spreadsheet Renderer
//!
//! Writes every line of the input into column A of a single worksheet and
//! packs the OOXML parts into a zip container.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::errors::BotError;

/// Excel refuses cells longer than this
pub const MAX_CELL_CHARS: usize = 32_767;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// One OOXML part being written
struct Part {
    writer: Writer<Vec<u8>>,
}

fn xml_error(err: impl std::fmt::Display) -> BotError {
    BotError::Generation(format!("xlsx: {err}"))
}

impl Part {
    fn new() -> Result<Self, BotError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), BotError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(tag)).map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), BotError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(tag)).map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<(), BotError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    /// Escaped character data
    fn text(&mut self, value: &str) -> Result<(), BotError> {
        self.writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(xml_error)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Drop characters XML 1.0 cannot carry
pub fn xml_safe(value: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        matches!(c as u32,
            0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF)
    }

    if value.chars().all(allowed) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|c| allowed(*c)).collect())
    }
}

/// One entry per spreadsheet row; never empty
pub fn sheet_rows(text: &str) -> Vec<&str> {
    let rows: Vec<&str> = text.lines().collect();
    if rows.is_empty() {
        vec![""]
    } else {
        rows
    }
}

fn content_types_xml() -> Result<Vec<u8>, BotError> {
    let mut part = Part::new()?;
    part.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    part.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    part.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (name, content_type) in [
        ("/xl/workbook.xml", CT_WORKBOOK),
        ("/xl/worksheets/sheet1.xml", CT_WORKSHEET),
        ("/xl/styles.xml", CT_STYLES),
    ] {
        part.empty(
            "Override",
            &[("PartName", name), ("ContentType", content_type)],
        )?;
    }
    part.close("Types")?;
    Ok(part.finish())
}

/// A relationships part; targets get ids `rId1`, `rId2`, ...
fn relationships_xml(targets: &[(&str, &str)]) -> Result<Vec<u8>, BotError> {
    let mut part = Part::new()?;
    part.open("Relationships", &[("xmlns", NS_PACKAGE_RELS)])?;
    for (i, (rel_type, target)) in targets.iter().enumerate() {
        let id = format!("rId{}", i + 1);
        part.empty(
            "Relationship",
            &[("Id", id.as_str()), ("Type", *rel_type), ("Target", *target)],
        )?;
    }
    part.close("Relationships")?;
    Ok(part.finish())
}

/// Minimal stylesheet: one font, the two mandatory fills, one border
fn styles_xml() -> Result<Vec<u8>, BotError> {
    let mut part = Part::new()?;
    part.open("styleSheet", &[("xmlns", NS_MAIN)])?;

    part.open("fonts", &[("count", "1")])?;
    part.open("font", &[])?;
    part.empty("sz", &[("val", "11")])?;
    part.empty("name", &[("val", "Calibri")])?;
    part.close("font")?;
    part.close("fonts")?;

    part.open("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        part.open("fill", &[])?;
        part.empty("patternFill", &[("patternType", pattern)])?;
        part.close("fill")?;
    }
    part.close("fills")?;

    part.open("borders", &[("count", "1")])?;
    part.open("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        part.empty(side, &[])?;
    }
    part.close("border")?;
    part.close("borders")?;

    let xf = [("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")];
    part.open("cellStyleXfs", &[("count", "1")])?;
    part.empty("xf", &xf)?;
    part.close("cellStyleXfs")?;
    part.open("cellXfs", &[("count", "1")])?;
    part.empty("xf", &[xf[0], xf[1], xf[2], xf[3], ("xfId", "0")])?;
    part.close("cellXfs")?;

    part.close("styleSheet")?;
    Ok(part.finish())
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>, BotError> {
    let name = xml_safe(sheet_name);
    let mut part = Part::new()?;
    part.open("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_DOC_RELS)])?;
    part.open("sheets", &[])?;
    part.empty(
        "sheet",
        &[
            ("name", name.as_ref()),
            ("sheetId", "1"),
            ("r:id", "rId1"),
        ],
    )?;
    part.close("sheets")?;
    part.close("workbook")?;
    Ok(part.finish())
}

fn worksheet_xml(rows: &[&str]) -> Result<Vec<u8>, BotError> {
    let mut part = Part::new()?;
    part.open("worksheet", &[("xmlns", NS_MAIN)])?;
    part.open("sheetData", &[])?;

    for (i, row) in rows.iter().enumerate() {
        let number = (i + 1).to_string();
        let cell_ref = format!("A{number}");

        let mut value = xml_safe(row);
        if value.chars().count() > MAX_CELL_CHARS {
            warn!(
                row = i + 1,
                chars = value.chars().count(),
                "Truncating spreadsheet cell to {MAX_CELL_CHARS} characters"
            );
            value = Cow::Owned(value.chars().take(MAX_CELL_CHARS).collect());
        }

        part.open("row", &[("r", number.as_str())])?;
        part.open("c", &[("r", cell_ref.as_str()), ("t", "inlineStr")])?;
        part.open("is", &[])?;
        part.open("t", &[("xml:space", "preserve")])?;
        part.text(&value)?;
        part.close("t")?;
        part.close("is")?;
        part.close("c")?;
        part.close("row")?;
    }

    part.close("sheetData")?;
    part.close("worksheet")?;
    Ok(part.finish())
}

/// Render `text` into a complete xlsx workbook
pub fn render_xlsx(text: &str, sheet_name: &str) -> Result<Vec<u8>, BotError> {
    let rows = sheet_rows(text);

    let parts = [
        ("[Content_Types].xml", content_types_xml()?),
        (
            "_rels/.rels",
            relationships_xml(&[(REL_OFFICE_DOCUMENT, "xl/workbook.xml")])?,
        ),
        ("xl/workbook.xml", workbook_xml(sheet_name)?),
        (
            "xl/_rels/workbook.xml.rels",
            relationships_xml(&[
                (REL_WORKSHEET, "worksheets/sheet1.xml"),
                (REL_STYLES, "styles.xml"),
            ])?,
        ),
        ("xl/styles.xml", styles_xml()?),
        ("xl/worksheets/sheet1.xml", worksheet_xml(&rows)?),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(&body)?;
    }
    let bytes = zip.finish()?.into_inner();

    debug!(rows = rows.len(), bytes = bytes.len(), "Spreadsheet rendered");
    Ok(bytes)
}
