//! XLSX writer. Consumes the collected `CentreRecord`s and writes a single-sheet Office Open XML workbook
//! (content types, package rels, workbook, styles, one worksheet with inline strings).

use crate::model::CentreRecord;
use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// MIME type for `.xlsx` downloads.
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Default output file name.
pub const DEFAULT_FILE_NAME: &str = "IELTS_Global_Test_Centres.xlsx";

pub const SHEET_NAME: &str = "Test Centres";

/// Header row, in column order.
pub const COLUMNS: [&str; 9] = [
    "Country",
    "Centre Name",
    "City",
    "Address",
    "UKVI Approved",
    "One Skill Retake",
    "Test Types",
    "Fees",
    "Detail Page",
];

const CONTENT_TYPES_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\n  <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\n  <Default Extension=\"xml\" ContentType=\"application/xml\"/>\n  <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\n  <Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n  <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\n</Types>";

const PACKAGE_RELS_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\n  <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\n</Relationships>";

const WORKBOOK_RELS_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\n  <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\n  <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\n</Relationships>";

/// Style 0 is the default cell, style 1 is the bold header.
const STYLES_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n  <fonts count=\"2\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font><font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\n  <fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>\n  <borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\n  <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\n  <cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/><xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/></cellXfs>\n  <cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\n</styleSheet>";

const HEADER_STYLE: u32 = 1;

/// Errors from the XLSX writer.
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("Failed to create spreadsheet file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write spreadsheet: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write spreadsheet archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for XlsxError {
    fn from(e: std::io::Error) -> Self {
        XlsxError::Zip(zip::result::ZipError::Io(e))
    }
}

enum Cell<'a> {
    Text(Cow<'a, str>),
    Bool(bool),
    Blank,
}

/// Serialize records to an in-memory `.xlsx`. Identical records give identical bytes.
pub fn write_xlsx(records: &[CentreRecord]) -> Result<Vec<u8>, XlsxError> {
    let cursor = write_workbook(records, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Serialize records and write the workbook to `path`.
pub fn write_xlsx_file(records: &[CentreRecord], path: &Path) -> Result<(), XlsxError> {
    let bytes = write_xlsx(records)?;
    let mut file = std::fs::File::create(path).map_err(|e| XlsxError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| XlsxError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn write_workbook<W: Write + Seek>(records: &[CentreRecord], writer: W) -> Result<W, XlsxError> {
    let mut zip = ZipWriter::new(writer);
    // Fixed timestamp: archive metadata must not vary between runs.
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML)?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS_XML)?;

    write_workbook_xml(&mut zip, options)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(WORKBOOK_RELS_XML)?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES_XML)?;

    write_sheet_xml(records, &mut zip, options)?;

    Ok(zip.finish()?)
}

fn write_workbook_xml(
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), XlsxError> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="{}" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>"#,
        xml_escape(SHEET_NAME)
    );
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook.as_bytes())?;
    Ok(())
}

fn write_sheet_xml(
    records: &[CentreRecord],
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), XlsxError> {
    let last_row = records.len() + 1;
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:{}{}"/>
  <sheetData>
"#,
        column_letter(COLUMNS.len() - 1),
        last_row
    );

    let header: Vec<Cell<'_>> = COLUMNS.iter().map(|c| Cell::Text(Cow::Borrowed(*c))).collect();
    push_row(&mut xml, 1, &header, Some(HEADER_STYLE));
    for (i, record) in records.iter().enumerate() {
        push_row(&mut xml, i + 2, &record_cells(record), None);
    }

    xml.push_str("  </sheetData>\n</worksheet>");
    zip.start_file("xl/worksheets/sheet1.xml", options)?;
    zip.write_all(xml.as_bytes())?;
    Ok(())
}

fn record_cells(record: &CentreRecord) -> [Cell<'_>; 9] {
    [
        Cell::Text(Cow::Borrowed(record.country.as_str())),
        Cell::Text(Cow::Borrowed(record.centre_name.as_str())),
        Cell::Text(Cow::Borrowed(record.city.as_str())),
        Cell::Text(Cow::Borrowed(record.address.as_str())),
        Cell::Bool(record.ukvi_approved),
        Cell::Bool(record.one_skill_retake),
        Cell::Text(Cow::Owned(record.test_types_text())),
        Cell::Text(Cow::Owned(record.fees.to_cell_text())),
        match &record.detail_url {
            Some(url) => Cell::Text(Cow::Borrowed(url.as_str())),
            None => Cell::Blank,
        },
    ]
}

fn push_row(xml: &mut String, row: usize, cells: &[Cell<'_>], style: Option<u32>) {
    let style_attr = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();
    xml.push_str(&format!("    <row r=\"{}\">", row));
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_letter(col), row);
        match cell {
            Cell::Text(text) => xml.push_str(&format!(
                r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                reference,
                style_attr,
                xml_escape(text)
            )),
            Cell::Bool(b) => xml.push_str(&format!(
                r#"<c r="{}" t="b"{}><v>{}</v></c>"#,
                reference,
                style_attr,
                u8::from(*b)
            )),
            Cell::Blank => {}
        }
    }
    xml.push_str("</row>\n");
}

/// Zero-based column index to spreadsheet letters: 0 → A, 25 → Z, 26 → AA.
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Escape markup characters and drop characters XML 1.0 does not allow.
fn xml_escape(s: &str) -> String {
    s.chars()
        .filter(|c| is_xml_char(*c))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}
