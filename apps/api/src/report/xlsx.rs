//! Minimal OOXML workbook writer: one sheet, first row = column names,
//! all cells as shared strings, no styles.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::report::{ReportError, ReportTable};

pub const SHEET_NAME: &str = "Sheet1";

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// Encodes `table` as xlsx bytes.
pub fn write_workbook(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let mut strings = SharedStrings::default();
    let sheet_xml = sheet_xml(table, &mut strings)?;
    let shared_xml = strings.to_xml()?;
    let workbook = workbook_xml();

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet_xml),
        ("xl/sharedStrings.xml", &shared_xml),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, data) in parts {
        zip.start_file(name, options).map_err(encode_err)?;
        zip.write_all(data).map_err(encode_err)?;
    }

    let cursor = zip.finish().map_err(encode_err)?;
    Ok(cursor.into_inner())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{SPREADSHEET_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn encode_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Encode(e.to_string())
}

/// Deduplicating shared-string table; `count` tracks total references.
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    ordered: Vec<String>,
    count: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.count += 1;
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.ordered.len();
        self.ordered.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        idx
    }

    fn to_xml(&self) -> Result<Vec<u8>, ReportError> {
        let mut w = Writer::new(Vec::new());
        let count = self.count.to_string();
        let unique = self.ordered.len().to_string();

        write(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        write(
            &mut w,
            Event::Start(BytesStart::new("sst").with_attributes([
                ("xmlns", SPREADSHEET_NS),
                ("count", count.as_str()),
                ("uniqueCount", unique.as_str()),
            ])),
        )?;
        for value in &self.ordered {
            write(&mut w, Event::Start(BytesStart::new("si")))?;
            write(
                &mut w,
                Event::Start(BytesStart::new("t").with_attributes([("xml:space", "preserve")])),
            )?;
            write(&mut w, Event::Text(BytesText::new(value)))?;
            write(&mut w, Event::End(BytesEnd::new("t")))?;
            write(&mut w, Event::End(BytesEnd::new("si")))?;
        }
        write(&mut w, Event::End(BytesEnd::new("sst")))?;
        Ok(w.into_inner())
    }
}

fn sheet_xml(table: &ReportTable, strings: &mut SharedStrings) -> Result<Vec<u8>, ReportError> {
    let mut w = Writer::new(Vec::new());

    write(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    write(
        &mut w,
        Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)])),
    )?;
    write(&mut w, Event::Start(BytesStart::new("sheetData")))?;

    let all_rows = std::iter::once(&table.headers).chain(table.rows.iter());
    for (row_idx, cells) in all_rows.enumerate() {
        let row_number = (row_idx + 1).to_string();
        write(
            &mut w,
            Event::Start(BytesStart::new("row").with_attributes([("r", row_number.as_str())])),
        )?;

        for (col_idx, raw) in cells.iter().enumerate() {
            let value = sanitize(raw);
            if value.is_empty() {
                continue;
            }
            let reference = format!("{}{}", column_name(col_idx), row_number);
            let string_idx = strings.intern(&value).to_string();

            write(
                &mut w,
                Event::Start(
                    BytesStart::new("c").with_attributes([("r", reference.as_str()), ("t", "s")]),
                ),
            )?;
            write(&mut w, Event::Start(BytesStart::new("v")))?;
            write(&mut w, Event::Text(BytesText::new(&string_idx)))?;
            write(&mut w, Event::End(BytesEnd::new("v")))?;
            write(&mut w, Event::End(BytesEnd::new("c")))?;
        }

        write(&mut w, Event::End(BytesEnd::new("row")))?;
    }

    write(&mut w, Event::End(BytesEnd::new("sheetData")))?;
    write(&mut w, Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner())
}

fn write(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ReportError> {
    w.write_event(event).map_err(encode_err)
}

/// Drops characters that XML 1.0 cannot carry.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

/// Zero-based column index to spreadsheet letters: 0 → A, 25 → Z, 26 → AA.
fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Reader, Xlsx};

    /// Decodes xlsx bytes into (sheet names, rows of the first sheet as strings).
    pub fn read_back(bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<String>>) {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names();
        let range = workbook.worksheet_range(&names[0]).unwrap();
        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        (names, rows)
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> ReportTable {
        ReportTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(5), "F");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_two_by_two_table_reads_back() {
        let t = table(&["名称", "数量"], &[&["苹果", "3"], &["香蕉", "5"]]);
        let (names, rows) = read_back(write_workbook(&t).unwrap());
        assert_eq!(names, vec![SHEET_NAME.to_string()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["名称", "数量"]);
        assert_eq!(rows[1], vec!["苹果", "3"]);
        assert_eq!(rows[2], vec!["香蕉", "5"]);
    }

    #[test]
    fn test_markup_characters_are_escaped() {
        let t = table(&["a", "b"], &[&["<tag> & \"quoted\"", "多行\n文本"]]);
        let (_, rows) = read_back(write_workbook(&t).unwrap());
        assert_eq!(rows[1][0], "<tag> & \"quoted\"");
        assert_eq!(rows[1][1], "多行\n文本");
    }

    #[test]
    fn test_empty_cells_read_back_empty() {
        let t = table(&["a", "b", "c"], &[&["1", "", "3"]]);
        let (_, rows) = read_back(write_workbook(&t).unwrap());
        assert_eq!(rows[1], vec!["1", "", "3"]);
    }

    #[test]
    fn test_shared_strings_are_deduplicated() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("是"), 0);
        assert_eq!(strings.intern("否"), 1);
        assert_eq!(strings.intern("是"), 0);
        assert_eq!(strings.count, 3);
        assert_eq!(strings.ordered.len(), 2);
    }

    #[test]
    fn test_control_characters_are_dropped() {
        assert_eq!(sanitize("a\u{0}b\u{1b}c\td"), "abc\td");
    }
}
