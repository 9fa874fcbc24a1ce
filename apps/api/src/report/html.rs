//! HTML `<table>` recognition for edited text that carries table markup
//! instead of a pipe table. The first row, whether `th` or `td` cells,
//! supplies the column names.

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use crate::report::ReportTable;

/// Byte offset of the first `<table` open tag, case-insensitive.
pub fn find_table_start(text: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    lower.match_indices("<table").map(|(idx, _)| idx).find(|&idx| {
        matches!(
            lower.as_bytes().get(idx + "<table".len()),
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')
        )
    })
}

/// Reads the table that `fragment` starts with. Markup is read leniently:
/// end tags are not matched against open tags, so void `<br>` and stray
/// closers do not abort the read.
pub fn parse_table(fragment: &str) -> Option<ReportTable> {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().check_end_names = false;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match tag_name(e.local_name().as_ref()).as_str() {
                "tr" => {
                    close_cell(&mut row, &mut cell);
                    close_row(&mut rows, &mut row);
                    row = Some(Vec::new());
                }
                "td" | "th" => {
                    close_cell(&mut row, &mut cell);
                    cell = Some(String::new());
                }
                "br" => push_text(&mut cell, "\n"),
                _ => {}
            },
            Ok(Event::Empty(e)) => match tag_name(e.local_name().as_ref()).as_str() {
                "br" => push_text(&mut cell, "\n"),
                "td" | "th" => {
                    close_cell(&mut row, &mut cell);
                    if let Some(r) = row.as_mut() {
                        r.push(String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match tag_name(e.local_name().as_ref()).as_str() {
                "td" | "th" => close_cell(&mut row, &mut cell),
                "tr" => {
                    close_cell(&mut row, &mut cell);
                    close_row(&mut rows, &mut row);
                }
                "table" => break,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if cell.is_some() {
                    push_text(&mut cell, &decode(&t));
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }
    close_cell(&mut row, &mut cell);
    close_row(&mut rows, &mut row);

    let mut rows = rows.into_iter();
    let headers = rows.next()?;
    if headers.iter().all(|h| h.is_empty()) {
        return None;
    }
    let width = headers.len();
    let rows = rows
        .map(|mut r| {
            r.resize(width, String::new());
            r
        })
        .collect();

    Some(ReportTable { headers, rows })
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Entity-decoded text; HTML-only entities such as `&nbsp;` fall back to the raw text.
fn decode(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

fn push_text(cell: &mut Option<String>, text: &str) {
    if let Some(c) = cell.as_mut() {
        c.push_str(text);
    }
}

fn close_cell(row: &mut Option<Vec<String>>, cell: &mut Option<String>) {
    if let (Some(r), Some(c)) = (row.as_mut(), cell.take()) {
        r.push(c.trim().to_string());
    }
}

fn close_row(rows: &mut Vec<Vec<String>>, row: &mut Option<Vec<String>>) {
    if let Some(r) = row.take() {
        if !r.is_empty() {
            rows.push(r);
        }
    }
}
