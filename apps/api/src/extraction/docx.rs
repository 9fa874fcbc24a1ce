use std::io::{Read, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::extraction::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the body text of a DOCX file.
///
/// The bytes are staged in a `.docx` temp file first; the file is removed
/// when the handle drops.
pub fn extract_docx(docx_bytes: &[u8]) -> Result<String, ExtractError> {
    let mut tmpfile = tempfile::Builder::new().suffix(".docx").tempfile()?;
    tmpfile.write_all(docx_bytes)?;
    tmpfile.flush()?;

    let mut archive = ZipArchive::new(tmpfile.reopen()?)
        .map_err(|e| ExtractError::Docx(format!("not a DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("{DOCUMENT_PART} missing: {e}")))?
        .read_to_string(&mut xml)?;

    document_xml_to_text(&xml)
}

/// Flattens WordprocessingML into text: one line per paragraph, tabs and
/// breaks only when they sit inside a run (`w:tab` also appears in tab-stop
/// definitions).
fn document_xml_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" if in_run => out.push('\t'),
                b"w:br" | b"w:cr" if in_run => out.push('\n'),
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::Docx(format!("bad text node: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}
