use std::panic::{self, AssertUnwindSafe};

use pdf_extract::{Document, PlainTextOutput};
use tracing::warn;

use crate::extraction::ExtractError;

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract plain text from PDF bytes, one string per page.
    /// A page whose text cannot be read is returned as an empty string.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Pure-Rust backend built on the `pdf-extract` crate. No external binaries.
///
/// The document is loaded once and each page is extracted on its own, so a
/// broken page (missing font, bad content stream) costs only that page.
pub struct PdfExtractLib;

impl PdfExtractor for PdfExtractLib {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let doc = panic::catch_unwind(|| Document::load_mem(pdf_bytes))
            .map_err(|_| ExtractError::Pdf("parser panicked while loading document".to_string()))?
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        // BTreeMap keys: page numbers in document order.
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        let pages = page_numbers
            .into_iter()
            .map(|page_num| {
                extract_page(&doc, page_num).unwrap_or_else(|reason| {
                    warn!("PDF page {page_num} skipped: {reason}");
                    String::new()
                })
            })
            .collect();

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdf-extract"
    }
}

fn extract_page(doc: &Document, page_num: u32) -> Result<String, String> {
    panic::catch_unwind(AssertUnwindSafe(|| -> Result<String, String> {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(doc, &mut output, page_num)
                .map_err(|e| format!("{e:?}"))?;
        }
        Ok(text)
    }))
    .unwrap_or_else(|_| Err("extractor panicked".to_string()))
}

/// Joins page texts with a newline. Surrounding blank lines of each page are
/// dropped and pages with no visible text contribute nothing.
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim_matches(|c| c == '\n' || c == '\r'))
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    /// Returns canned pages regardless of input.
    pub struct StubPdf(Vec<String>);

    impl StubPdf {
        pub fn pages(pages: &[&str]) -> Self {
            StubPdf(pages.iter().map(|p| p.to_string()).collect())
        }
    }

    impl PdfExtractor for StubPdf {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
            Ok(self.0.clone())
        }

        fn backend_name(&self) -> &str {
            "stub"
        }
    }

    /// Builds a PDF with one page per entry. Each entry is (font resource, text);
    /// only `F1` is defined, so any other name yields a page that cannot be decoded.
    fn build_pdf(pages: &[(&str, &str)]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut page_ids = Vec::new();
        for (font, text) in pages {
            let content = format!("BT /{font} 12 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages.len() as i64),
        });
        for page_id in &page_ids {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Parent", pages_id);
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_join_pages_keeps_order() {
        let pages = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_pages(&pages), "a\nb");
    }

    #[test]
    fn test_join_pages_drops_blank_pages() {
        let pages = vec![" \n".to_string(), "only".to_string(), String::new()];
        assert_eq!(join_pages(&pages), "only");
    }

    #[test]
    fn test_join_pages_trims_surrounding_blank_lines() {
        let pages = vec!["\n\nPAGEONE\n".to_string(), "\n\n\nPAGETWO\n\n".to_string()];
        assert_eq!(join_pages(&pages), "PAGEONE\nPAGETWO");
    }

    #[test]
    fn test_join_pages_empty_document() {
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn test_multi_page_pdf_returns_visible_text() {
        let bytes = build_pdf(&[("F1", "PAGEONE"), ("F1", "PAGETWO"), ("F1", "PAGETHREE")]);
        let pages = PdfExtractLib.extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 3);

        let text = join_pages(&pages);
        let one = text.find("PAGEONE").unwrap();
        let two = text.find("PAGETWO").unwrap();
        let three = text.find("PAGETHREE").unwrap();
        assert!(one < two && two < three, "pages out of order: {text:?}");
        assert!(!text.starts_with('\n'));
    }

    #[test]
    fn test_broken_middle_page_is_skipped() {
        let bytes = build_pdf(&[("F1", "PAGEONE"), ("F9", "BROKEN"), ("F1", "PAGETHREE")]);
        let pages = PdfExtractLib.extract_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 3);

        let text = join_pages(&pages);
        assert!(text.contains("PAGEONE"), "first page lost: {text:?}");
        assert!(text.contains("PAGETHREE"), "last page lost: {text:?}");
    }

    #[test]
    fn test_garbage_bytes_are_an_error_not_a_panic() {
        let result = PdfExtractLib.extract_pages(b"not a pdf");
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }
}
