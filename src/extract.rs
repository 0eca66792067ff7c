//! PDF text extraction.
//!
//! Returns one string holding every page's text in page order, pages
//! separated by `\n`. A page that cannot be extracted contributes an empty
//! string. Only a byte stream that is not a readable PDF at all, or one
//! locked behind a user password, is an [`IngestError::Extraction`].

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;

use crate::error::{IngestError, Result};

/// Extracts the plain text of a PDF held in memory.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes).map_err(|e| IngestError::Extraction(e.to_string()))?;
    if document.is_encrypted() && document.authenticate_password("").is_err() {
        return Err(IngestError::Extraction(
            "document is encrypted and requires a password".to_string(),
        ));
    }

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Ok(String::new());
    }

    // lopdf decrypts empty-password documents while loading; pdf-extract
    // would decrypt them a second time.
    if document.is_encrypted() {
        let pages = extract_pages_individually(&document, &page_numbers);
        return Ok(join_pages(&pages));
    }

    let pages = match extract_all_pages(bytes) {
        Ok(pages) if pages.len() == page_numbers.len() => pages,
        Ok(pages) => {
            tracing::debug!(
                extracted = pages.len(),
                expected = page_numbers.len(),
                "page count mismatch, extracting page by page"
            );
            extract_pages_individually(&document, &page_numbers)
        }
        Err(e) => {
            tracing::debug!(error = %e, "whole-document extraction failed, extracting page by page");
            extract_pages_individually(&document, &page_numbers)
        }
    };

    Ok(join_pages(&pages))
}

/// Runs pdf-extract over the whole document. pdf-extract panics on some
/// malformed pages (e.g. a font name missing from the page resources), so
/// a panic is reported as an error like any other failure.
fn extract_all_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("pdf-extract panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("pdf-extract panicked: {}", message)
    } else {
        "pdf-extract panicked".to_string()
    }
}

/// Per-page extraction where a failing page yields `""`.
fn extract_pages_individually(document: &Document, page_numbers: &[u32]) -> Vec<String> {
    page_numbers
        .iter()
        .map(|&page| {
            match panic::catch_unwind(AssertUnwindSafe(|| document.extract_text(&[page]))) {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    tracing::debug!(page, error = %e, "page extraction failed");
                    String::new()
                }
                Err(_) => {
                    tracing::debug!(page, "page extraction panicked");
                    String::new()
                }
            }
        })
        .collect()
}

/// Joins page texts with a single newline between pages.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "../tests/common/pdf.rs"]
pub(crate) mod test_pdf;

#[cfg(test)]
mod tests {
    use super::test_pdf::{pdf_with_pages, pdf_with_undefined_font_on_first_page};
    use super::*;
    use lopdf::{EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};

    /// Re-saves `pdf` encrypted with RC4-128, owner password `owner`.
    fn encrypted(pdf: &[u8], user_password: &str) -> Vec<u8> {
        let mut document = Document::load_mem(pdf).unwrap();
        // The file key is derived from the first trailer ID.
        let id = Object::String(b"pdf-ingest-test1".to_vec(), StringFormat::Literal);
        document
            .trailer
            .set("ID", Object::Array(vec![id.clone(), id]));
        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &document,
            owner_password: "owner",
            user_password,
            key_length: 128,
            permissions: Permissions::default(),
        })
        .unwrap();
        document.encrypt(&state).unwrap();
        let mut out = Vec::new();
        document.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, IngestError::Extraction(_)));
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(
            extract_pdf_text(b""),
            Err(IngestError::Extraction(_))
        ));
    }

    #[test]
    fn extracts_single_page() {
        let pdf = pdf_with_pages(&["quarterly report phrase"]);
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("quarterly report phrase"), "got: {:?}", text);
    }

    #[test]
    fn extracts_pages_in_order() {
        let pdf = pdf_with_pages(&["first page words", "second page words"]);
        let text = extract_pdf_text(&pdf).unwrap();
        let first = text.find("first").expect("first page text");
        let second = text.find("second").expect("second page text");
        assert!(first < second);
        assert!(text[first..second].contains('\n'));
    }

    #[test]
    fn blank_page_does_not_abort_document() {
        let pdf = pdf_with_pages(&["", "after the blank page"]);
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("after the blank page"), "got: {:?}", text);
    }

    #[test]
    fn undefined_font_falls_back_to_page_by_page() {
        let pdf = pdf_with_undefined_font_on_first_page(&["broken page text", "good second page"]);
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("good second page"), "got: {:?}", text);
    }

    #[test]
    fn page_by_page_extraction_keeps_page_count() {
        let pdf = pdf_with_pages(&["one", "", "three"]);
        let document = Document::load_mem(&pdf).unwrap();
        let pages = extract_pages_individually(&document, &[1, 2, 3]);
        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("one"));
        assert!(pages[1].trim().is_empty());
        assert!(pages[2].contains("three"));
    }

    #[test]
    fn owner_password_only_document_is_readable() {
        let pdf = encrypted(&pdf_with_pages(&["restricted but readable"]), "");
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("restricted but readable"), "got: {:?}", text);
    }

    #[test]
    fn user_password_document_is_rejected() {
        let pdf = encrypted(&pdf_with_pages(&["locked away"]), "secret");
        assert!(matches!(
            extract_pdf_text(&pdf),
            Err(IngestError::Extraction(_))
        ));
    }

    #[test]
    fn join_pages_keeps_empty_pages() {
        assert_eq!(join_pages(&["a", "", "b"]), "a\n\nb");
        assert_eq!(join_pages::<&str>(&[]), "");
    }
}
