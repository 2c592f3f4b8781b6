//! PDF text extraction using pdf-extract
//!
//! Extraction works from an in-memory byte buffer since uploads arrive
//! over HTTP and never need to touch the filesystem. Page boundaries are
//! recovered from the form feed characters pdf-extract emits between
//! pages.

use std::path::Path;

use crate::{ParserError, Result};

/// A PDF reduced to its per-page text
#[derive(Debug, Clone)]
pub struct PdfDocument {
    /// Extracted text, one entry per page
    pub pages: Vec<String>,
}

impl PdfDocument {
    /// Number of pages in the document
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Whether any page carries non-whitespace text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.trim().is_empty())
    }

    /// Total character count across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

/// Extract per-page text from an in-memory PDF
pub fn extract_document(bytes: &[u8]) -> Result<PdfDocument> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ParserError::PdfError(e.to_string()))?;

    // pdf-extract separates pages with form feeds
    let pages: Vec<String> = text.split('\x0C').map(|p| p.to_string()).collect();

    Ok(PdfDocument { pages })
}

/// Extract per-page text from a PDF file on disk
pub fn extract_document_from_path(path: &Path) -> Result<PdfDocument> {
    let bytes = std::fs::read(path).map_err(|e| ParserError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    extract_document(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_splitting() {
        let doc = PdfDocument {
            pages: "page one\x0Cpage two\x0Cpage three"
                .split('\x0C')
                .map(|p| p.to_string())
                .collect(),
        };

        assert_eq!(doc.page_count(), 3);
        assert!(doc.has_text());
    }

    #[test]
    fn test_blank_document() {
        let doc = PdfDocument {
            pages: vec!["".to_string(), "  \n".to_string()],
        };

        assert_eq!(doc.page_count(), 2);
        assert!(!doc.has_text());
        assert!(doc.char_count() > 0);
    }

    #[test]
    fn test_invalid_bytes_error() {
        let result = extract_document(b"not a pdf at all");
        assert!(matches!(result, Err(ParserError::PdfError(_))));
    }

    #[test]
    fn test_missing_file_error() {
        let result = extract_document_from_path(Path::new("/nonexistent/manual.pdf"));
        assert!(matches!(result, Err(ParserError::IoError { .. })));
    }
}
