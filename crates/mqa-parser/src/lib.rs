//! MQA Parser - PDF text extraction and chunking
//!
//! Turns an uploaded PDF into a sequence of overlapping text chunks,
//! each tagged with the page it was cut from. Chunks are bounded by a
//! character-length window and cut at approximate sentence boundaries
//! so that embeddings see mostly complete sentences.

use thiserror::Error;

pub mod pdf;

pub use pdf::{extract_document, PdfDocument};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during document parsing
#[derive(Error, Debug)]
pub enum ParserError {
    /// PDF parsing error
    #[error("PDF parsing error: {0}")]
    PdfError(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Chunking
// ============================================================================

/// Configuration for document chunking
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub overlap: usize,

    /// How far back from the window edge to search for a sentence end
    pub boundary_window: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            boundary_window: 100,
        }
    }
}

impl ChunkConfig {
    /// Create a config with explicit window size and overlap
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            ..Self::default()
        }
    }
}

/// A chunk of text cut from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Chunk content, trimmed
    pub content: String,

    /// Chunk index, global across the document
    pub index: u32,

    /// 1-based page the chunk was cut from
    pub page: u32,
}

/// Chunk every non-blank page of a document
///
/// Chunk indexes are assigned globally in reading order; pages that are
/// blank after extraction are skipped but still count toward the page
/// numbering.
pub fn chunk_document(doc: &PdfDocument, config: &ChunkConfig) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut index = 0u32;

    for (page_idx, page_text) in doc.pages.iter().enumerate() {
        if page_text.trim().is_empty() {
            continue;
        }

        for content in split_text(page_text, config) {
            chunks.push(TextChunk {
                content,
                index,
                page: page_idx as u32 + 1,
            });
            index += 1;
        }
    }

    chunks
}

/// Split a text into overlapping windows cut at sentence boundaries
///
/// The window advances by `chunk_size - overlap` characters per step, so
/// `chunk_size` must exceed `overlap` for the scan to make progress.
/// All arithmetic is in characters, never bytes.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        // end is deliberately left unclamped; the final window past the
        // text end is what terminates the loop after the overlap step.
        let mut end = start + config.chunk_size;

        if end < total {
            end = sentence_boundary(&chars, start, end, config.boundary_window);
        }

        let slice_end = end.min(total);
        let content: String = chars[start..slice_end].iter().collect();
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        let next = end.saturating_sub(config.overlap);
        if next >= total {
            break;
        }
        // Guard against a degenerate config (overlap >= window) looping forever
        start = if next > start { next } else { slice_end };
    }

    chunks
}

/// Scan backwards from the window edge for a sentence-ending character
///
/// Returns the cut position just after the sentence end, or the original
/// edge when no terminator falls within the search window.
fn sentence_boundary(chars: &[char], start: usize, end: usize, window: usize) -> usize {
    let floor = end.saturating_sub(window).max(start);

    for i in (floor + 1..=end).rev() {
        if matches!(chars[i], '.' | '!' | '?') {
            return i + 1;
        }
    }

    end
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_pages(pages: Vec<&str>) -> PdfDocument {
        PdfDocument {
            pages: pages.into_iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let config = ChunkConfig::default();
        let chunks = split_text("The filter section controls brightness.", &config);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "The filter section controls brightness.");
    }

    #[test]
    fn test_window_and_overlap() {
        let config = ChunkConfig {
            chunk_size: 200,
            overlap: 50,
            boundary_window: 40,
        };
        let text = "This is a sentence. ".repeat(50);
        let chunks = split_text(&text, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= config.chunk_size);
        }
        // Overlap: the start of each chunk repeats the tail of the previous one
        for window in chunks.windows(2) {
            let head: String = window[1].chars().take(10).collect();
            assert!(window[0].contains(&head));
        }
    }

    #[test]
    fn test_sentence_boundary_cut() {
        let config = ChunkConfig {
            chunk_size: 50,
            overlap: 10,
            boundary_window: 30,
        };
        let text = "First sentence here. Second sentence is a bit longer here. Third one.";
        let chunks = split_text(text, &config);

        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn test_no_punctuation_hard_cut() {
        let config = ChunkConfig {
            chunk_size: 20,
            overlap: 5,
            boundary_window: 10,
        };
        let text = "abcdefghij".repeat(10);
        let chunks = split_text(&text, &config);

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].chars().count(), 20);
    }

    #[test]
    fn test_multibyte_text_no_panic() {
        let config = ChunkConfig {
            chunk_size: 30,
            overlap: 10,
            boundary_window: 15,
        };
        let text = "주파수를 조절하세요. これはフィルターです. Réglez la fréquence. ".repeat(20);
        let chunks = split_text(&text, &config);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= config.chunk_size);
        }
    }

    #[test]
    fn test_empty_text() {
        let config = ChunkConfig::default();
        assert!(split_text("", &config).is_empty());
        assert!(split_text("   \n\t  ", &config).is_empty());
    }

    #[test]
    fn test_degenerate_config_terminates() {
        // overlap >= chunk_size would stall a naive scan
        let config = ChunkConfig {
            chunk_size: 10,
            overlap: 10,
            boundary_window: 5,
        };
        let chunks = split_text(&"x".repeat(100), &config);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_chunk_document_page_numbers() {
        let config = ChunkConfig::default();
        let doc = doc_with_pages(vec![
            "Page one content about oscillators.",
            "",
            "Page three content about envelopes.",
        ]);

        let chunks = chunk_document(&doc, &config);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 3);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_chunk_document_global_indexes() {
        let config = ChunkConfig {
            chunk_size: 50,
            overlap: 10,
            boundary_window: 20,
        };
        let long_page = "A sentence goes here. ".repeat(10);
        let doc = doc_with_pages(vec![&long_page, &long_page]);

        let chunks = chunk_document(&doc, &config);

        let indexes: Vec<u32> = chunks.iter().map(|c| c.index).collect();
        let expected: Vec<u32> = (0..chunks.len() as u32).collect();
        assert_eq!(indexes, expected);
        assert!(chunks.iter().any(|c| c.page == 2));
    }

    #[test]
    fn test_blank_document_yields_no_chunks() {
        let config = ChunkConfig::default();
        let doc = doc_with_pages(vec!["", "  "]);
        assert!(chunk_document(&doc, &config).is_empty());
    }
}
