//! Sliding word-window chunker.
//!
//! Text is split on whitespace into words. Windows of up to `size` words
//! start at `0, size - overlap, 2 * (size - overlap), …` and stop once
//! the start reaches the word count, so the last window may be short and
//! consecutive windows share `overlap` words.
//!
//! ```rust
//! use pdf_ingest::chunk::Chunker;
//!
//! let chunker = Chunker::new(3, 1).unwrap();
//! let chunks: Vec<String> = chunker.windows("a b c d e").collect();
//! assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
//! ```

use crate::error::{IngestError, Result};
use crate::models::Chunk;

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Builds a chunker. Rejects `size == 0` and `overlap >= size`, either of
    /// which would produce a window that never advances.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(IngestError::Config("chunk size must be > 0".to_string()));
        }
        if overlap >= size {
            return Err(IngestError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Lazily yields the window texts, words joined by a single space.
    /// Empty or all-whitespace text yields nothing.
    pub fn windows<'a>(&self, text: &'a str) -> WordWindows<'a> {
        WordWindows {
            words: text.split_whitespace().collect(),
            size: self.size,
            step: self.step(),
            start: 0,
        }
    }

    /// Chunks a document's text, tagging each window with its reference and index.
    pub fn chunk_document<'a>(
        &self,
        document_ref: &'a str,
        text: &'a str,
    ) -> impl ExactSizeIterator<Item = Chunk> + 'a {
        self.windows(text)
            .enumerate()
            .map(move |(chunk_index, text)| Chunk {
                document_ref: document_ref.to_string(),
                chunk_index,
                text,
            })
    }
}

/// Iterator over word windows. Cloning it restarts from the current position.
#[derive(Debug, Clone)]
pub struct WordWindows<'a> {
    words: Vec<&'a str>,
    size: usize,
    step: usize,
    start: usize,
}

impl<'a> WordWindows<'a> {
    /// Total number of words in the source text.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

impl<'a> Iterator for WordWindows<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.start >= self.words.len() {
            return None;
        }
        let end = (self.start + self.size).min(self.words.len());
        let window = self.words[self.start..end].join(" ");
        self.start += self.step;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.words.len().saturating_sub(self.start);
        let n = remaining.div_ceil(self.step);
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for WordWindows<'a> {}
