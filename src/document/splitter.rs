use std::collections::VecDeque;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Split points in priority order: paragraph, line, sentence, word, then a hard
/// character cut.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Recursive character splitter.
///
/// Text is cut at the highest-priority separator it contains, and any piece
/// still longer than `chunk_size` is cut again with the next separator. Pieces
/// keep their leading separator, so joining them reproduces the input exactly.
/// Pieces are then merged greedily into chunks of at most `chunk_size`
/// characters, each chunk starting with up to `chunk_overlap` characters of
/// whole pieces taken from the end of the previous one.
///
/// Sizes count Unicode scalar values, not bytes. Because the last separator is
/// always the empty string, a word longer than `chunk_size` is hard-cut and no
/// chunk ever exceeds the limit.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replaces the separator list. The hard-cut separator is appended if missing.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut separators: Vec<String> = separators.into_iter().map(Into::into).collect();
        if separators.last().map_or(true, |s| !s.is_empty()) {
            separators.retain(|s| !s.is_empty());
            separators.push(String::new());
        }
        self.separators = separators;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    /// Splits every document, copying its metadata onto each chunk along with
    /// the chunk's position within the document.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            for (index, text) in self.split_text(&document.content).into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), index.to_string());
                chunks.push(Chunk::new(text, metadata));
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()));
        let (pieces, remaining) = match position {
            Some(i) => (split_keep_start(text, &separators[i]), &separators[i + 1..]),
            None => (split_keep_start(text, ""), &separators[separators.len()..]),
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.extend(self.merge(&split_keep_start(piece, "")));
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                merged.push(join(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        if !window.is_empty() {
            merged.push(join(&window));
        }
        merged
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(piece, _)| *piece).collect()
}

/// Splits `text` before every occurrence of `separator`. An empty separator
/// yields single characters.
fn split_keep_start<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}
