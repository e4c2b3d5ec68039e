use std::path::Path;

use crate::document::loader::{self, ContentFilter};
use crate::document::{Chunk, Document, TextSplitter};
use crate::error::{RagError, Result};

/// Loads documents and cuts them into chunks with one fixed splitter.
pub struct DocumentProcessor {
    splitter: TextSplitter,
    client: reqwest::Client,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ragkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            splitter: TextSplitter::new(chunk_size, chunk_overlap)?,
            client,
        })
    }

    pub async fn load_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<Document>> {
        loader::load_from_file(path).await
    }

    /// Fetches pages keeping the post content, title and header elements unless
    /// another `filter` is given.
    pub async fn load_from_web(&self, urls: &[String], filter: Option<&ContentFilter>) -> Result<Vec<Document>> {
        let default_filter = ContentFilter::default();
        loader::load_from_web(&self.client, urls, filter.unwrap_or(&default_filter)).await
    }

    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks = self.splitter.split_documents(documents);
        log::debug!("Split {} documents into {} chunks", documents.len(), chunks.len());
        chunks
    }

    pub async fn process_file(&self, path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
        let documents = self.load_from_file(path).await?;
        Ok(self.split(&documents))
    }

    pub async fn process_web(&self, urls: &[String]) -> Result<Vec<Chunk>> {
        let documents = self.load_from_web(urls, None).await?;
        Ok(self.split(&documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_bad_chunking() {
        assert!(DocumentProcessor::new(200, 200).is_err());
    }

    #[tokio::test]
    async fn process_file_chunks_with_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let text = (0..200).map(|i| format!("token{}", i)).collect::<Vec<_>>().join(" ");
        write!(file, "{}", text).unwrap();

        let processor = DocumentProcessor::new(100, 20).unwrap();
        let chunks = processor.process_file(file.path()).await.unwrap();

        assert!(chunks.len() > 1);
        let source = file.path().display().to_string();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 100);
            assert_eq!(chunk.source(), Some(source.as_str()));
        }
    }

    #[tokio::test]
    async fn process_web_propagates_fetch_errors() {
        let processor = DocumentProcessor::new(100, 20).unwrap();
        let err = processor.process_web(&["::".to_string()]).await.unwrap_err();
        assert!(matches!(err, RagError::Fetch { .. }));
    }
}
