use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::database::backend::{IndexBackend, IndexDescription, Metric, VectorRecord};
use crate::database::retriever::Retriever;
use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::providers::traits::EmbeddingProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Created,
    Connected,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexState::Uninitialized => "uninitialized",
            IndexState::Created => "created",
            IndexState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Owns the lifecycle of one named index on some [`IndexBackend`].
///
/// `create_index` moves the manager to `Created`, `connect` to `Connected`.
/// Ingestion needs either state; searching needs `Connected`, because that is
/// when the query embedder gets bound.
pub struct VectorStoreManager {
    backend: Box<dyn IndexBackend>,
    index_name: String,
    state: IndexState,
    index: Option<IndexDescription>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl VectorStoreManager {
    pub fn new(backend: Box<dyn IndexBackend>, index_name: impl Into<String>) -> Self {
        Self {
            backend,
            index_name: index_name.into(),
            state: IndexState::Uninitialized,
            index: None,
            embedder: None,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Provisions the index unless one with the same name already exists.
    pub async fn create_index(&mut self, dimension: usize, metric: Metric) -> Result<()> {
        match self.backend.describe_index(&self.index_name).await? {
            Some(existing) => {
                if existing.dimension != dimension || existing.metric != metric {
                    log::warn!(
                        "Index {} already exists with {} dims/{}, requested {} dims/{}; keeping existing",
                        self.index_name,
                        existing.dimension,
                        existing.metric,
                        dimension,
                        metric
                    );
                } else {
                    log::info!("Index {} already exists, skipping creation", self.index_name);
                }
            }
            None => {
                log::info!(
                    "Creating {} index {} ({} dims, {})",
                    self.backend.kind(),
                    self.index_name,
                    dimension,
                    metric
                );
                self.backend.create_index(&self.index_name, dimension, metric).await?;
            }
        }

        let description = self
            .backend
            .describe_index(&self.index_name)
            .await?
            .ok_or_else(|| RagError::IndexNotFound(self.index_name.clone()))?;
        self.index = Some(description);
        if self.state == IndexState::Uninitialized {
            self.state = IndexState::Created;
        }
        Ok(())
    }

    /// Embeds and stores `chunks`, returning one new id per chunk in input order.
    pub async fn ingest(&self, chunks: &[Chunk], embedder: &dyn EmbeddingProvider) -> Result<Vec<String>> {
        let index = self.ready_index(&[IndexState::Created, IndexState::Connected])?;
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != index.dimension) {
            return Err(RagError::VectorStore(format!(
                "Embedding dimension {} does not match index {} dimension {}",
                bad.len(),
                index.name,
                index.dimension
            )));
        }

        let records: Vec<VectorRecord> = chunks
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                chunk,
            })
            .collect();
        let ids = records.iter().map(|r| r.id.clone()).collect();

        self.backend.upsert(index, records).await?;
        log::info!("Ingested {} chunks into {}", chunks.len(), index.name);
        Ok(ids)
    }

    /// Binds to an existing index without creating it.
    pub async fn connect(&mut self, embedder: Arc<dyn EmbeddingProvider>) -> Result<()> {
        let description = self
            .backend
            .describe_index(&self.index_name)
            .await?
            .ok_or_else(|| RagError::IndexNotFound(self.index_name.clone()))?;
        log::info!("Connected to {} index {}", self.backend.kind(), description.name);
        self.index = Some(description);
        self.embedder = Some(embedder);
        self.state = IndexState::Connected;
        Ok(())
    }

    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .similarity_search_with_score(query, k)
            .await?
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }

    pub async fn similarity_search_with_score(&self, query: &str, k: usize) -> Result<Vec<(Chunk, f32)>> {
        let index = self.ready_index(&[IndexState::Connected])?;
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| RagError::InvalidState("no embedding provider bound".to_string()))?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = embedder.embed(query).await?;
        self.backend.query(index, vector, k).await
    }

    pub fn as_retriever(&self, k: usize) -> Retriever<'_> {
        Retriever::new(self, k)
    }

    fn ready_index(&self, allowed: &[IndexState]) -> Result<&IndexDescription> {
        if !allowed.contains(&self.state) {
            return Err(RagError::InvalidState(format!(
                "index {} is {}",
                self.index_name, self.state
            )));
        }
        self.index
            .as_ref()
            .ok_or_else(|| RagError::InvalidState(format!("index {} has no description", self.index_name)))
    }
}
