use async_trait::async_trait;

use crate::database::vector_db::VectorStoreManager;
use crate::document::Chunk;
use crate::error::Result;

/// Anything that can hand back the chunks most relevant to a query.
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>>;
}

/// Read-only view over a connected store that always asks for `k` neighbours.
#[derive(Clone, Copy)]
pub struct Retriever<'a> {
    store: &'a VectorStoreManager,
    k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a VectorStoreManager, k: usize) -> Self {
        Self { store, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

#[async_trait]
impl ChunkRetriever for Retriever<'_> {
    async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        self.store.similarity_search(query, self.k).await
    }
}
