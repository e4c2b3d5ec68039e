use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Similarity metric an index is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::DotProduct => "dotproduct",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" | "euclid" => Ok(Metric::Euclidean),
            "dotproduct" | "dot" => Ok(Metric::DotProduct),
            other => Err(RagError::VectorStore(format!("Unknown metric: {}", other))),
        }
    }
}

/// What a backend knows about an existing index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    /// Data-plane address, for services that serve each index from its own host.
    pub host: Option<String>,
}

/// One chunk with its embedding, ready to be written.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// Storage operations a vector database must offer. The lifecycle rules live in
/// [`crate::database::VectorStoreManager`]; backends only talk to storage.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    fn kind(&self) -> &'static str;

    /// `None` when no index of that name exists.
    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>>;

    /// Provisions a new index. An "already exists" answer from the service is not an error.
    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> Result<()>;

    async fn upsert(&self, index: &IndexDescription, records: Vec<VectorRecord>) -> Result<()>;

    /// Nearest `k` chunks to `vector`, nearest first, with the backend's score.
    async fn query(&self, index: &IndexDescription, vector: Vec<f32>, k: usize) -> Result<Vec<(Chunk, f32)>>;
}

pub(crate) fn store_error(e: impl ToString) -> RagError {
    RagError::VectorStore(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_match_service_spelling() {
        assert_eq!(Metric::DotProduct.to_string(), "dotproduct");
        assert_eq!(serde_json::to_string(&Metric::Cosine).unwrap(), "\"cosine\"");
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert!("manhattan".parse::<Metric>().is_err());
    }
}
