use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::database::backend::{store_error, IndexBackend, IndexDescription, Metric, VectorRecord};
use crate::document::{Chunk, Metadata};
use crate::error::{RagError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    name: String,
    dimension: usize,
    metric: Metric,
    created_at: DateTime<Utc>,
    records: Vec<StoredRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    vector: Vec<f32>,
    text: String,
    metadata: Metadata,
}

/// Embedded store: one JSON file per index, searched by exact scan.
pub struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn index_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    async fn read(&self, name: &str) -> Result<Option<IndexFile>> {
        let path = self.index_path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| store_error(format!("Corrupt index file {}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RagError::io(path, e)),
        }
    }

    async fn write(&self, index: &IndexFile) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RagError::io(&self.dir, e))?;
        let path = self.index_path(&index.name);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(index).map_err(store_error)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| RagError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| RagError::io(&path, e))
    }
}

#[async_trait]
impl IndexBackend for LocalBackend {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        Ok(self.read(name).await?.map(|index| IndexDescription {
            name: index.name,
            dimension: index.dimension,
            metric: index.metric,
            host: None,
        }))
    }

    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> Result<()> {
        if self.read(name).await?.is_some() {
            return Ok(());
        }
        self.write(&IndexFile {
            name: name.to_string(),
            dimension,
            metric,
            created_at: Utc::now(),
            records: Vec::new(),
        })
        .await
    }

    async fn upsert(&self, index: &IndexDescription, records: Vec<VectorRecord>) -> Result<()> {
        let mut stored = self
            .read(&index.name)
            .await?
            .ok_or_else(|| RagError::IndexNotFound(index.name.clone()))?;

        for record in records {
            let entry = StoredRecord {
                id: record.id,
                vector: record.vector,
                text: record.chunk.text,
                metadata: record.chunk.metadata,
            };
            match stored.records.iter_mut().find(|r| r.id == entry.id) {
                Some(existing) => *existing = entry,
                None => stored.records.push(entry),
            }
        }

        self.write(&stored).await
    }

    async fn query(&self, index: &IndexDescription, vector: Vec<f32>, k: usize) -> Result<Vec<(Chunk, f32)>> {
        let stored = self
            .read(&index.name)
            .await?
            .ok_or_else(|| RagError::IndexNotFound(index.name.clone()))?;

        if vector.len() != stored.dimension {
            return Err(store_error(format!(
                "Query vector has dimension {}, index expects {}",
                vector.len(),
                stored.dimension
            )));
        }

        let mut scored: Vec<(f32, &StoredRecord)> = stored
            .records
            .iter()
            .map(|record| (score(stored.metric, &vector, &record.vector), record))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(s, record)| (Chunk::new(record.text.clone(), record.metadata.clone()), s))
            .collect())
    }
}

/// Higher is nearer for every metric.
fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine_similarity(a, b),
        Metric::DotProduct => dot(a, b),
        Metric::Euclidean => -a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>, text: &str) -> VectorRecord {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "test".to_string());
        VectorRecord {
            id: id.to_string(),
            vector,
            chunk: Chunk::new(text, metadata),
        }
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn euclidean_scores_closer_higher() {
        let near = score(Metric::Euclidean, &[0.0, 0.0], &[1.0, 0.0]);
        let far = score(Metric::Euclidean, &[0.0, 0.0], &[3.0, 4.0]);
        assert!(near > far);
        assert!((far + 5.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn create_is_idempotent_and_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        backend.create_index("kb", 2, Metric::Cosine).await.unwrap();
        let index = backend.describe_index("kb").await.unwrap().unwrap();
        backend.upsert(&index, vec![record("a", vec![1.0, 0.0], "alpha")]).await.unwrap();
        backend.create_index("kb", 2, Metric::Cosine).await.unwrap();

        let hits = backend.query(&index, vec![1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn describe_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().join("nested"));
        assert!(backend.describe_index("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_orders_nearest_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        backend.create_index("kb", 2, Metric::Cosine).await.unwrap();
        let index = backend.describe_index("kb").await.unwrap().unwrap();

        backend
            .upsert(
                &index,
                vec![
                    record("a", vec![0.0, 1.0], "north"),
                    record("b", vec![1.0, 0.0], "east"),
                    record("c", vec![0.7, 0.7], "north-east"),
                ],
            )
            .await
            .unwrap();

        let hits = backend.query(&index, vec![1.0, 0.1], 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|(c, _)| c.text.as_str()).collect();
        assert_eq!(texts, vec!["east", "north-east"]);
        assert!(hits[0].1 >= hits[1].1);
        assert_eq!(hits[0].0.source(), Some("test"));
    }

    #[tokio::test]
    async fn upsert_replaces_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        backend.create_index("kb", 2, Metric::DotProduct).await.unwrap();
        let index = backend.describe_index("kb").await.unwrap().unwrap();

        backend.upsert(&index, vec![record("a", vec![1.0, 0.0], "old")]).await.unwrap();
        backend.upsert(&index, vec![record("a", vec![1.0, 0.0], "new")]).await.unwrap();

        let hits = backend.query(&index, vec![1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.text, "new");
    }

    #[tokio::test]
    async fn query_rejects_wrong_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        backend.create_index("kb", 3, Metric::Cosine).await.unwrap();
        let index = backend.describe_index("kb").await.unwrap().unwrap();
        let err = backend.query(&index, vec![1.0], 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore(_)));
    }
}
