use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::database::backend::{store_error, IndexBackend, IndexDescription, Metric, VectorRecord};
use crate::document::{Chunk, Metadata};
use crate::error::{RagError, Result};

pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";
const UPSERT_BATCH_SIZE: usize = 100;
const TEXT_KEY: &str = "text";
const READY_POLL_ATTEMPTS: usize = 60;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    metric: Metric,
    host: String,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<PineconeVector>,
}

#[derive(Debug, Serialize)]
struct PineconeVector {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[allow(dead_code)]
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

/// Pinecone serverless indexes over the REST API.
#[derive(Clone)]
pub struct PineconeBackend {
    client: Client,
    api_key: String,
    cloud: String,
    region: String,
    control_plane: String,
}

impl PineconeBackend {
    pub fn new(api_key: impl Into<String>, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            cloud: cloud.into(),
            region: region.into(),
            control_plane: CONTROL_PLANE_URL.to_string(),
        }
    }

    pub fn with_control_plane(mut self, url: impl Into<String>) -> Self {
        self.control_plane = url.into().trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn fetch_index(&self, name: &str) -> Result<Option<IndexModel>> {
        let response = self
            .authorized(self.client.get(format!("{}/indexes/{}", self.control_plane, name)))
            .send()
            .await
            .map_err(store_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(store_error(format!(
                "Describe index failed: Status {}, Body: {}",
                status, error_text
            )));
        }
        response.json().await.map(Some).map_err(store_error)
    }

    async fn wait_until_ready(&self, name: &str) -> Result<()> {
        for _ in 0..READY_POLL_ATTEMPTS {
            if let Some(index) = self.fetch_index(name).await? {
                if index.status.map_or(true, |s| s.ready) {
                    return Ok(());
                }
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Err(store_error(format!("Index {} did not become ready", name)))
    }

    async fn post_data_plane<T: Serialize>(&self, index: &IndexDescription, path: &str, body: &T) -> Result<reqwest::Response> {
        let host = index
            .host
            .as_deref()
            .ok_or_else(|| store_error(format!("Index {} has no data-plane host", index.name)))?;
        let response = self
            .authorized(self.client.post(data_plane_url(host, path)))
            .json(body)
            .send()
            .await
            .map_err(store_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(store_error(format!(
                "Pinecone {} failed: Status {}, Body: {}",
                path, status, error_text
            )));
        }
        Ok(response)
    }
}

fn data_plane_url(host: &str, path: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{}", host.trim_end_matches('/'), path)
    } else {
        format!("https://{}{}", host.trim_end_matches('/'), path)
    }
}

fn to_vector(record: VectorRecord) -> PineconeVector {
    let mut metadata: Map<String, Value> = record
        .chunk
        .metadata
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    metadata.insert(TEXT_KEY.to_string(), Value::String(record.chunk.text));
    PineconeVector {
        id: record.id,
        values: record.vector,
        metadata,
    }
}

fn to_chunk(found: QueryMatch) -> Option<(Chunk, f32)> {
    let mut metadata = found.metadata?;
    let text = match metadata.remove(TEXT_KEY)? {
        Value::String(text) => text,
        _ => return None,
    };
    let metadata: Metadata = metadata
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();
    Some((Chunk::new(text, metadata), found.score))
}

#[async_trait]
impl IndexBackend for PineconeBackend {
    fn kind(&self) -> &'static str {
        "pinecone"
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        Ok(self.fetch_index(name).await?.map(|index| IndexDescription {
            name: index.name,
            dimension: index.dimension,
            metric: index.metric,
            host: Some(index.host),
        }))
    }

    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> Result<()> {
        let body = CreateIndexRequest {
            name,
            dimension,
            metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };

        let response = self
            .authorized(self.client.post(format!("{}/indexes", self.control_plane)))
            .json(&body)
            .send()
            .await
            .map_err(store_error)?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            log::info!("Index {} already exists, skipping creation", name);
            return Ok(());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(store_error(format!(
                "Create index failed: Status {}, Body: {}",
                status, error_text
            )));
        }

        log::info!("Created index {} ({} dims, {}), waiting for it to become ready", name, dimension, metric);
        self.wait_until_ready(name).await
    }

    async fn upsert(&self, index: &IndexDescription, records: Vec<VectorRecord>) -> Result<()> {
        let vectors: Vec<PineconeVector> = records.into_iter().map(to_vector).collect();
        let mut vectors = vectors.into_iter().peekable();
        while vectors.peek().is_some() {
            let batch: Vec<PineconeVector> = vectors.by_ref().take(UPSERT_BATCH_SIZE).collect();
            log::debug!("Upserting {} vectors into {}", batch.len(), index.name);
            self.post_data_plane(index, "/vectors/upsert", &UpsertRequest { vectors: batch })
                .await?;
        }
        Ok(())
    }

    async fn query(&self, index: &IndexDescription, vector: Vec<f32>, k: usize) -> Result<Vec<(Chunk, f32)>> {
        let request = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            include_values: false,
        };
        let response: QueryResponse = self
            .post_data_plane(index, "/query", &request)
            .await?
            .json()
            .await
            .map_err(|e| RagError::VectorStore(format!("Invalid query response: {}", e)))?;

        Ok(response.matches.into_iter().filter_map(to_chunk).collect())
    }
}
