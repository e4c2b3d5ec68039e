use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, vectors_config, with_payload_selector::SelectorOptions,
        CollectionExistsRequest, CreateCollection, Distance, GetCollectionInfoRequest, PointId,
        PointStruct, SearchPoints, UpsertPoints, Value, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
    Qdrant,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::database::backend::{store_error, IndexBackend, IndexDescription, Metric, VectorRecord};
use crate::database::qdrant_config::create_qdrant_client;
use crate::document::{Chunk, Metadata};
use crate::error::Result;

const UPSERT_BATCH_SIZE: usize = 100;
const TEXT_KEY: &str = "text";

/// Qdrant collections used as indexes.
#[derive(Clone)]
pub struct QdrantBackend {
    client: Arc<Qdrant>,
}

impl QdrantBackend {
    pub async fn new(url: &str, api_key: Option<&str>) -> Result<Self> {
        let client = create_qdrant_client(url, api_key).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

fn to_distance(metric: Metric) -> Distance {
    match metric {
        Metric::Cosine => Distance::Cosine,
        Metric::Euclidean => Distance::Euclid,
        Metric::DotProduct => Distance::Dot,
    }
}

fn from_distance(distance: i32) -> Metric {
    match Distance::try_from(distance) {
        Ok(Distance::Euclid) => Metric::Euclidean,
        Ok(Distance::Dot) => Metric::DotProduct,
        _ => Metric::Cosine,
    }
}

fn to_payload(chunk: Chunk) -> HashMap<String, Value> {
    let mut payload: HashMap<String, Value> = chunk
        .metadata
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();
    payload.insert(TEXT_KEY.to_string(), Value::from(chunk.text));
    payload
}

fn from_payload(payload: &HashMap<String, Value>) -> Option<Chunk> {
    let text = payload.get(TEXT_KEY)?.as_str()?.to_string();
    let metadata: Metadata = payload
        .iter()
        .filter(|(k, _)| k.as_str() != TEXT_KEY)
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();
    Some(Chunk::new(text, metadata))
}

#[async_trait]
impl IndexBackend for QdrantBackend {
    fn kind(&self) -> &'static str {
        "qdrant"
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        let exists = self
            .client
            .collection_exists(CollectionExistsRequest {
                collection_name: name.to_string(),
            })
            .await
            .map_err(store_error)?;
        if !exists {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(GetCollectionInfoRequest {
                collection_name: name.to_string(),
            })
            .await
            .map_err(store_error)?;

        let params = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match params {
            Some(vectors_config::Config::Params(params)) => Ok(Some(IndexDescription {
                name: name.to_string(),
                dimension: params.size as usize,
                metric: from_distance(params.distance),
                host: None,
            })),
            _ => Err(store_error(format!(
                "Collection {} has no single unnamed vector configuration",
                name
            ))),
        }
    }

    async fn create_index(&self, name: &str, dimension: usize, metric: Metric) -> Result<()> {
        let vectors_config = VectorsConfig {
            config: Some(vectors_config::Config::Params(VectorParams {
                size: dimension as u64,
                distance: to_distance(metric).into(),
                ..Default::default()
            })),
        };

        let create_collection = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(vectors_config),
            ..Default::default()
        };

        match self.client.create_collection(create_collection).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already exists") || e.to_string().contains("AlreadyExists") => {
                log::info!("Collection {} already exists, skipping creation", name);
                Ok(())
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn upsert(&self, index: &IndexDescription, records: Vec<VectorRecord>) -> Result<()> {
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| PointStruct {
                id: Some(PointId {
                    point_id_options: Some(PointIdOptions::Uuid(record.id)),
                }),
                vectors: Some(record.vector.into()),
                payload: to_payload(record.chunk),
            })
            .collect();

        for batch in points.chunks(UPSERT_BATCH_SIZE) {
            let upsert_points = UpsertPoints {
                collection_name: index.name.clone(),
                wait: Some(true),
                points: batch.to_vec(),
                ..Default::default()
            };
            self.client.upsert_points(upsert_points).await.map_err(store_error)?;
        }
        Ok(())
    }

    async fn query(&self, index: &IndexDescription, vector: Vec<f32>, k: usize) -> Result<Vec<(Chunk, f32)>> {
        let request = SearchPoints {
            collection_name: index.name.clone(),
            vector,
            limit: k as u64,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let results = self.client.search_points(request).await.map_err(store_error)?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| from_payload(&point.payload).map(|chunk| (chunk, point.score)))
            .collect())
    }
}
