use qdrant_client::{config::QdrantConfig, Qdrant};
use std::time::Duration;

use crate::error::{RagError, Result};

/// Normalises a Qdrant URL to the gRPC endpoint: adds a scheme if missing and
/// swaps the REST port 6333 for the gRPC port 6334.
pub fn grpc_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", url),
    };
    let rest = rest.trim_end_matches('/');
    let rest = match rest.strip_suffix(":6333") {
        Some(host) => format!("{}:6334", host),
        None => rest.to_string(),
    };
    format!("{}://{}", scheme, rest)
}

pub async fn create_qdrant_client(url: &str, api_key: Option<&str>) -> Result<Qdrant> {
    let url = grpc_url(url);
    log::info!("Attempting to connect to Qdrant with URL: {}", url);

    let mut config = QdrantConfig::from_url(&url);
    config.check_compatibility = false;
    config.timeout = Duration::from_secs(30);
    config.connect_timeout = Duration::from_secs(10);
    config.api_key = api_key.map(str::to_string);

    let client = Qdrant::new(config).map_err(|e| RagError::VectorStore(e.to_string()))?;

    match client.list_collections().await {
        Ok(_) => {
            log::info!("Successfully connected to Qdrant");
            Ok(client)
        }
        Err(e) => {
            log::error!("Connection test failed: {}", e);
            Err(RagError::VectorStore(format!("Failed to connect to Qdrant: {}", e)))
        }
    }
}
