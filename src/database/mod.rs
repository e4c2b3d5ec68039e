pub mod backend;
pub mod local;
pub mod pinecone;
pub mod qdrant;
pub mod qdrant_config;
pub mod retriever;
pub mod vector_db;

pub use backend::{IndexBackend, IndexDescription, Metric, VectorRecord};
pub use local::LocalBackend;
pub use pinecone::PineconeBackend;
pub use qdrant::QdrantBackend;
pub use retriever::{ChunkRetriever, Retriever};
pub use vector_db::{IndexState, VectorStoreManager};

use crate::config::{Settings, VectorBackendKind};
use crate::error::{RagError, Result};

/// Builds the backend named in the settings, passing credentials in directly.
pub async fn backend_from_settings(settings: &Settings) -> Result<Box<dyn IndexBackend>> {
    let backend: Box<dyn IndexBackend> = match settings.vector_backend {
        VectorBackendKind::Pinecone => {
            let api_key = settings
                .pinecone_api_key
                .as_deref()
                .ok_or(RagError::MissingCredential("PINECONE_API_KEY"))?;
            Box::new(PineconeBackend::new(
                api_key,
                settings.pinecone_cloud.as_str(),
                settings.pinecone_environment.as_str(),
            ))
        }
        VectorBackendKind::Qdrant => {
            Box::new(QdrantBackend::new(&settings.qdrant_url, settings.qdrant_api_key.as_deref()).await?)
        }
        VectorBackendKind::Local => Box::new(LocalBackend::new(settings.local_store_dir.clone())),
    };
    log::info!("Using {} vector store", backend.kind());
    Ok(backend)
}
