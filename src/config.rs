use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use validator::Validate;

use crate::error::{RagError, Result};
use crate::providers::traits::{ModelMode, SamplingConfig};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_INDEX_NAME: &str = "rag-knowledge-base";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u16 = 2000;
pub const DEFAULT_TOP_K: usize = 4;

/// Which vector index implementation backs the store manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackendKind {
    Pinecone,
    Qdrant,
    Local,
}

impl FromStr for VectorBackendKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Ok(Self::Pinecone),
            "qdrant" => Ok(Self::Qdrant),
            "local" | "embedded" => Ok(Self::Local),
            other => Err(RagError::InvalidConfig(format!(
                "VECTOR_STORE must be one of pinecone, qdrant, local (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for VectorBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pinecone => "pinecone",
            Self::Qdrant => "qdrant",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// Immutable runtime settings, loaded once at startup.
#[derive(Debug, Clone, Validate)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    #[validate(length(min = 1))]
    pub openai_model: String,
    #[validate(length(min = 1))]
    pub openai_embedding_model: String,
    pub llm_mode: ModelMode,
    pub vector_backend: VectorBackendKind,
    pub pinecone_api_key: Option<String>,
    pub pinecone_environment: String,
    pub pinecone_cloud: String,
    #[validate(length(min = 1))]
    pub index_name: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub local_store_dir: PathBuf,
    #[validate(range(min = 1))]
    pub embedding_dimension: usize,
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1))]
    pub max_tokens: u16,
    #[validate(range(min = 1))]
    pub top_k: usize,
}

impl Settings {
    /// Loads `.env` (if present) and then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let openai_api_key = get("OPENAI_API_KEY").ok_or(RagError::MissingCredential("OPENAI_API_KEY"))?;

        let vector_backend = match get("VECTOR_STORE") {
            Some(v) => v.parse()?,
            None => VectorBackendKind::Pinecone,
        };

        let pinecone_api_key = get("PINECONE_API_KEY");
        if vector_backend == VectorBackendKind::Pinecone && pinecone_api_key.is_none() {
            return Err(RagError::MissingCredential("PINECONE_API_KEY"));
        }

        let openai_embedding_model =
            get("OPENAI_EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let embedding_dimension = match get("EMBEDDING_DIMENSION") {
            Some(v) => parse_number("EMBEDDING_DIMENSION", &v)?,
            None => known_embedding_dimension(&openai_embedding_model),
        };

        let llm_mode = match get("LLM_MODE") {
            Some(v) => v.parse()?,
            None => ModelMode::Chat,
        };

        let settings = Self {
            openai_api_key,
            openai_api_base: get("OPENAI_API_BASE"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            openai_embedding_model,
            llm_mode,
            vector_backend,
            pinecone_api_key,
            pinecone_environment: get("PINECONE_ENVIRONMENT").unwrap_or_else(|| "us-east-1".to_string()),
            pinecone_cloud: get("PINECONE_CLOUD").unwrap_or_else(|| "aws".to_string()),
            index_name: get("PINECONE_INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            qdrant_url: get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string()),
            qdrant_api_key: get("QDRANT_API_KEY"),
            local_store_dir: get("LOCAL_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./vector_store")),
            embedding_dimension,
            chunk_size: optional_number(&get, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: optional_number(&get, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            temperature: optional_number(&get, "TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: optional_number(&get, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            top_k: optional_number(&get, "RETRIEVER_K", DEFAULT_TOP_K)?,
        };

        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| RagError::InvalidConfig(e.to_string()))?;
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            model: self.openai_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Vector width of the OpenAI embedding models we know about.
pub fn known_embedding_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| RagError::InvalidConfig(format!("{} is not a valid number: '{}'", key, raw)))
}

fn optional_number<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_number(key, &raw),
        None => Ok(default),
    }
}
