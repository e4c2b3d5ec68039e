use async_trait::async_trait;
use std::str::FromStr;

use crate::error::{RagError, Result};

/// Parameters for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u16,
}

/// How a language model is addressed: structured chat messages or a raw completion prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelMode {
    #[default]
    Chat,
    Completion,
}

impl FromStr for ModelMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "completion" | "legacy" => Ok(Self::Completion),
            other => Err(RagError::InvalidConfig(format!(
                "LLM_MODE must be 'chat' or 'completion' (got '{}')",
                other
            ))),
        }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds many texts, returning vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String>;
}
