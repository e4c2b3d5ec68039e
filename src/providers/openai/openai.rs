use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateCompletionRequestArgs, CreateEmbeddingRequestArgs, EmbeddingInput,
    },
    Client,
};
use async_trait::async_trait;

use crate::error::{RagError, Result};
use crate::providers::traits::{EmbeddingProvider, LanguageModel, ModelMode, SamplingConfig};

/// Inputs per embeddings request.
pub const EMBEDDING_BATCH_SIZE: usize = 100;

fn build_client(api_key: &str, api_base: Option<&str>) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Client::with_config(config)
}

#[derive(Clone)]
pub struct OpenAIEmbeddings {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: &str, api_base: Option<&str>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client: build_client(api_key, api_base),
            model: model.into(),
            dimension,
        }
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .build()
            .map_err(embedding_error)?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(embedding_error)?;

        let mut data = response.data;
        if data.len() != expected {
            return Err(RagError::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| RagError::EmbeddingService("No embedding returned from OpenAI".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            log::debug!("Embedding batch of {} texts with {}", batch.len(), self.model);
            embeddings.extend(self.request(batch.to_vec()).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Clone)]
pub struct OpenAIModel {
    client: Client<OpenAIConfig>,
    mode: ModelMode,
}

impl OpenAIModel {
    pub fn new(api_key: &str, api_base: Option<&str>, mode: ModelMode) -> Self {
        Self {
            client: build_client(api_key, api_base),
            mode,
        }
    }

    async fn chat(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(model_error)?
            .into();
        let request = CreateChatCompletionRequestArgs::default()
            .model(&sampling.model)
            .temperature(sampling.temperature)
            .max_tokens(sampling.max_tokens)
            .messages(vec![message])
            .build()
            .map_err(model_error)?;

        let response = self.client.chat().create(request).await.map_err(model_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::ModelService("No response content".to_string()))
    }

    async fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let request = CreateCompletionRequestArgs::default()
            .model(&sampling.model)
            .prompt(prompt)
            .temperature(sampling.temperature)
            .max_tokens(sampling.max_tokens)
            .build()
            .map_err(model_error)?;

        let response = self.client.completions().create(request).await.map_err(model_error)?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| RagError::ModelService("No completion returned".to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAIModel {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        log::debug!(
            "Generating with {} ({:?}), prompt of {} chars",
            sampling.model,
            self.mode,
            prompt.chars().count()
        );
        match self.mode {
            ModelMode::Chat => self.chat(prompt, sampling).await,
            ModelMode::Completion => self.complete(prompt, sampling).await,
        }
    }
}

fn embedding_error(e: OpenAIError) -> RagError {
    RagError::EmbeddingService(e.to_string())
}

fn model_error(e: OpenAIError) -> RagError {
    RagError::ModelService(e.to_string())
}
