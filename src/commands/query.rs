use std::sync::Arc;

use crate::database::VectorStoreManager;
use crate::llm::{LineReader, RagChain};
use crate::providers::traits::{EmbeddingProvider, LanguageModel, SamplingConfig};

pub async fn run(
    store: &mut VectorStoreManager,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    sampling: &SamplingConfig,
    top_k: usize,
    input: &mut dyn LineReader,
) -> Result<usize, String> {
    store
        .connect(embedder)
        .await
        .map_err(|e| format!("Failed to connect to the index: {}", e))?;

    let chain = RagChain::new(store.as_retriever(top_k), model, sampling.clone());
    chain
        .interactive_loop(input)
        .await
        .map_err(|e| format!("Question loop stopped: {}", e))
}
