use anyhow::Context;
use colored::Colorize;
use ragkit::commands::CommandHandler;
use ragkit::config::Settings;
use ragkit::database::{backend_from_settings, Metric, VectorStoreManager};
use ragkit::document::DocumentProcessor;
use ragkit::providers::traits::{EmbeddingProvider, LanguageModel};
use ragkit::providers::{OpenAIEmbeddings, OpenAIModel};
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Loads .env first; a missing credential stops here before any network call
    let settings = Settings::from_env().context("Failed to load configuration")?;
    log::info!(
        "Starting with {} backend, index {}",
        settings.vector_backend,
        settings.index_name
    );

    let processor = DocumentProcessor::new(settings.chunk_size, settings.chunk_overlap)?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAIEmbeddings::new(
        &settings.openai_api_key,
        settings.openai_api_base.as_deref(),
        settings.openai_embedding_model.clone(),
        settings.embedding_dimension,
    ));
    let model: Arc<dyn LanguageModel> = Arc::new(OpenAIModel::new(
        &settings.openai_api_key,
        settings.openai_api_base.as_deref(),
        settings.llm_mode,
    ));

    let backend = backend_from_settings(&settings).await?;
    let mut store = VectorStoreManager::new(backend, settings.index_name.clone());
    store
        .create_index(embedder.dimension(), Metric::Cosine)
        .await
        .with_context(|| format!("Failed to prepare index {}", settings.index_name))?;

    let mut command_handler = CommandHandler::new(&settings, processor, embedder, model, store);

    println!("{}", "RAG knowledge base ready".bright_green().bold());
    let mut rl = Editor::<(), DefaultHistory>::new()?;
    command_handler.run(&mut rl).await?;

    Ok(())
}
