use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::database::VectorStoreManager;
use crate::document::{Chunk, DocumentProcessor};
use crate::error::Result;
use crate::providers::traits::EmbeddingProvider;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    pb
}

pub async fn ingest_file(
    path: &str,
    processor: &DocumentProcessor,
    store: &VectorStoreManager,
    embedder: &dyn EmbeddingProvider,
) -> std::result::Result<usize, String> {
    println!("📄 Ingesting file: {}", path.bright_yellow());
    let pb = spinner(format!("Processing {}", path));
    let result = async {
        let chunks = processor.process_file(path).await?;
        store_chunks(&pb, chunks, store, embedder).await
    }
    .await;
    finish(pb, result)
}

pub async fn ingest_url(
    url: &str,
    processor: &DocumentProcessor,
    store: &VectorStoreManager,
    embedder: &dyn EmbeddingProvider,
) -> std::result::Result<usize, String> {
    println!("🌐 Ingesting page: {}", url.bright_yellow());
    let pb = spinner(format!("Fetching {}", url));
    let result = async {
        let chunks = processor.process_web(&[url.to_string()]).await?;
        store_chunks(&pb, chunks, store, embedder).await
    }
    .await;
    finish(pb, result)
}

async fn store_chunks(
    pb: &ProgressBar,
    chunks: Vec<Chunk>,
    store: &VectorStoreManager,
    embedder: &dyn EmbeddingProvider,
) -> Result<usize> {
    pb.set_message(format!("Embedding {} chunks", chunks.len()));
    let ids = store.ingest(&chunks, embedder).await?;
    Ok(ids.len())
}

fn finish(pb: ProgressBar, result: Result<usize>) -> std::result::Result<usize, String> {
    match result {
        Ok(count) => {
            pb.finish_with_message(format!("Stored {} chunks", count));
            println!("✅ {} chunks added to the knowledge base", count.to_string().cyan());
            Ok(count)
        }
        Err(e) => {
            pb.abandon_with_message("Ingestion failed");
            Err(format!("Failed to ingest: {}", e))
        }
    }
}
