pub mod commands;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod llm;
pub mod providers;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export commonly used items
pub use config::Settings;
pub use database::{IndexBackend, VectorStoreManager};
pub use document::{Chunk, Document, DocumentProcessor};
pub use error::{RagError, Result};
pub use llm::{Answer, RagChain};
