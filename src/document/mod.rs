mod loader;
mod processor;
mod splitter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use loader::{extract_content, load_from_file, load_from_web, ContentFilter, DEFAULT_CONTENT_CLASSES};
pub use processor::DocumentProcessor;
pub use splitter::{TextSplitter, DEFAULT_SEPARATORS};

pub type Metadata = BTreeMap<String, String>;

/// A unit of loaded text and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// A bounded slice of a document, the unit that gets embedded and retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}
