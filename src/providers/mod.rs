pub mod openai;
pub mod traits;

pub use openai::{OpenAIEmbeddings, OpenAIModel};
pub use traits::{EmbeddingProvider, LanguageModel, ModelMode, SamplingConfig};
