pub mod openai;

pub use openai::{OpenAIEmbeddings, OpenAIModel};
