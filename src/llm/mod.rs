pub mod chain;
pub mod input;
pub mod prompt;

pub use chain::{format_context, parse_output, Answer, RagChain};
pub use input::LineReader;
pub use prompt::PromptTemplate;
