use colored::Colorize;
use std::sync::Arc;

use crate::database::retriever::ChunkRetriever;
use crate::document::Chunk;
use crate::error::Result;
use crate::llm::input::LineReader;
use crate::llm::prompt::PromptTemplate;
use crate::providers::traits::{LanguageModel, SamplingConfig};

/// Words that end the interactive loop, compared case-insensitively.
pub const EXIT_WORDS: &[&str] = &["exit", "quit", "salir"];

/// Generated text plus the chunks it was conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Chunk>,
}

/// Joins chunk texts with a blank line, in retrieval order.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn parse_output(raw: &str) -> String {
    raw.trim().to_string()
}

pub fn is_exit_word(input: &str) -> bool {
    let input = input.trim();
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Question answering over a retriever: retrieve, format context, render
/// prompt, generate, parse.
pub struct RagChain<R> {
    retriever: R,
    model: Arc<dyn LanguageModel>,
    prompt: PromptTemplate,
    sampling: SamplingConfig,
}

impl<R: ChunkRetriever> RagChain<R> {
    pub fn new(retriever: R, model: Arc<dyn LanguageModel>, sampling: SamplingConfig) -> Self {
        Self {
            retriever,
            model,
            prompt: PromptTemplate::default(),
            sampling,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let sources = self.retriever.retrieve(question).await?;
        let context = format_context(&sources);
        let prompt = self.prompt.render(&context, question);
        log::debug!(
            "Answering with {} chunks of context ({} prompt chars)",
            sources.len(),
            prompt.chars().count()
        );
        let raw = self.model.generate(&prompt, &self.sampling).await?;
        Ok(Answer {
            text: parse_output(&raw),
            sources,
        })
    }

    /// Answers questions until an exit word or end of input. Returns how many
    /// answers were produced. Failed questions are reported and skipped.
    pub async fn interactive_loop(&self, input: &mut dyn LineReader) -> Result<usize> {
        println!("\n{}", "RAG interactive mode".bright_cyan().bold());
        println!("Type 'exit' to finish\n");

        let mut answered = 0;
        while let Some(line) = input.read_line("❓ Question: ")? {
            let question = line.trim();
            if is_exit_word(question) {
                break;
            }
            if question.is_empty() {
                continue;
            }

            match self.answer(question).await {
                Ok(answer) => {
                    answered += 1;
                    println!("\n💬 {}", answer.text.truecolor(255, 236, 179));
                    println!("📚 Sources: {} chunks\n", answer.sources.len().to_string().cyan());
                }
                Err(e) => {
                    log::error!("Failed to answer '{}': {}", question, e);
                    println!("{}", format!("Failed to answer: {}", e).red());
                }
            }
        }
        Ok(answered)
    }
}
