use colored::Colorize;
use std::sync::Arc;

use crate::config::Settings;
use crate::database::VectorStoreManager;
use crate::document::DocumentProcessor;
use crate::llm::LineReader;
use crate::providers::traits::{EmbeddingProvider, LanguageModel, SamplingConfig};

mod document;
mod query;
mod system;

/// What the menu loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Continue,
    Exit,
}

pub struct CommandHandler {
    processor: DocumentProcessor,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    store: VectorStoreManager,
    sampling: SamplingConfig,
    top_k: usize,
}

impl CommandHandler {
    pub fn new(
        settings: &Settings,
        processor: DocumentProcessor,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
        store: VectorStoreManager,
    ) -> Self {
        Self {
            processor,
            embedder,
            model,
            store,
            sampling: settings.sampling(),
            top_k: settings.top_k,
        }
    }

    pub fn store(&self) -> &VectorStoreManager {
        &self.store
    }

    pub fn print_menu(&self) {
        system::print_menu(self.store.index_name(), self.store.backend_kind());
    }

    /// Runs one menu choice. Follow-up prompts (path, URL, questions) are read
    /// from `input`.
    pub async fn handle_command(&mut self, choice: &str, input: &mut dyn LineReader) -> Result<MenuAction, String> {
        match choice.trim() {
            "" => Ok(MenuAction::Continue),
            "1" => {
                let Some(path) = prompt_value(input, "📄 File path: ")? else {
                    return Ok(MenuAction::Continue);
                };
                document::ingest_file(&path, &self.processor, &self.store, self.embedder.as_ref()).await?;
                Ok(MenuAction::Continue)
            }
            "2" => {
                let Some(url) = prompt_value(input, "🌐 URL: ")? else {
                    return Ok(MenuAction::Continue);
                };
                document::ingest_url(&url, &self.processor, &self.store, self.embedder.as_ref()).await?;
                Ok(MenuAction::Continue)
            }
            "3" => {
                let answered = query::run(
                    &mut self.store,
                    self.embedder.clone(),
                    self.model.clone(),
                    &self.sampling,
                    self.top_k,
                    input,
                )
                .await?;
                log::info!("Question session ended after {} answers", answered);
                Ok(MenuAction::Continue)
            }
            "4" => {
                system::print_goodbye();
                Ok(MenuAction::Exit)
            }
            "help" | "?" => {
                self.print_menu();
                Ok(MenuAction::Continue)
            }
            other => Err(format!("Unknown option '{}'. Choose 1, 2, 3 or 4.", other)),
        }
    }

    /// Menu loop until option 4 or end of input. Command errors are printed and
    /// the menu comes back.
    pub async fn run(&mut self, input: &mut dyn LineReader) -> crate::error::Result<()> {
        self.print_menu();
        while let Some(line) = input.read_line("👤 Option: ")? {
            match self.handle_command(&line, input).await {
                Ok(MenuAction::Exit) => return Ok(()),
                Ok(MenuAction::Continue) => {}
                Err(e) => println!("{}", e.red()),
            }
            self.print_menu();
        }
        Ok(())
    }
}

fn prompt_value(input: &mut dyn LineReader, prompt: &str) -> Result<Option<String>, String> {
    let value = input.read_line(prompt).map_err(|e| e.to_string())?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{IndexState, LocalBackend, Metric};
    use crate::test_util::{HashEmbedder, RecordingModel, ScriptedInput};

    fn settings(dir: &std::path::Path) -> Settings {
        let dir = dir.to_string_lossy().to_string();
        Settings::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "VECTOR_STORE" => Some("local".to_string()),
            "LOCAL_STORE_DIR" => Some(dir.clone()),
            "CHUNK_SIZE" => Some("200".to_string()),
            "CHUNK_OVERLAP" => Some("20".to_string()),
            "RETRIEVER_K" => Some("2".to_string()),
            _ => None,
        })
        .unwrap()
    }

    async fn handler(dir: &std::path::Path, model: Arc<RecordingModel>) -> CommandHandler {
        let settings = settings(dir);
        let embedder = Arc::new(HashEmbedder::new(64));
        let mut store = VectorStoreManager::new(
            Box::new(LocalBackend::new(settings.local_store_dir.clone())),
            settings.index_name.clone(),
        );
        store.create_index(64, Metric::Cosine).await.unwrap();
        let processor = DocumentProcessor::new(settings.chunk_size, settings.chunk_overlap).unwrap();
        CommandHandler::new(&settings, processor, embedder, model, store)
    }

    #[tokio::test]
    async fn ingest_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "Basalt columns form when lava cools slowly.\n\nGranite is intrusive.").unwrap();
        let model = Arc::new(RecordingModel::replying("Slow cooling."));
        let mut handler = handler(dir.path(), model.clone()).await;

        let mut input = ScriptedInput::new([
            "1",
            file.to_str().unwrap(),
            "3",
            "how do basalt columns form",
            "exit",
            "4",
            "never read",
        ]);
        handler.run(&mut input).await.unwrap();

        assert_eq!(input.remaining(), 1);
        assert_eq!(handler.store().state(), IndexState::Connected);
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Basalt columns"));
        assert!(prompts[0].contains("how do basalt columns form"));
    }

    #[tokio::test]
    async fn errors_return_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(RecordingModel::replying("unused"));
        let mut handler = handler(dir.path(), model).await;
        let missing = dir.path().join("missing.txt");

        let err = handler
            .handle_command("1", &mut ScriptedInput::new([missing.to_str().unwrap()]))
            .await
            .unwrap_err();
        assert!(err.contains("missing.txt"));

        let err = handler
            .handle_command("2", &mut ScriptedInput::new(["not a url"]))
            .await
            .unwrap_err();
        assert!(err.contains("not a url"));

        assert!(handler.handle_command("9", &mut ScriptedInput::new(Vec::<String>::new())).await.is_err());

        let mut input = ScriptedInput::new(["7", "4"]);
        handler.run(&mut input).await.unwrap();
        assert_eq!(input.remaining(), 0);
    }

    #[tokio::test]
    async fn empty_prompt_cancels_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(RecordingModel::replying("unused"));
        let mut handler = handler(dir.path(), model).await;

        let action = handler
            .handle_command("1", &mut ScriptedInput::new(["   "]))
            .await
            .unwrap();
        assert_eq!(action, MenuAction::Continue);
        assert_eq!(handler.handle_command("4", &mut ScriptedInput::new(Vec::<String>::new())).await, Ok(MenuAction::Exit));
    }

    #[tokio::test]
    async fn end_of_input_leaves_menu() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(RecordingModel::replying("unused"));
        let mut handler = handler(dir.path(), model).await;
        handler.run(&mut ScriptedInput::new(Vec::<String>::new())).await.unwrap();
    }
}
