use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::error::{RagError, Result};

/// Line-oriented input. `Ok(None)` means the input is finished.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineReader for Editor<(), DefaultHistory> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(RagError::io(
                "<stdin>",
                std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
            )),
        }
    }
}
