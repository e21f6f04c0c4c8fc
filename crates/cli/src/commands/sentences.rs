//! Sentences command handler.
//!
//! Prints the segmentation the citation matcher sees, one sentence per line.

use clap::Args;
use grounded_core::{AppError, AppResult};
use grounded_engine::split_sentences;
use std::path::PathBuf;

/// Show how a text is split into sentences
#[derive(Args, Debug)]
pub struct SentencesCommand {
    /// Text to segment (alternative to --file)
    pub text: Option<String>,

    /// Read text from file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

impl SentencesCommand {
    /// Execute the sentences command.
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing sentences command");

        let text = self.get_text()?;
        let mut count = 0;
        for sentence in split_sentences(&text) {
            println!("{}", sentence);
            count += 1;
        }

        tracing::debug!("Printed {} sentences", count);
        Ok(())
    }

    fn get_text(&self) -> AppResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        let path = self
            .file
            .as_ref()
            .ok_or_else(|| AppError::Config("No text provided".to_string()))?;
        std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read text file {:?}: {}", path, e)))
    }
}
