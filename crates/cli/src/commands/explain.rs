//! Explain command handler.
//!
//! Reads an explain request as JSON, runs the grounding pipeline and prints
//! the response as JSON on stdout.

use clap::Args;
use grounded_core::{config::AppConfig, AppError, AppResult};
use grounded_engine::{explain_with_options, ExplainOptions, ExplainRequest};
use std::io::Read;
use std::path::PathBuf;

/// Ground an answer in the evidence it was generated from
#[derive(Args, Debug)]
pub struct ExplainCommand {
    /// Request JSON file (reads stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Extract entities from the chunks when the request carries none
    #[arg(long)]
    pub extract_entities: bool,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl ExplainCommand {
    /// Execute the explain command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing explain command");
        tracing::debug!("Explain options: {:?}", self);

        let raw = self.read_input()?;
        let output = self.render(&raw, config)?;
        println!("{}", output);

        Ok(())
    }

    /// Run the pipeline over a raw request and render the response.
    fn render(&self, raw: &str, config: &AppConfig) -> AppResult<String> {
        let request: ExplainRequest = serde_json::from_str(raw)
            .map_err(|e| AppError::Serialization(format!("Invalid explain request: {}", e)))?;

        let mut options = ExplainOptions::from(&config.explain);
        if self.extract_entities {
            options.extract_entities = true;
        }

        let response = explain_with_options(&request, &options)?;

        let json = if self.compact || !config.explain.pretty {
            serde_json::to_string(&response)?
        } else {
            serde_json::to_string_pretty(&response)?
        };
        Ok(json)
    }

    fn read_input(&self) -> AppResult<String> {
        match &self.input {
            Some(path) => {
                tracing::debug!("Reading request from {:?}", path);
                std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Failed to read request file {:?}: {}", path, e))
                })
            }
            None => {
                tracing::debug!("Reading request from stdin");
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REQUEST: &str = r#"{
        "query": "What is the capital of France?",
        "chunks": [
            {"index": 0, "text": "Paris is the capital of France.", "relevanceScore": 0.9, "source": "geo.md"},
            {"index": 1, "text": "France has 67 million people.", "relevanceScore": 0.7}
        ],
        "answer": "Paris is the capital of France."
    }"#;

    fn command(extract_entities: bool, compact: bool) -> ExplainCommand {
        ExplainCommand {
            input: None,
            extract_entities,
            compact,
        }
    }

    #[test]
    fn test_render_pretty_by_default() {
        let output = command(false, false)
            .render(REQUEST, &AppConfig::default())
            .unwrap();

        assert!(output.contains('\n'));
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["citations"][0]["chunkIndex"], 0);
        assert_eq!(json["chunkReferences"][0]["filename"], "geo.md");
    }

    #[test]
    fn test_render_compact() {
        let output = command(false, true)
            .render(REQUEST, &AppConfig::default())
            .unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_extract_entities_flag_overrides_config() {
        let output = command(true, true)
            .render(REQUEST, &AppConfig::default())
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["graph"]["nodes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_request_is_serialization_error() {
        let result = command(false, false).render("{\"query\": 1}", &AppConfig::default());
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_chunk_cap_comes_from_config() {
        let mut config = AppConfig::default();
        config.explain.max_chunks = 1;

        let result = command(false, false).render(REQUEST, &config);
        assert!(matches!(result, Err(AppError::Precondition(_))));
    }

    #[test]
    fn test_read_input_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("request.json");
        std::fs::write(&path, REQUEST).unwrap();

        let cmd = ExplainCommand {
            input: Some(path),
            extract_entities: false,
            compact: false,
        };
        assert_eq!(cmd.read_input().unwrap(), REQUEST);
    }

    #[test]
    fn test_missing_input_file() {
        let cmd = ExplainCommand {
            input: Some(PathBuf::from("/nonexistent/request.json")),
            extract_entities: false,
            compact: false,
        };
        assert!(matches!(cmd.read_input(), Err(AppError::Config(_))));
    }
}
