use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use crate::ai::client::CompletionProvider;
use crate::ai::prompt::{PromptBuilder, TaskKind};
use crate::ai::response::{AnalysisResult, ResponseParser};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Input text is empty")]
    EmptyInput,
    #[error("Model returned no content")]
    EmptyCompletion,
    #[error("Model request failed: {0}")]
    Provider(String),
}

impl AnalysisError {
    /// True when the caller, not the model or network, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput)
    }
}

/// Runs one request end to end: prompt, model call, structuring.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn CompletionProvider>,
    prompts: Arc<PromptBuilder>,
    parser: ResponseParser,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, parser: ResponseParser) -> Self {
        Self {
            provider,
            prompts: Arc::new(PromptBuilder::new()),
            parser,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn analyze(
        &self,
        input_text: &str,
        kind: TaskKind,
    ) -> Result<AnalysisResult, AnalysisError> {
        let input_text = input_text.trim();
        if input_text.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let prompt = self.prompts.build_prompt(input_text, kind);
        debug!("Built {kind} prompt, length: {}", prompt.len());

        let raw = self.provider.complete(&prompt).await?;
        if raw.trim().is_empty() {
            return Err(AnalysisError::EmptyCompletion);
        }

        let result = self.parser.parse(&raw);
        info!(
            "Structured {} response into {} sections",
            kind,
            result.sections.len()
        );
        Ok(result)
    }
}
