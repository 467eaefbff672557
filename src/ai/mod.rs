pub mod analyzer;
pub mod client;
pub mod prompt;
pub mod response;

pub use analyzer::{AnalysisError, Analyzer};
pub use client::{ChatClient, CompletionProvider};
pub use prompt::{PromptBuilder, TaskKind};
pub use response::{
    classify_line, parse_response, AnalysisResult, FallbackPolicy, LineKind, ResponseParser,
    Section,
};
