pub mod ai;
pub mod cli;
pub mod config;
pub mod history;
pub mod server;

pub use ai::{
    parse_response, AnalysisResult, Analyzer, PromptBuilder, ResponseParser, Section, TaskKind,
};
pub use cli::{Cli, CommandHandler, Commands};
pub use config::Settings;
pub use history::{HistoryRecord, HistoryStore};
