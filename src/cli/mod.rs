pub mod args;
pub mod commands;
pub mod output;

pub use args::{AnalyzeOptions, Cli, Commands, HistoryCommand};
pub use commands::{version_string, CommandHandler, Outcome};
pub use output::{OutputFormatter, Spinner};
