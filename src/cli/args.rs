use clap::{Parser, Subcommand};

use crate::ai::TaskKind;
use crate::history::Period;

#[derive(Parser)]
#[command(name = "outliner")]
#[command(about = "Turn free-text ideas into structured suggestions using a chat model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    /// The idea, requirement or argument to analyze
    pub input: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// What kind of answer to ask for
    #[arg(short, long, value_enum, default_value_t = TaskKind::FunctionExpand)]
    pub kind: TaskKind,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not store the result in history
    #[arg(long)]
    pub no_save: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create ~/.outliner with a default config and history database
    Init,
    /// Show configuration
    Config,
    /// Run diagnostics
    Doctor,
    /// Show version information
    Version,
    /// Browse and manage past analyses
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Serve the analysis API over HTTP
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List records, newest first
    List {
        /// Only records of this kind
        #[arg(long, value_enum)]
        kind: Option<TaskKind>,
        /// Only records from the last week or month
        #[arg(long, value_enum)]
        since: Option<Period>,
        /// Case-insensitive search over input and preview
        #[arg(short, long)]
        search: Option<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one record in full
    Show {
        id: i64,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one record
    Delete { id: i64 },
    /// Copy a record's result to the clipboard
    Copy { id: i64 },
    /// Delete every record
    Clear,
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub kind: TaskKind,
    pub save: bool,
    pub json: bool,
    pub verbose: bool,
}

impl From<&Cli> for AnalyzeOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            kind: cli.kind,
            save: !cli.no_save,
            json: cli.json,
            verbose: cli.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_kind_and_flags() {
        let cli = Cli::parse_from(["outliner", "--kind", "analysis", "--no-save", "start early"]);
        let options = AnalyzeOptions::from(&cli);
        assert_eq!(cli.input.as_deref(), Some("start early"));
        assert_eq!(options.kind, TaskKind::Analysis);
        assert!(!options.save);
    }

    #[test]
    fn defaults_to_function_expand() {
        let cli = Cli::parse_from(["outliner", "a homepage"]);
        assert_eq!(cli.kind, TaskKind::FunctionExpand);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["outliner", "--kind", "summary", "x"]).is_err());
    }

    #[test]
    fn parses_history_list_filters() {
        let cli = Cli::parse_from([
            "outliner", "history", "list", "--kind", "function-expand", "--since", "week", "-s",
            "home",
        ]);
        match cli.command {
            Some(Commands::History {
                action:
                    HistoryCommand::List {
                        kind, since, search, ..
                    },
            }) => {
                assert_eq!(kind, Some(TaskKind::FunctionExpand));
                assert_eq!(since, Some(Period::Week));
                assert_eq!(search.as_deref(), Some("home"));
            }
            _ => panic!("expected history list"),
        }
    }
}
