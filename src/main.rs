use anyhow::Result;
use clap::Parser;
use log::error;

use outliner::cli::{version_string, AnalyzeOptions};
use outliner::{Cli, CommandHandler, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Warnings and errors by default; RUST_LOG still takes precedence.
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Handle version early
    if matches!(cli.command, Some(Commands::Version)) {
        println!("{}", version_string());
        return Ok(());
    }

    let mut handler = match CommandHandler::new(!cli.no_color) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to initialize outliner: {e:#}");
            eprintln!("Error: Failed to initialize outliner: {e:#}");
            eprintln!("Check ~/.outliner/config.toml or run 'outliner init'.");
            std::process::exit(1);
        }
    };

    let options = AnalyzeOptions::from(&cli);

    match cli.command {
        Some(command) => match handler.handle_command(command).await {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!("Command failed: {e:#}");
                eprintln!("{}", handler.format_error(&format!("{e:#}")));
                std::process::exit(1);
            }
        },
        None => {
            let Some(input) = cli.input.as_deref().filter(|i| !i.trim().is_empty()) else {
                eprintln!(
                    "{}",
                    handler.format_error("Please enter an idea or argument to analyze.")
                );
                eprintln!("Usage: outliner [--kind function-expand|analysis] <INPUT>");
                std::process::exit(2);
            };

            match handler.handle_analyze(input, &options).await {
                Ok(outcome) => match handler.format_outcome(&outcome, options.json) {
                    Ok(output) => println!("{output}"),
                    Err(e) => {
                        error!("Failed to format result: {e:#}");
                        eprintln!("{}", handler.format_error(&format!("{e:#}")));
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Analysis failed: {e:#}");
                    eprintln!("{}", handler.format_error(&format!("{e:#}")));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
