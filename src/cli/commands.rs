use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use chrono::Utc;
use log::{debug, info, warn};
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::ai::{AnalysisResult, Analyzer, ChatClient};
use crate::cli::{AnalyzeOptions, Commands, HistoryCommand, OutputFormatter, Spinner};
use crate::config::{DefaultConfig, Settings};
use crate::history::{HistoryFilter, HistoryRecord, HistoryStore};
use crate::server::{self, AnalysisData};

/// Result of one analysis run from the command line.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub input_text: String,
    pub data: AnalysisData,
    pub record: Option<HistoryRecord>,
}

pub struct CommandHandler {
    client: Arc<ChatClient>,
    analyzer: Analyzer,
    history: Option<HistoryStore>,
    settings: Settings,
    formatter: OutputFormatter,
}

impl CommandHandler {
    pub fn new(use_colors: bool) -> Result<Self> {
        let settings = Settings::load()?;
        Self::with_settings(settings, use_colors)
    }

    pub fn with_settings(settings: Settings, use_colors: bool) -> Result<Self> {
        let client = Arc::new(ChatClient::new(&settings)?);
        let analyzer = Analyzer::new(client.clone(), settings.response_parser());

        let history = if settings.history.enabled {
            Some(HistoryStore::open(settings.history_path()?)?)
        } else {
            None
        };

        let formatter = OutputFormatter::new(use_colors && settings.output.use_colors);

        Ok(Self {
            client,
            analyzer,
            history,
            settings,
            formatter,
        })
    }

    pub async fn handle_analyze(
        &mut self,
        input_text: &str,
        options: &AnalyzeOptions,
    ) -> Result<Outcome> {
        debug!("Analyzing input as {}", options.kind);

        let spinner = Spinner::new("Analyzing...");
        let analysis = self.analyzer.analyze(input_text, options.kind).await;
        spinner.stop();

        let result = analysis.context("Analysis failed, please try again")?;
        info!("Analysis produced {} sections", result.sections.len());

        let input_text = input_text.trim().to_string();
        let record = if options.save {
            self.save_result(&input_text, options, &result)
        } else {
            None
        };

        let data = AnalysisData {
            input_text: input_text.clone(),
            function_type: options.kind,
            created_at: record.as_ref().map_or_else(Utc::now, |r| r.created_at),
            result,
        };

        Ok(Outcome {
            input_text,
            data,
            record,
        })
    }

    fn save_result(
        &self,
        input_text: &str,
        options: &AnalyzeOptions,
        result: &AnalysisResult,
    ) -> Option<HistoryRecord> {
        let store = self.history.as_ref()?;
        match store.create(input_text, options.kind, result) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to save history record: {e}");
                None
            }
        }
    }

    pub fn format_outcome(&self, outcome: &Outcome, json: bool) -> Result<String> {
        if json {
            return match &outcome.record {
                Some(record) => Ok(serde_json::to_string_pretty(record)?),
                None => Ok(serde_json::to_string_pretty(&outcome.data)?),
            };
        }

        Ok(self.formatter.format_analysis(
            &outcome.input_text,
            outcome.data.function_type,
            &outcome.data.result,
            outcome.record.as_ref().map(|r| r.id),
        ))
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<String> {
        match command {
            Commands::Init => self.handle_init(),
            Commands::Config => self.handle_config(),
            Commands::Doctor => self.handle_doctor().await,
            Commands::Version => Ok(version_string()),
            Commands::History { action } => self.handle_history(action),
            Commands::Serve { bind } => self.handle_serve(bind).await,
        }
    }

    fn handle_init(&mut self) -> Result<String> {
        info!("Initializing outliner");

        let config_path = Settings::config_path()?;
        let mut messages = Vec::new();

        if config_path.exists() {
            messages.push(
                self.formatter
                    .format_info(&format!("Config already exists: {}", config_path.display())),
            );
        } else {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, DefaultConfig::create_default_config_file())
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            messages.push(
                self.formatter
                    .format_success(&format!("Created {}", config_path.display())),
            );
        }

        if self.history.is_none() {
            messages.push(self.formatter.format_info("History is disabled in config"));
        }

        if !self.client.has_api_key() {
            messages.push(self.formatter.format_warning(&format!(
                "Set {} before running an analysis",
                self.settings.model.api_key_env
            )));
        }

        messages.push(self.formatter.format_success("outliner initialized successfully"));
        Ok(messages.join("\n"))
    }

    fn handle_config(&self) -> Result<String> {
        let history_path = self
            .history
            .as_ref()
            .and_then(|h| h.path())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string());

        let mut config_info = format!(
            "outliner Configuration:\n\
            - Config file: {}\n\
            - Endpoint: {}\n\
            - Model: {}\n\
            - API key variable: {} ({})\n\
            - Temperature: {}\n\
            - Max tokens: {}\n\
            - Timeout: {}s\n\
            - Fallback policy: {:?}\n\
            - History database: {}\n\
            - Server address: {}\n\n",
            Settings::config_path()?.display(),
            self.client.base_url(),
            self.client.model_name(),
            self.settings.model.api_key_env,
            if self.client.has_api_key() { "set" } else { "missing" },
            self.settings.model.temperature,
            self.settings.model.max_tokens,
            self.settings.model.timeout_secs,
            self.settings.parser.fallback_policy,
            history_path,
            self.settings.server.bind_addr,
        );

        if let Some(history) = &self.history {
            if let Ok(stats) = history.stats() {
                config_info.push_str(&stats);
            }
        }

        Ok(config_info.trim_end().to_string())
    }

    async fn handle_doctor(&self) -> Result<String> {
        let spinner = Spinner::new("Running diagnostics...");
        let mut diagnostics = Vec::new();

        let config_path = Settings::config_path()?;
        if config_path.exists() {
            diagnostics.push(format!("✓ Config file found ({})", config_path.display()));
        } else {
            diagnostics
                .push("✗ Config file missing, using defaults (run: outliner init)".to_string());
        }

        if self.client.has_api_key() {
            diagnostics.push(format!("✓ {} is set", self.settings.model.api_key_env));
        } else {
            diagnostics.push(format!("✗ {} is not set", self.settings.model.api_key_env));
        }

        match self.client.verify_connection().await {
            Ok(_) => diagnostics.push(format!(
                "✓ Model endpoint reachable ({})",
                self.client.base_url()
            )),
            Err(e) => diagnostics.push(format!("✗ Model endpoint: {e}")),
        }

        match &self.history {
            Some(history) => match history.count() {
                Ok(count) => diagnostics.push(format!("✓ History database ok ({count} records)")),
                Err(e) => diagnostics.push(format!("✗ History database: {e}")),
            },
            None => diagnostics.push("- History disabled".to_string()),
        }

        spinner.stop();
        Ok(format!("outliner Health Check:\n{}", diagnostics.join("\n")))
    }

    fn history_store(&self) -> Result<&HistoryStore> {
        self.history.as_ref().ok_or_else(|| {
            anyhow!("History is disabled. Enable it in the [history] config section.")
        })
    }

    fn handle_history(&self, action: HistoryCommand) -> Result<String> {
        let store = self.history_store()?;

        match action {
            HistoryCommand::List {
                kind,
                since,
                search,
                json,
            } => {
                let filter = HistoryFilter {
                    kind,
                    period: since,
                    query: search,
                };
                let records = filter.apply(store.list_all()?, Utc::now());
                debug!("{} history records match", records.len());

                if json {
                    Ok(serde_json::to_string_pretty(&records)?)
                } else {
                    Ok(self.formatter.format_history_list(&records))
                }
            }
            HistoryCommand::Show { id, json } => {
                let record = store
                    .get(id)?
                    .ok_or_else(|| anyhow!("No history record #{id}"))?;

                if json {
                    Ok(serde_json::to_string_pretty(&record)?)
                } else {
                    Ok(self.formatter.format_record(&record))
                }
            }
            HistoryCommand::Delete { id } => {
                if store.delete(id)? {
                    Ok(self.formatter.format_success(&format!("Record #{id} deleted")))
                } else {
                    Err(anyhow!("No history record #{id}"))
                }
            }
            HistoryCommand::Copy { id } => {
                let record = store
                    .get(id)?
                    .ok_or_else(|| anyhow!("No history record #{id}"))?;
                let text = record.result.to_plain_text();

                match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.clone())) {
                    Ok(()) => Ok(self
                        .formatter
                        .format_success(&format!("Record #{id} copied to clipboard"))),
                    Err(e) => {
                        warn!("Clipboard unavailable: {e}");
                        Ok(text)
                    }
                }
            }
            HistoryCommand::Clear => {
                let deleted = store.clear()?;
                Ok(self
                    .formatter
                    .format_success(&format!("Deleted {deleted} history records")))
            }
        }
    }

    async fn handle_serve(&self, bind: Option<String>) -> Result<String> {
        let bind = bind.unwrap_or_else(|| self.settings.server.bind_addr.clone());
        let addr: SocketAddr = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;

        eprintln!(
            "{}",
            self.formatter
                .format_info(&format!("Serving POST /api/analysis on http://{addr}"))
        );

        let router = server::build_router(self.analyzer.clone());
        server::run_server(router, addr).await?;

        Ok(self.formatter.format_success("Server stopped"))
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}

pub fn version_string() -> String {
    format!(
        "outliner {}\nPlatform: {}-{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
