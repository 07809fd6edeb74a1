//! CLI command definitions, routing, and tracing setup.

use std::io::Write;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use webqa_core::{Analysis, Pipeline, ProgressReporter, StreamEvent, present};
use webqa_shared::{AppConfig, PipelineRequest, init_config, load_config, validate_api_key};

use crate::server;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// webqa: ask a question about a web page.
#[derive(Parser)]
#[command(
    name = "webqa",
    version,
    about = "Answer questions about a web page, falling back to web search when the page is off-topic.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a question about a page.
    Ask {
        /// Page URL (http or https).
        url: String,

        /// The question to answer.
        question: String,

        /// Print raw server-sent-event frames instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP service.
    Serve {
        /// Bind address (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "webqa=info",
        1 => "webqa=debug",
        _ => "webqa=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `ask` output stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ask {
            url,
            question,
            json,
        } => cmd_ask(&url, question, json).await,
        Command::Serve { host, port } => cmd_serve(host, port).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(url: &str, question: String, json: bool) -> Result<()> {
    let request = PipelineRequest::new(url, question)?;

    let config = load_config()?;
    validate_api_key(&config)?;
    let pipeline = Pipeline::from_config(&config)?;

    info!(url, "answering question");

    let reporter = CliProgress::new();
    let analysis = pipeline.analyze(&request, &reporter).await?;

    let mut out = std::io::stdout().lock();
    for event in present(analysis.state.final_answer, analysis.metrics) {
        if json {
            write!(out, "{}", event.to_sse_frame()?)?;
            continue;
        }
        match event {
            StreamEvent::Answer(word) => {
                write!(out, "{word}")?;
                out.flush()?;
            }
            StreamEvent::Metrics(metrics) => {
                writeln!(out)?;
                writeln!(out)?;
                writeln!(
                    out,
                    "  Relevance: {:.2}  Source: {}",
                    metrics.relevance_score, metrics.source
                )?;
            }
        }
    }

    Ok(())
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config()?;
    validate_api_key(&config)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let pipeline = Pipeline::from_config(&config)?;
    server::serve(pipeline, &config.server).await
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _analysis: &Analysis) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask() {
        let cli = Cli::try_parse_from([
            "webqa",
            "-v",
            "ask",
            "https://tokio.rs",
            "What is Tokio?",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Ask {
                url,
                question,
                json,
            } => {
                assert_eq!(url, "https://tokio.rs");
                assert_eq!(question, "What is Tokio?");
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["webqa", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::try_parse_from(["webqa", "config", "show", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn ask_requires_question() {
        assert!(Cli::try_parse_from(["webqa", "ask", "https://tokio.rs"]).is_err());
    }
}
