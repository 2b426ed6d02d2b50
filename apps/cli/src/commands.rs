//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use assigngen_core::{Orchestrator, PipelineConfig, RunSummary};
use assigngen_shared::{AppConfig, OutputFormat, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// assigngen: turn a topic into a researched, translated assignment.
#[derive(Parser)]
#[command(
    name = "assigngen",
    version,
    about = "Search the web for a topic and write a five-section assignment plus its translation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Research a topic and write the assignment documents.
    Generate {
        /// Topic to research.
        topic: String,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum number of URLs to scrape.
        #[arg(short = 'n', long)]
        results: Option<usize>,

        /// Document format: markdown or html.
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Language code to translate into (e.g. ur, es, fr).
        #[arg(long)]
        target_lang: Option<String>,

        /// File name marker for the translated document (e.g. Urdu).
        #[arg(long)]
        target_marker: Option<String>,
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

/// CLI overrides applied on top of the loaded config.
#[derive(Debug, Default)]
pub(crate) struct GenerateOverrides {
    pub out: Option<PathBuf>,
    pub results: Option<usize>,
    pub format: Option<OutputFormat>,
    pub target_lang: Option<String>,
    pub target_marker: Option<String>,
}

impl GenerateOverrides {
    fn apply(self, mut config: PipelineConfig) -> Result<PipelineConfig> {
        if let Some(out) = self.out {
            config.output_dir = out;
        }
        if let Some(results) = self.results {
            if results == 0 {
                return Err(eyre!("--results must be at least 1"));
            }
            config.result_count = results;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(lang) = self.target_lang {
            config.target_language = lang;
        }
        if let Some(marker) = self.target_marker {
            config.target_marker = marker;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "assigngen=info",
        1 => "assigngen=debug",
        _ => "assigngen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Generate {
            topic,
            out,
            results,
            format,
            target_lang,
            target_marker,
        } => {
            let overrides = GenerateOverrides {
                out,
                results,
                format,
                target_lang,
                target_marker,
            };
            cmd_generate(&topic, overrides).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(topic: &str, overrides: GenerateOverrides) -> Result<()> {
    let config = load_config()?;
    let pipeline_config = overrides.apply(PipelineConfig::from(&config))?;

    info!(
        topic,
        output_dir = %pipeline_config.output_dir.display(),
        format = %pipeline_config.format,
        "generating assignment"
    );

    let orchestrator = Orchestrator::from_config(&config, pipeline_config)?;
    let mut status = orchestrator.subscribe();
    let mut handle = orchestrator.start(topic)?;

    let spinner = status_spinner();
    spinner.set_message(orchestrator.state().to_string());

    let joined = loop {
        tokio::select! {
            joined = &mut handle => break joined,
            Ok(()) = status.changed() => {
                spinner.set_message(status.borrow_and_update().to_string());
            }
        }
    };
    spinner.finish_and_clear();

    let summary = joined.map_err(|e| eyre!("pipeline worker stopped: {e}"))??;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Assignment generated!");
    println!("  Topic:       {}", summary.topic);
    println!("  Run:         {}", summary.run_id);
    println!(
        "  URLs:        {} ({} with content, {} failed)",
        summary.urls.len(),
        summary.pages_with_content,
        summary.scrape_failures
    );
    println!("  Source:      {}", summary.source_document.path.display());
    println!("  Translated:  {}", summary.translated_document.path.display());
    if summary.translation_fallbacks > 0 {
        println!(
            "               ({} block(s) left untranslated)",
            summary.translation_fallbacks
        );
    }
    println!("  URL index:   {}", summary.url_index.path.display());
    println!("  Time:        {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

/// Spinner whose message follows the pipeline state.
fn status_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
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
