//! Reasoning Lab CLI
//!
//! Usage: reasoning-lab [OPTIONS] [COMMAND]
//!
//! Without a command it starts the interactive TUI. The one-shot commands run
//! a single workflow and support JSON output for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use reasoning_lab_lib::logging::{self, LogTarget};
use reasoning_lab_lib::papers::arxiv::ArxivClient;
use reasoning_lab_lib::papers::DEFAULT_MAX_RESULTS;
use reasoning_lab_lib::session::render_search_results;
use reasoning_lab_lib::settings::{ModelRegistry, Settings, API_KEY_ENV};
use reasoning_lab_lib::{LabError, LabResult, LabServices, LabSession, MenuChoice};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[path = "cli/tui.rs"]
mod tui;

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "reasoning-lab")]
#[command(version, about = "Reasoning-lab: Explore, experiment and find scientific solutions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: <config dir>/reasoning-lab/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Detailed logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Search scientific articles on arXiv
    Search {
        /// Free-text query, passed to arXiv as-is
        query: String,
        /// Maximum number of articles
        #[arg(long, short = 'n', default_value_t = DEFAULT_MAX_RESULTS)]
        limit: usize,
    },
    /// Summarize the key findings of a PDF (local path or http(s) URL)
    Analyze {
        source: String,
    },
    /// Create a hypothetical experiment for a topic
    Experiment {
        topic: String,
    },
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective settings (API key masked)
    Show,
    /// Print the settings file location
    Path,
    /// Store the API key in the settings file
    SetKey {
        key: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    // Ignore SIGPIPE so `reasoning-lab search ... --json | head` exits quietly.
    #[cfg(unix)]
    unsafe { libc::signal(libc::SIGPIPE, libc::SIG_IGN); }

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let tui_mode = matches!(cli.command, None | Some(Commands::Tui));
    install_panic_hook(tui_mode);

    let target = if tui_mode { LogTarget::File } else { LogTarget::Stderr };
    if let Some(log_path) = logging::init_logging(cli.verbose, target) {
        eprintln!("Logging to: {}", log_path.display());
    }

    if let Err(e) = run_cli(cli).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// What the panic hook does with a panic message
#[derive(Debug, PartialEq, Eq)]
enum PanicRoute {
    /// println! on a closed pipe: exit quietly
    Exit,
    /// TUI owns the screen: write to the log file only
    Log,
    /// Default hook prints to stderr
    Print,
}

fn panic_route(message: &str, tui_mode: bool) -> PanicRoute {
    if message.contains("Broken pipe") {
        PanicRoute::Exit
    } else if tui_mode {
        PanicRoute::Log
    } else {
        PanicRoute::Print
    }
}

// Panics caught by the PDF decoder still reach the hook, so in TUI mode they
// must not be printed over the alternate screen.
fn install_panic_hook(tui_mode: bool) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        match panic_route(&info.to_string(), tui_mode) {
            PanicRoute::Exit => std::process::exit(0),
            PanicRoute::Log => tracing::error!(panic = %info, "Panic"),
            PanicRoute::Print => default_hook(info),
        }
    }));
}

async fn run_cli(cli: Cli) -> LabResult<()> {
    let Cli { settings: settings_arg, json, command, .. } = cli;

    let settings_path = settings_arg.unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path);
    tracing::debug!(path = %settings_path.display(), "Loaded settings");

    match command.unwrap_or(Commands::Tui) {
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "reasoning-lab", &mut std::io::stdout());
            Ok(())
        }
        Commands::Config { cmd } => handle_config(cmd, settings, &settings_path, json),
        Commands::Tui => tui::run_tui(new_session(&settings)?).await,
        Commands::Search { query, limit } => handle_search(&query, limit, &settings, json).await,
        Commands::Analyze { source } => handle_analyze(&source, &settings, json).await,
        Commands::Experiment { topic } => handle_experiment(&topic, &settings, json).await,
    }
}

fn new_session(settings: &Settings) -> LabResult<LabSession> {
    let services = LabServices::from_settings(settings)?;
    Ok(LabSession::new(services).with_summary_preview(settings.summary_preview_chars))
}

fn print_json(value: serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
}

// ============================================================================
// Workflow Commands
// ============================================================================

async fn handle_search(query: &str, limit: usize, settings: &Settings, json: bool) -> LabResult<()> {
    let mut session = new_session(settings)?.with_search_limit(limit);
    session.select(MenuChoice::SearchArticles);
    let results = session.search(query).await?;

    if json {
        print_json(json!(results));
    } else if results.is_empty() {
        eprintln!("No articles found for '{}'", query);
    } else {
        print!("{}", render_search_results(results, settings.summary_preview_chars));
    }
    Ok(())
}

async fn handle_analyze(source: &str, settings: &Settings, json: bool) -> LabResult<()> {
    let document = if source.starts_with("http://") || source.starts_with("https://") {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        ArxivClient::new(&settings.arxiv_base_url, timeout)?.fetch_pdf(source).await?
    } else {
        std::fs::read(source)?
    };

    let mut session = new_session(settings)?;
    session.select(MenuChoice::PdfAnalysis);
    let analysis = session.analyze_upload(&document).await?;

    if json {
        print_json(json!({ "source": source, "analysis": analysis }));
    } else {
        println!("PDF Analysis:\n{}", analysis);
    }
    Ok(())
}

async fn handle_experiment(topic: &str, settings: &Settings, json: bool) -> LabResult<()> {
    let mut session = new_session(settings)?;
    session.select(MenuChoice::HypotheticalExperiments);
    let experiment = session.generate_experiment(topic).await?;

    if json {
        print_json(json!({ "topic": topic, "experiment": experiment }));
    } else {
        println!("Hypothetical Experiment:\n{}", experiment);
    }
    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

fn handle_config(cmd: ConfigCommands, mut settings: Settings, path: &Path, json: bool) -> LabResult<()> {
    match cmd {
        ConfigCommands::Show => {
            let key = settings.masked_api_key();
            // Key is not needed to list the models
            let models = ModelRegistry::with_key(&settings, String::new()).model_listing();
            if json {
                let models: serde_json::Map<String, serde_json::Value> = models
                    .iter()
                    .map(|(role, name)| (role.to_string(), json!(name)))
                    .collect();
                print_json(json!({
                    "settings_path": path.display().to_string(),
                    "api_key": key,
                    "api_base_url": settings.api_base_url,
                    "models": models,
                    "arxiv_base_url": settings.arxiv_base_url,
                    "request_timeout_secs": settings.request_timeout_secs,
                    "summary_preview_chars": settings.summary_preview_chars,
                }));
            } else {
                println!("Settings file:    {}", path.display());
                println!("API key:          {}", key.unwrap_or_else(|| format!("(not set, export {})", API_KEY_ENV)));
                println!("API base URL:     {}", settings.api_base_url);
                for (role, name) in &models {
                    println!("{:<18}{}", format!("Model ({}):", role), name);
                }
                println!("arXiv endpoint:   {}", settings.arxiv_base_url);
                println!("Request timeout:  {}s", settings.request_timeout_secs);
            }
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::SetKey { key } => {
            if key.trim().is_empty() {
                return Err(LabError::Config("API key must not be empty".to_string()));
            }
            settings.api_key = Some(key.trim().to_string());
            settings.save(path)?;
            println!("API key saved to {}", path.display());
            Ok(())
        }
    }
}
