//! Jimaku - Batch Subtitle Generation
//!
//! Entry point: parses arguments, sets up logging and configuration, builds
//! the transcriber once and hands it to the workflow.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jimaku::cli::{Args, Commands, EngineArgs};
use jimaku::config::{Config, TranscriptionEngine};
use jimaku::error::JimakuError;
use jimaku::setup::{ModelManager, ModelInfo, MODELS};
use jimaku::transcribe::TranscriberFactory;
use jimaku::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "jimaku.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;

    let command = args.command.unwrap_or(Commands::Batch {
        input_dir: PathBuf::from("."),
        output_dir: None,
        extensions: Vec::new(),
        keep_going: false,
        force: false,
        engine: EngineArgs::default(),
    });

    match command {
        Commands::Batch { input_dir, output_dir, extensions, keep_going, force, engine } => {
            apply_engine_args(&mut config, &engine)?;
            if !extensions.is_empty() {
                config.batch.extensions = extensions;
            }
            if keep_going {
                config.batch.fail_fast = false;
            }

            let transcriber = TranscriberFactory::create(&config)?;
            transcriber.check_availability().await?;

            let workflow = Workflow::new(config, transcriber);
            let report = workflow
                .process_directory(&input_dir, output_dir.as_deref(), force)
                .await?;
            report.ensure_success()?;
        }
        Commands::Transcribe { input, output, engine } => {
            apply_engine_args(&mut config, &engine)?;

            let transcriber = TranscriberFactory::create(&config)?;
            transcriber.check_availability().await?;

            let workflow = Workflow::new(config, transcriber);
            let written = workflow.transcribe_file(&input, output.as_deref()).await?;
            info!("Subtitles written to {}", written.display());
        }
        Commands::Models { download } => {
            let manager = ModelManager::new(config.transcriber.models_dir.clone())?;

            println!("\nAvailable whisper.cpp models ({}):", manager.models_dir().display());
            println!("{:<16} {:<24} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(62));
            for model in MODELS {
                let status = if manager.is_downloaded(model) { "Downloaded" } else { "Missing" };
                println!(
                    "{:<16} {:<24} {:<10.0} {:<10}",
                    model.name,
                    model.filename(),
                    model.size_mb,
                    status
                );
            }

            for name in &download {
                let model = ModelInfo::lookup(name).ok_or_else(|| {
                    JimakuError::Config(format!("Unknown whisper.cpp model '{}'", name))
                })?;
                manager.download(model).await?;
            }
        }
        Commands::Config { output } => {
            config.save_to_new_file(&output)?;
            info!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Explicit path first, then `jimaku.toml` in the working directory, then defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
            Config::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => Config::default(),
    };

    Ok(config)
}

fn apply_engine_args(config: &mut Config, args: &EngineArgs) -> Result<()> {
    if let Some(engine) = &args.engine {
        let engine: TranscriptionEngine = engine.parse()?;
        config.transcriber.engine = engine;
    }
    if let Some(model) = &args.model {
        config.transcriber.model = model.clone();
    }
    if let Some(language) = &args.language {
        config.transcriber.language = Some(language.clone());
    }
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".jimaku").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "jimaku.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("jimaku.log").display());

    Ok(guard)
}
