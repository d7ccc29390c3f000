use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `batch` over the current directory
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Engine overrides shared by every command that transcribes
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Transcription engine (openai, whisper-cpp)
    #[arg(long)]
    pub engine: Option<String>,

    /// Model name, or a ggml model path for whisper-cpp
    #[arg(short, long)]
    pub model: Option<String>,

    /// Source language hint
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate subtitles for every video in a directory
    Batch {
        /// Directory containing video files
        #[arg(default_value = ".")]
        input_dir: PathBuf,

        /// Where subtitle files are written (defaults to the input directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Video extensions to pick up, repeatable (overrides the config)
        #[arg(short, long = "ext")]
        extensions: Vec<String>,

        /// Log failing files and continue with the rest
        #[arg(long)]
        keep_going: bool,

        /// Regenerate subtitles that already exist
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Generate subtitles for a single video file
    Transcribe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file (defaults to the input name with .srt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List whisper.cpp models and their download status
    Models {
        /// Download the named models
        #[arg(short, long)]
        download: Vec<String>,
    },

    /// Write the default configuration as TOML
    Config {
        /// Destination file
        #[arg(short, long, default_value = "jimaku.toml")]
        output: PathBuf,
    },
}
