use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{JimakuError, Result};

// Default values for each configuration section
fn default_model() -> String {
    "small".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from(".jimaku").join("models")
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_output_extension() -> String {
    "srt".to_string()
}

fn default_fail_fast() -> bool {
    true
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Which speech recognition tool to run
    #[serde(default)]
    pub engine: TranscriptionEngine,
    /// Path to the transcriber binary; the engine's own tool when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<String>,
    /// Model name or, for whisper-cpp, a path to a ggml model file
    #[serde(default = "default_model")]
    pub model: String,
    /// Source language hint; detected by the model when absent
    #[serde(default)]
    pub language: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
    /// Where downloaded whisper-cpp models are stored
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranscriptionEngine {
    /// OpenAI Whisper command-line tool
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// whisper.cpp command-line tool
    #[serde(rename = "whisper-cpp")]
    WhisperCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Video file extensions picked up by the directory scan, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Extension of generated subtitle files
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Abort the whole batch on the first failing file
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub binary_path: String,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            engine: TranscriptionEngine::default(),
            binary_path: None,
            model: default_model(),
            language: None,
            temperature: 0.0,
            models_dir: default_models_dir(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            output_extension: default_output_extension(),
            fail_fast: default_fail_fast(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: default_ffmpeg_path(),
        }
    }
}

impl TranscriptionEngine {
    /// Binary name used when the configuration does not point elsewhere
    pub fn default_binary(&self) -> &'static str {
        match self {
            TranscriptionEngine::OpenAi => "whisper",
            TranscriptionEngine::WhisperCpp => "whisper-cli",
        }
    }
}

impl fmt::Display for TranscriptionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionEngine::OpenAi => write!(f, "openai"),
            TranscriptionEngine::WhisperCpp => write!(f, "whisper-cpp"),
        }
    }
}

impl FromStr for TranscriptionEngine {
    type Err = JimakuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "whisper" => Ok(TranscriptionEngine::OpenAi),
            "whisper-cpp" | "whisper.cpp" | "cpp" => Ok(TranscriptionEngine::WhisperCpp),
            _ => Err(JimakuError::Config(format!(
                "Invalid transcription engine '{}'. Valid engines: openai, whisper-cpp",
                s
            ))),
        }
    }
}

impl TranscriberConfig {
    /// Binary to launch for the configured engine
    pub fn binary(&self) -> &str {
        self.binary_path
            .as_deref()
            .unwrap_or_else(|| self.engine.default_binary())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JimakuError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| JimakuError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| JimakuError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| JimakuError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Like `save_to_file`, but never replaces an existing file
    pub fn save_to_new_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(JimakuError::Config(format!(
                "Refusing to overwrite existing file: {}",
                path.display()
            )));
        }

        self.save_to_file(path)
    }
}
