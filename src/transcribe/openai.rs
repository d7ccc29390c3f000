// OpenAI Whisper command-line implementation
// The `whisper` tool decodes video containers itself, so media goes in as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::Transcriber;
use super::common::{media_stem, read_engine_output, run_engine};
use crate::config::TranscriberConfig;
use crate::error::{JimakuError, Result};
use crate::transcript::{Segment, Transcription};

const ENGINE: &str = "OpenAI Whisper";

/// OpenAI Whisper specific JSON output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<OpenAIWhisperSegment>,
    pub language: Option<String>,
}

/// OpenAI Whisper specific segment format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperSegment {
    #[serde(default)]
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub avg_logprob: Option<f64>,
    pub no_speech_prob: Option<f64>,
}

impl From<OpenAIWhisperOutput> for Transcription {
    fn from(output: OpenAIWhisperOutput) -> Self {
        Transcription {
            segments: output
                .segments
                .into_iter()
                .map(|seg| Segment::new(seg.start, seg.end, seg.text))
                .collect(),
            language: output.language,
        }
    }
}

pub struct OpenAITranscriber {
    config: TranscriberConfig,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, media_path: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(self.config.binary());
        cmd.arg(media_path)
            .arg("--model").arg(&self.config.model)
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json")
            .arg("--temperature").arg(self.config.temperature.to_string())
            .arg("--verbose").arg("False");

        if let Some(lang) = &self.config.language {
            cmd.arg("--language").arg(lang);
        }

        cmd
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Transcription> {
        info!("Transcribing {} with {} model '{}'", media_path.display(), ENGINE, self.config.model);

        if !media_path.exists() {
            return Err(JimakuError::FileNotFound(media_path.display().to_string()));
        }

        let temp_dir = tempfile::tempdir()
            .map_err(|e| JimakuError::Transcriber(format!("Failed to create temp directory: {}", e)))?;

        run_engine(self.build_command(media_path, temp_dir.path()), ENGINE).await?;

        let json_file = temp_dir.path().join(format!("{}.json", media_stem(media_path)?));
        let output: OpenAIWhisperOutput = read_engine_output(&json_file, ENGINE).await?;

        debug!(
            "{} returned {} segments (language: {})",
            ENGINE,
            output.segments.len(),
            output.language.as_deref().unwrap_or("unknown")
        );

        Ok(output.into())
    }

    async fn check_availability(&self) -> Result<()> {
        let mut cmd = Command::new(self.config.binary());
        cmd.arg("--help");

        run_engine(cmd, ENGINE).await.map_err(|e| {
            JimakuError::Transcriber(format!(
                "{} not available. Install with: pip install openai-whisper\n{}",
                ENGINE, e
            ))
        })?;

        info!("{} command-line tool is available", ENGINE);
        Ok(())
    }
}
