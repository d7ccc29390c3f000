use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::Transcriber;
use super::common::{media_stem, read_engine_output, run_engine};
use crate::config::{MediaConfig, TranscriberConfig};
use crate::error::{JimakuError, Result};
use crate::media::MediaProcessor;
use crate::setup::ModelManager;
use crate::transcript::{Segment, Transcription};

const ENGINE: &str = "whisper.cpp";

/// whisper.cpp `-oj` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub offsets: WhisperCppOffsets,
    pub text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: i64,
    pub to: i64,
}

impl From<WhisperCppOutput> for Transcription {
    fn from(output: WhisperCppOutput) -> Self {
        Transcription {
            segments: output
                .transcription
                .into_iter()
                // f64 seconds cannot hold every millisecond exactly, so the
                // truncating formatter may render some offsets 1 ms early
                // (4350 ms -> 00:00:04,349).
                .map(|seg| {
                    Segment::new(
                        seg.offsets.from as f64 / 1000.0,
                        seg.offsets.to as f64 / 1000.0,
                        seg.text,
                    )
                })
                .collect(),
            language: output.result.map(|r| r.language),
        }
    }
}

pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    media: MediaProcessor,
    models: ModelManager,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig, media_config: &MediaConfig) -> Result<Self> {
        let models = ModelManager::new(config.models_dir.clone())?;

        Ok(Self {
            config,
            media: MediaProcessor::new(media_config),
            models,
        })
    }

    fn build_command(&self, model_path: &Path, audio_path: &Path, output_prefix: &Path) -> Command {
        let mut cmd = Command::new(self.config.binary());
        cmd.arg("-m").arg(model_path)
            .arg("-f").arg(audio_path)
            .arg("-oj")
            .arg("-of").arg(output_prefix)
            .arg("--temperature").arg(self.config.temperature.to_string());

        if let Some(lang) = &self.config.language {
            cmd.arg("-l").arg(lang);
        }

        cmd
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Transcription> {
        info!("Transcribing {} with {} model '{}'", media_path.display(), ENGINE, self.config.model);

        let model_path = self.models.ensure(&self.config.model).await?;

        let temp_dir = tempfile::tempdir()
            .map_err(|e| JimakuError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let stem = media_stem(media_path)?;
        let audio_path = temp_dir.path().join(format!("{}.wav", stem));
        let output_prefix = temp_dir.path().join(&stem);

        self.media.extract_audio(media_path, &audio_path).await?;

        run_engine(self.build_command(&model_path, &audio_path, &output_prefix), ENGINE).await?;

        let json_file = temp_dir.path().join(format!("{}.json", stem));
        let output: WhisperCppOutput = read_engine_output(&json_file, ENGINE).await?;
        debug!("{} returned {} segments", ENGINE, output.transcription.len());

        Ok(output.into())
    }

    async fn check_availability(&self) -> Result<()> {
        self.media.check_availability().await?;

        let mut cmd = Command::new(self.config.binary());
        cmd.arg("--help");
        run_engine(cmd, ENGINE).await?;

        info!("{} is available (models in {})", ENGINE, self.models.models_dir().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "systeminfo": "AVX = 1",
        "model": {"type": "small"},
        "params": {"model": "models/ggml-small.bin", "language": "auto", "translate": false},
        "result": {"language": "en"},
        "transcription": [
            {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
             "offsets": {"from": 0, "to": 2500}, "text": " Hello world "},
            {"timestamps": {"from": "00:00:02,500", "to": "00:00:05,000"},
             "offsets": {"from": 2500, "to": 5000}, "text": " Goodbye."}
        ]
    }"#;

    #[test]
    fn test_output_maps_offsets_to_seconds() {
        let output: WhisperCppOutput = serde_json::from_str(SAMPLE).unwrap();
        let transcription: Transcription = output.into();

        assert_eq!(transcription.language.as_deref(), Some("en"));
        assert_eq!(transcription.segments.len(), 2);
        assert_eq!(transcription.segments[0], Segment::new(0.0, 2.5, " Hello world "));
        assert_eq!(transcription.segments[1].start, 2.5);
        assert_eq!(transcription.segments[1].end, 5.0);
    }

    #[test]
    fn test_millisecond_offsets_render_within_one_millisecond() {
        let output = WhisperCppOutput {
            result: None,
            transcription: vec![WhisperCppSegment {
                offsets: WhisperCppOffsets { from: 4350, to: 61_000 },
                text: "x".to_string(),
            }],
        };
        let transcription: Transcription = output.into();
        let segment = &transcription.segments[0];

        assert_eq!(segment.start, 4.35);
        assert_eq!(crate::subtitle::format_srt_time(segment.start), "00:00:04,349");
        assert_eq!(crate::subtitle::format_srt_time(segment.end), "00:01:01,000");
    }

    #[test]
    fn test_build_command() {
        let config = TranscriberConfig {
            engine: crate::config::TranscriptionEngine::WhisperCpp,
            ..TranscriberConfig::default()
        };
        let transcriber = WhisperCppTranscriber::new(config, &MediaConfig::default()).unwrap();
        let cmd = transcriber.build_command(
            &PathBuf::from("/models/ggml-small.bin"),
            &PathBuf::from("/tmp/x/talk.wav"),
            &PathBuf::from("/tmp/x/talk"),
        );

        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(cmd.as_std().get_program(), "whisper-cli");
        assert_eq!(
            args,
            vec![
                "-m", "/models/ggml-small.bin", "-f", "/tmp/x/talk.wav", "-oj", "-of",
                "/tmp/x/talk", "--temperature", "0",
            ]
        );
    }
}
