// Transcription providers
//
// Each engine wraps an external speech recognition command:
// - OpenAi: the `whisper` command-line tool from the openai-whisper package
// - WhisperCpp: whisper.cpp's `whisper-cli`, fed with audio extracted by ffmpeg
//
// Engines parse their own JSON output into the shared `Transcription` model and
// never post-process segment text.

pub mod common;
pub mod openai;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{Config, TranscriptionEngine};
use crate::error::Result;
use crate::transcript::Transcription;

/// Converts one media file into time-stamped segments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a media file; blocks until the engine finishes
    async fn transcribe(&self, media_path: &Path) -> Result<Transcription>;

    /// Verify the engine's tools can be launched
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the transcriber selected by `config.transcriber.engine`
    pub fn create(config: &Config) -> Result<Box<dyn Transcriber>> {
        let transcriber: Box<dyn Transcriber> = match config.transcriber.engine {
            TranscriptionEngine::OpenAi => {
                Box::new(openai::OpenAITranscriber::new(config.transcriber.clone()))
            }
            TranscriptionEngine::WhisperCpp => Box::new(whisper_cpp::WhisperCppTranscriber::new(
                config.transcriber.clone(),
                &config.media,
            )?),
        };

        Ok(transcriber)
    }
}
