// Media processing through an external ffmpeg binary.
//
// Only audio extraction is needed: whisper.cpp reads 16 kHz WAV, while the
// OpenAI tool decodes containers itself.

pub mod commands;

use std::path::Path;
use tracing::info;

pub use commands::*;

use crate::config::MediaConfig;
use crate::error::{JimakuError, Result};

/// FFmpeg-based media processor
pub struct MediaProcessor {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessor {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(&config.binary_path),
        }
    }

    /// Extract a mono 16 kHz WAV track from a video file
    pub async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        if !video_path.exists() {
            return Err(JimakuError::FileNotFound(video_path.display().to_string()));
        }

        self.command_builder
            .extract_audio(video_path, audio_path)
            .execute()
            .await
    }

    /// Check if ffmpeg can be launched
    pub async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| JimakuError::Media(format!("Media processor not available: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }
}
