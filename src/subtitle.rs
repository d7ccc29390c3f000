use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::transcript::{Segment, Transcription};

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
///
/// Every field is truncated, never rounded, so `59.9996` renders as
/// `00:00:59,999`. Hours are not capped and widen past two digits.
/// Negative input is outside the contract; the casts saturate it to zero.
pub fn format_srt_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds - seconds.floor()) * 1000.0).floor() as u64;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render segments as SubRip text, one numbered cue per segment
pub fn render_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(segment.start),
            format_srt_time(segment.end),
            segment.text.trim()
        ));
    }

    srt_content
}

/// Generate SRT subtitle file from transcription
///
/// The content is written to a hidden sibling file first and renamed over
/// `output_path`, so the destination either holds the complete subtitles or
/// is left as it was.
pub async fn generate_srt<P: AsRef<Path>>(
    transcription: &Transcription,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let srt_content = render_srt(&transcription.segments);
    let temp_path = staging_path(output_path);
    debug!("Staging {} cues in {}", transcription.segments.len(), temp_path.display());

    if let Err(e) = fs::write(&temp_path, srt_content.as_bytes()).await {
        discard(&temp_path).await;
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, output_path).await {
        discard(&temp_path).await;
        return Err(e.into());
    }

    info!("SRT file generated successfully");
    Ok(())
}

fn staging_path(output_path: &Path) -> PathBuf {
    let file_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "subtitles.srt".to_string());

    output_path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
}

async fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staging file {}: {}", temp_path.display(), e);
        }
    }
}
