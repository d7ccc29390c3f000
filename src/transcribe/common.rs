use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{JimakuError, Result};

/// Run an engine command to completion, turning launch failures and
/// non-zero exits into transcription errors
pub async fn run_engine(mut cmd: Command, engine: &str) -> Result<()> {
    debug!("Running {}: {:?}", engine, cmd.as_std());

    let output = cmd
        .output()
        .await
        .map_err(|e| JimakuError::Transcriber(format!("Failed to execute {}: {}", engine, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(JimakuError::Transcriber(format!(
            "{} failed ({}): {}",
            engine,
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

/// Read and parse the JSON document an engine left behind
pub async fn read_engine_output<T: DeserializeOwned>(json_file: &Path, engine: &str) -> Result<T> {
    if !json_file.exists() {
        return Err(JimakuError::Transcriber(format!(
            "{} JSON output file not found: {}",
            engine,
            json_file.display()
        )));
    }

    let json_content = tokio::fs::read_to_string(json_file)
        .await
        .map_err(|e| JimakuError::Transcriber(format!("Failed to read {} output: {}", engine, e)))?;

    serde_json::from_str(&json_content)
        .map_err(|e| JimakuError::Transcriber(format!("Failed to parse {} JSON: {}", engine, e)))
}

/// File stem of a media path, as engines use it to name their output
pub fn media_stem(media_path: &Path) -> Result<String> {
    media_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| {
            JimakuError::Transcriber(format!("Invalid media filename: {}", media_path.display()))
        })
}
