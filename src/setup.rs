use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{JimakuError, Result};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// A downloadable whisper.cpp ggml model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInfo {
    pub name: &'static str,
    pub size_mb: f64,
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo { name: "tiny", size_mb: 75.0 },
    ModelInfo { name: "tiny.en", size_mb: 75.0 },
    ModelInfo { name: "base", size_mb: 142.0 },
    ModelInfo { name: "base.en", size_mb: 142.0 },
    ModelInfo { name: "small", size_mb: 466.0 },
    ModelInfo { name: "small.en", size_mb: 466.0 },
    ModelInfo { name: "medium", size_mb: 1500.0 },
    ModelInfo { name: "medium.en", size_mb: 1500.0 },
    ModelInfo { name: "large-v2", size_mb: 2900.0 },
    ModelInfo { name: "large-v3", size_mb: 2900.0 },
    ModelInfo { name: "large-v3-turbo", size_mb: 1600.0 },
];

impl ModelInfo {
    pub fn lookup(name: &str) -> Option<&'static ModelInfo> {
        MODELS.iter().find(|m| m.name == name)
    }

    pub fn filename(&self) -> String {
        format!("ggml-{}.bin", self.name)
    }

    pub fn url(&self) -> String {
        format!("{}/{}", MODEL_BASE_URL, self.filename())
    }
}

/// Resolves and downloads whisper.cpp model files
pub struct ModelManager {
    client: Client,
    models_dir: PathBuf,
}

impl ModelManager {
    pub fn new<P: Into<PathBuf>>(models_dir: P) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jimaku/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            models_dir: models_dir.into(),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Map a model name to its file; anything that already looks like a path passes through
    pub fn resolve(&self, model: &str) -> PathBuf {
        if model.contains('/') || model.contains('\\') || model.ends_with(".bin") {
            return PathBuf::from(model);
        }

        self.models_dir.join(format!("ggml-{}.bin", model))
    }

    pub fn is_downloaded(&self, model: &ModelInfo) -> bool {
        self.models_dir.join(model.filename()).exists()
    }

    /// Return a local model file, downloading a catalogue model when missing
    pub async fn ensure(&self, model: &str) -> Result<PathBuf> {
        let path = self.resolve(model);
        if path.exists() {
            return Ok(path);
        }

        match ModelInfo::lookup(model) {
            Some(info) => self.download(info).await,
            None => Err(JimakuError::Config(format!(
                "Model '{}' not found at {} and is not a known whisper.cpp model",
                model,
                path.display()
            ))),
        }
    }

    pub async fn download(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.models_dir.join(model.filename());

        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        async_fs::create_dir_all(&self.models_dir).await?;
        info!("Downloading {} model ({:.0} MB)...", model.name, model.size_mb);

        let mut response = self.client.get(model.url()).send().await?;
        if !response.status().is_success() {
            return Err(JimakuError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name,
                response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let part_path = local_path.with_extension("part");
        let mut file = async_fs::File::create(&part_path).await?;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }

        file.flush().await?;
        drop(file);

        async_fs::rename(&part_path, &local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }
}
