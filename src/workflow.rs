use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{JimakuError, Result};
use crate::subtitle::generate_srt;
use crate::transcribe::Transcriber;

/// Video files directly inside one directory, filtered by extension
///
/// Each call to [`MediaScan::iter`] starts a fresh walk.
#[derive(Debug, Clone)]
pub struct MediaScan {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl MediaScan {
    pub fn new<P: Into<PathBuf>>(dir: P, extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive extension check
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Lazily yield candidate files in file name order
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<PathBuf>> + '_> {
        // surface an unreadable directory before the first entry
        std::fs::read_dir(&self.dir)?;

        Ok(WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.path().is_file() && self.matches(entry.path()) => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(e) => Some(Err(e.into())),
            }))
    }
}

/// What happened to each candidate in one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.processed.len() + self.failed.len()
    }

    /// Turn recorded per-file failures into an error
    pub fn ensure_success(&self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(JimakuError::Batch {
                failed: self.failed.len(),
                attempted: self.attempted(),
            })
        }
    }
}

/// Sequential transcribe-and-write pipeline around one transcriber
pub struct Workflow {
    config: Config,
    transcriber: Box<dyn Transcriber>,
}

impl Workflow {
    pub fn new(config: Config, transcriber: Box<dyn Transcriber>) -> Self {
        Self { config, transcriber }
    }

    /// `<output_dir>/<input stem>.<output extension>`
    pub fn output_path_for(&self, input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = input_path
            .file_stem()
            .ok_or_else(|| JimakuError::Config(format!("Invalid video filename: {}", input_path.display())))?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(&self.config.batch.output_extension);

        Ok(output_dir.join(file_name))
    }

    /// Subtitle every matching video in `input_dir`
    ///
    /// Files whose subtitle already exists are skipped unless `force` is set.
    /// With `batch.fail_fast` the first failure aborts the run; otherwise it is
    /// logged, recorded in the report and the batch moves on.
    pub async fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        force: bool,
    ) -> Result<BatchReport> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(JimakuError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let output_dir = output_dir.unwrap_or(input_dir);
        fs::create_dir_all(output_dir).await?;

        let total_start = Instant::now();
        let mut report = BatchReport::default();
        let scan = MediaScan::new(input_dir, &self.config.batch.extensions);

        for entry in scan.iter()? {
            let video_path = entry?;
            let output_path = self.output_path_for(&video_path, output_dir)?;

            if !force && output_path.exists() {
                info!("Skipping '{}' as it is already subtitled.", video_path.display());
                report.skipped.push(video_path);
                continue;
            }

            match self.process_video_file(&video_path, &output_path).await {
                Ok(()) => report.processed.push(video_path),
                Err(e) if self.config.batch.fail_fast => return Err(e),
                Err(e) => {
                    error!("Failed to process {}: {}", video_path.display(), e);
                    report.failed.push((video_path, e.to_string()));
                }
            }
        }

        report.elapsed = total_start.elapsed();
        info!(
            "Processed {}, skipped {}, failed {}",
            report.processed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        info!("Total processing time: {:.2} seconds", report.elapsed.as_secs_f64());

        Ok(report)
    }

    /// Subtitle one file regardless of existing output
    pub async fn transcribe_file(&self, input_path: &Path, output_path: Option<&Path>) -> Result<PathBuf> {
        if !input_path.exists() {
            return Err(JimakuError::FileNotFound(input_path.display().to_string()));
        }

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = input_path.parent().unwrap_or_else(|| Path::new("."));
                self.output_path_for(input_path, dir)?
            }
        };

        if output_path.exists() {
            warn!("Overwriting existing subtitles: {}", output_path.display());
        }

        self.process_video_file(input_path, &output_path).await?;
        Ok(output_path)
    }

    async fn process_video_file(&self, video_path: &Path, output_path: &Path) -> Result<()> {
        info!("Processing '{}'...", video_path.display());

        let started_at = Local::now();
        let timer = Instant::now();

        let transcription = self.transcriber.transcribe(video_path).await?;
        if transcription.is_empty() {
            warn!("No speech recognized in {}", video_path.display());
        }
        generate_srt(&transcription, output_path).await?;

        info!("Subtitles saved to '{}'!", output_path.display());
        info!(
            "File: {} | Start Time: {} | End Time: {} | Duration: {:.2} seconds",
            video_path.display(),
            started_at.format("%H:%M:%S"),
            Local::now().format("%H:%M:%S"),
            timer.elapsed().as_secs_f64()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::MockTranscriber;
    use crate::transcript::{Segment, Transcription};

    fn sample() -> Transcription {
        Transcription::new(vec![
            Segment::new(0.0, 2.5, " Hello world "),
            Segment::new(2.5, 5.0, "Goodbye."),
        ])
    }

    const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,500\nHello world\n\n\
                              2\n00:00:02,500 --> 00:00:05,000\nGoodbye.\n\n";

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    fn workflow(config: Config, mock: MockTranscriber) -> Workflow {
        Workflow::new(config, Box::new(mock))
    }

    #[test]
    fn test_scan_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mp4");
        touch(dir.path(), "a.MP4");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "a.srt");
        std::fs::create_dir(dir.path().join("clips.mp4")).unwrap();

        let scan = MediaScan::new(dir.path(), &["mp4".to_string()]);
        let found: Vec<String> = scan
            .iter()
            .unwrap()
            .map(|p| p.unwrap().file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found, vec!["a.MP4", "b.mp4"]);

        // restartable
        assert_eq!(scan.iter().unwrap().count(), 2);
    }

    #[test]
    fn test_scan_accepts_dotted_extensions() {
        let scan = MediaScan::new("/videos", &[".mkv".to_string(), "MP4".to_string()]);
        assert!(scan.matches(Path::new("/videos/show.mkv")));
        assert!(scan.matches(Path::new("/videos/show.mp4")));
        assert!(!scan.matches(Path::new("/videos/show.avi")));
        assert!(!scan.matches(Path::new("/videos/mp4")));
    }

    #[test]
    fn test_scan_unreadable_directory() {
        let scan = MediaScan::new("/nonexistent/videos", &["mp4".to_string()]);
        assert!(matches!(scan.iter().map(|_| ()), Err(JimakuError::Io(_))));
    }

    #[test]
    fn test_output_path_for() {
        let wf = workflow(Config::default(), MockTranscriber::new());
        let output = wf
            .output_path_for(Path::new("/videos/lecture.part1.mp4"), Path::new("/subs"))
            .unwrap();
        assert_eq!(output, PathBuf::from("/subs/lecture.part1.srt"));
    }

    #[tokio::test]
    async fn test_existing_subtitle_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "video.mp4");
        let existing = dir.path().join("video.srt");
        std::fs::write(&existing, "1\n00:00:00,000 --> 00:00:01,000\nkeep me\n\n").unwrap();

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(0);

        let report = workflow(Config::default(), mock)
            .process_directory(dir.path(), None, false)
            .await
            .unwrap();

        assert_eq!(report.skipped, vec![dir.path().join("video.mp4")]);
        assert!(report.processed.is_empty());
        assert_eq!(
            std::fs::read_to_string(&existing).unwrap(),
            "1\n00:00:00,000 --> 00:00:01,000\nkeep me\n\n"
        );
    }

    #[tokio::test]
    async fn test_force_regenerates_existing_subtitle() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "video.mp4");
        std::fs::write(dir.path().join("video.srt"), "old").unwrap();

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(1).returning(|_| Ok(sample()));

        let report = workflow(Config::default(), mock)
            .process_directory(dir.path(), None, true)
            .await
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("video.srt")).unwrap(), SAMPLE_SRT);
    }

    #[tokio::test]
    async fn test_processes_each_video_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.mp4");
        touch(dir.path(), "two.mp4");
        touch(dir.path(), "three.mov");

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(2).returning(|_| Ok(sample()));

        let report = workflow(Config::default(), mock)
            .process_directory(dir.path(), None, false)
            .await
            .unwrap();

        assert_eq!(
            report.processed,
            vec![dir.path().join("one.mp4"), dir.path().join("two.mp4")]
        );
        assert_eq!(std::fs::read_to_string(dir.path().join("one.srt")).unwrap(), SAMPLE_SRT);
        assert_eq!(std::fs::read_to_string(dir.path().join("two.srt")).unwrap(), SAMPLE_SRT);
        assert!(!dir.path().join("three.srt").exists());
        assert!(report.ensure_success().is_ok());
    }

    #[tokio::test]
    async fn test_separate_output_directory() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let subs = output.path().join("subs");
        touch(input.path(), "clip.mp4");

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(1).returning(|_| Ok(Transcription::default()));

        workflow(Config::default(), mock)
            .process_directory(input.path(), Some(&subs), false)
            .await
            .unwrap();

        assert_eq!(std::fs::metadata(subs.join("clip.srt")).unwrap().len(), 0);
        assert!(!input.path().join("clip.srt").exists());
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe()
            .times(1)
            .returning(|_| Err(JimakuError::Transcriber("unsupported codec".to_string())));

        let result = workflow(Config::default(), mock)
            .process_directory(dir.path(), None, false)
            .await;

        assert!(matches!(result, Err(JimakuError::Transcriber(_))));
        assert!(!dir.path().join("a.srt").exists());
        assert!(!dir.path().join("b.srt").exists());
    }

    #[tokio::test]
    async fn test_keep_going_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");

        let mut config = Config::default();
        config.batch.fail_fast = false;

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(2).returning(|path: &Path| {
            if path.ends_with("a.mp4") {
                Err(JimakuError::Transcriber("corrupt media".to_string()))
            } else {
                Ok(sample())
            }
        });

        let report = workflow(config, mock)
            .process_directory(dir.path(), None, false)
            .await
            .unwrap();

        assert_eq!(report.processed, vec![dir.path().join("b.mp4")]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].1.contains("corrupt media"));
        assert!(!dir.path().join("a.srt").exists());
        assert!(matches!(
            report.ensure_success(),
            Err(JimakuError::Batch { failed: 1, attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_input_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "video.mp4");

        let result = workflow(Config::default(), MockTranscriber::new())
            .process_directory(&file, None, false)
            .await;
        assert!(matches!(result, Err(JimakuError::Config(_))));
    }

    #[tokio::test]
    async fn test_transcribe_file_defaults_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let video = touch(dir.path(), "talk.mp4");
        std::fs::write(dir.path().join("talk.srt"), "old").unwrap();

        let mut mock = MockTranscriber::new();
        mock.expect_transcribe().times(1).returning(|_| Ok(sample()));

        let written = workflow(Config::default(), mock)
            .transcribe_file(&video, None)
            .await
            .unwrap();

        assert_eq!(written, dir.path().join("talk.srt"));
        assert_eq!(std::fs::read_to_string(&written).unwrap(), SAMPLE_SRT);
    }

    #[tokio::test]
    async fn test_transcribe_file_missing_input() {
        let result = workflow(Config::default(), MockTranscriber::new())
            .transcribe_file(Path::new("/nonexistent/talk.mp4"), None)
            .await;
        assert!(matches!(result, Err(JimakuError::FileNotFound(_))));
    }
}
