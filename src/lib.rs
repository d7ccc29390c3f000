//! Jimaku - Batch Subtitle Generation
//!
//! Walks a directory of videos, runs each one through a whisper transcription
//! engine and writes the recognized speech as SubRip (`.srt`) subtitles next
//! to it. Videos that already have subtitles are left alone.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod setup;
pub mod subtitle;
pub mod transcribe;
pub mod transcript;
pub mod workflow;

pub use error::{JimakuError, Result};
pub use transcript::{Segment, Transcription};
