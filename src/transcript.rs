use serde::{Deserialize, Serialize};

/// One contiguous span of recognized speech, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    /// Raw recognized text; may carry leading or trailing whitespace
    pub text: String,
}

/// Segments for one input file, ordered by `start` as the engine produced them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub language: Option<String>,
}

impl Segment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

impl Transcription {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            language: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

