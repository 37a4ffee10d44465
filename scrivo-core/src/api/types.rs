//! Wire types for the remote transcription service.
//!
//! Field names follow the service's snake_case JSON. The full text of a
//! result travels under the wire name `transcription`; everything else maps
//! one to one.

use serde::{Deserialize, Serialize};

/// Whisper model size selector, sent as the `model_size` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    /// Wire form (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelSize {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(format!(
                "unknown model size '{other}' (expected tiny|base|small|medium|large)"
            )),
        }
    }
}

/// A timed span of transcribed text within a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Sequence position within the parent transcription.
    pub id: u32,
    /// Span start in seconds.
    pub start: f32,
    /// Span end in seconds (`end >= start`).
    pub end: f32,
    pub text: String,
}

/// The full output of one successful transcription, including timed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub id: String,
    pub filename: String,
    /// Full recognised text.
    #[serde(rename = "transcription")]
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
    pub model_size: ModelSize,
}

impl Transcription {
    /// Check the response invariants: non-empty id, segments ordered by
    /// `start` ascending, each span non-negative with `end >= start`.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.is_empty() {
            return Err("empty transcription id".into());
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.start < 0.0 {
                return Err(format!(
                    "segment {i} has negative start {}",
                    segment.start
                ));
            }
            if segment.end < segment.start {
                return Err(format!(
                    "segment {i} ends at {} before its start {}",
                    segment.end, segment.start
                ));
            }
        }
        for pair in self.segments.windows(2) {
            if pair[1].start < pair[0].start {
                return Err(format!(
                    "segments out of order: start {} follows {}",
                    pair[1].start, pair[0].start
                ));
            }
        }
        Ok(())
    }
}

/// A summarized record of a previously completed transcription, as listed by
/// the service. `timestamp` is the service's ISO instant, kept opaque here;
/// rendering layers parse it if they need to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub filename: String,
    pub timestamp: String,
    pub language: String,
    /// Summary text; the full text lives on the corresponding result.
    pub text: String,
    pub model_size: ModelSize,
}

/// Reply of the service's health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    pub timestamp: String,
}
