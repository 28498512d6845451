use crate::error::{AudioError, ReadinessError, ScenarioError, StreamError};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    #[serde(rename = "health_url")]
    pub health_check_url: String,
}

impl ServiceEndpoint {
    pub fn new(name: &str, health_check_url: &str) -> Self {
        Self {
            name: name.to_string(),
            health_check_url: health_check_url.to_string(),
        }
    }
}

/// Source audio plus the canonical PCM format it is normalized to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub source_path: PathBuf,
    pub target_sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioAsset {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            target_sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    pub fn bytes_per_second(&self) -> usize {
        self.target_sample_rate as usize * self.channels as usize * (self.bits_per_sample / 8) as usize
    }

    pub fn ensure_exists(&self) -> Result<(), AudioError> {
        if self.source_path.is_file() {
            Ok(())
        } else {
            Err(AudioError::FixtureMissing(self.source_path.clone()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
    #[serde(other)]
    Other,
}

/// Payload of a `transcription:` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptEvent {
    #[serde(rename = "type")]
    pub kind: TranscriptKind,
    #[serde(default)]
    pub text: String,
}

impl TranscriptEvent {
    pub fn is_final(&self) -> bool {
        self.kind == TranscriptKind::Final
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedPhrases {
    phrases: Vec<String>,
}

impl ExpectedPhrases {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive substring containment of any expected phrase.
    pub fn matches(&self, transcript: &str) -> bool {
        let lowered = transcript.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for ExpectedPhrases {
    fn default() -> Self {
        Self::new(["hello world", "hello"])
    }
}

/// Outcome of one scenario run.
#[derive(Debug)]
pub enum Verdict {
    Success { transcript: String },
    ContentMismatch { transcript: String },
    Timeout(ScenarioError),
    ConnectionError(ScenarioError),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success { .. })
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Verdict::Success { transcript } => {
                format!("PASS: final transcript '{transcript}' matches expected content")
            }
            Verdict::ContentMismatch { transcript } => {
                format!("FAIL [ContentMismatch]: unexpected transcript '{transcript}'")
            }
            Verdict::Timeout(e) | Verdict::ConnectionError(e) => {
                format!("FAIL [{}]: {e}", e.category())
            }
        }
    }
}

impl From<ScenarioError> for Verdict {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::ContentMismatch { transcript, .. } => {
                Verdict::ContentMismatch { transcript }
            }
            ScenarioError::Readiness(ReadinessError::Timeout { .. })
            | ScenarioError::Stream(StreamError::OverallTimeout(_)) => Verdict::Timeout(err),
            other => Verdict::ConnectionError(other),
        }
    }
}
