pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AudioError, ConfigError, ReadinessError, ScenarioError, StreamError};
pub use types::{
    AudioAsset, ExpectedPhrases, ServiceEndpoint, TranscriptEvent, TranscriptKind, Verdict,
};
