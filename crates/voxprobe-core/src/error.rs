use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio fixture not found: {}", .0.display())]
    FixtureMissing(PathBuf),

    #[error("transcoder executable not found: {0}")]
    ConverterMissing(String),

    #[error("transcoder failed: {0}")]
    ConverterFailed(String),

    #[error("audio converter not found: {name} (available: {})", .available.join(", "))]
    ConverterNotFound { name: String, available: Vec<String> },

    #[error("audio converter initialization failed: {0}")]
    InitializationFailed(String),

    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("service '{service}' not healthy after {attempts} attempts")]
    Timeout { service: String, attempts: u32 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("connection error: {0}")]
    Transport(String),

    #[error("malformed transcript envelope: {0}")]
    Protocol(String),

    #[error("no final transcript within {0:?}")]
    OverallTimeout(Duration),
}

/// Terminal failure of a scenario run.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Setup(#[from] AudioError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("unexpected transcript '{transcript}', expected one of {expected:?}")]
    ContentMismatch {
        transcript: String,
        expected: Vec<String>,
    },
}

impl ScenarioError {
    /// Name of the failure category, as reported on the final outcome line.
    pub fn category(&self) -> &'static str {
        match self {
            ScenarioError::Setup(_) => "SetupError",
            ScenarioError::Readiness(_) => "ReadinessTimeout",
            ScenarioError::Stream(StreamError::Protocol(_)) => "ProtocolError",
            ScenarioError::Stream(StreamError::OverallTimeout(_)) => "OverallTimeout",
            ScenarioError::Stream(_) => "TransportError",
            ScenarioError::ContentMismatch { .. } => "ContentMismatch",
        }
    }
}
