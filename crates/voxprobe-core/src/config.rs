use crate::error::ConfigError;
use crate::types::{AudioAsset, ExpectedPhrases, ServiceEndpoint};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub target: TargetConfig,

    /// Services gated on before streaming. `service = []` disables the gate.
    #[serde(default = "default_services")]
    pub service: Vec<ServiceEndpoint>,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Fallback WebSocket URL when the environment variable is unset.
    #[serde(default = "default_target_url")]
    pub url: String,

    #[serde(default = "default_target_url_env")]
    pub url_env: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: default_target_url(),
            url_env: default_target_url_env(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReadinessConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ReadinessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    #[serde(default = "default_converter")]
    pub converter: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,

    /// Converter-specific settings, e.g. `[audio.ffmpeg] path = "..."`.
    #[serde(default)]
    pub ffmpeg: Option<toml::Value>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            converter: default_converter(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bits_per_sample: default_bits_per_sample(),
            ffmpeg: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default = "default_silence_secs")]
    pub silence_secs: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            pacing_ms: default_pacing_ms(),
            silence_secs: default_silence_secs(),
        }
    }
}

impl StreamConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_expected")]
    pub expected: Vec<String>,

    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,

    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            expected: default_expected(),
            receive_timeout_ms: default_receive_timeout_ms(),
            overall_timeout_ms: default_overall_timeout_ms(),
        }
    }
}

impl MatcherConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn expected_phrases(&self) -> ExpectedPhrases {
        ExpectedPhrases::new(&self.expected)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_diagnostics_base_url")]
    pub base_url: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_transcription_paths")]
    pub transcription_paths: Vec<String>,

    #[serde(default = "default_diagnostics_ws_url")]
    pub ws_url: String,

    #[serde(default = "default_diagnostics_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_diagnostics_base_url(),
            health_path: default_health_path(),
            transcription_paths: default_transcription_paths(),
            ws_url: default_diagnostics_ws_url(),
            timeout_ms: default_diagnostics_timeout_ms(),
        }
    }
}

impl DiagnosticsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_target_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_target_url_env() -> String {
    "VOXPROBE_TARGET_URL".to_string()
}

fn default_services() -> Vec<ServiceEndpoint> {
    vec![ServiceEndpoint::new("lily-core", "http://localhost:8000/health")]
}

fn default_attempts() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_source_path() -> PathBuf {
    PathBuf::from("tests/samples/hello_world.mp3")
}

fn default_converter() -> String {
    "ffmpeg".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_channels() -> u16 {
    1
}

fn default_bits_per_sample() -> u16 {
    16
}

fn default_chunk_size() -> usize {
    32768
}

fn default_pacing_ms() -> u64 {
    10
}

fn default_silence_secs() -> u32 {
    3
}

fn default_prefix() -> String {
    "transcription:".to_string()
}

fn default_expected() -> Vec<String> {
    vec!["hello world".to_string(), "hello".to_string()]
}

fn default_receive_timeout_ms() -> u64 {
    5000
}

fn default_overall_timeout_ms() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

fn default_diagnostics_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_transcription_paths() -> Vec<String> {
    vec![
        "/v1/audio/transcriptions".to_string(),
        "/transcribe".to_string(),
    ]
}

fn default_diagnostics_ws_url() -> String {
    "ws://localhost:8000/ws/transcribe".to_string()
}

fn default_diagnostics_timeout_ms() -> u64 {
    30_000
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"))
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = input.to_string();

    for cap in env_var_pattern().captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
        }
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the audio pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.bits_per_sample != 16 {
            return Err(ConfigError::Invalid(format!(
                "audio.bits_per_sample must be 16 (s16le), got {}",
                self.audio.bits_per_sample
            )));
        }
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(ConfigError::Invalid(
                "audio.sample_rate and audio.channels must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The streaming target: the `url_env` variable when set and non-empty,
    /// otherwise the configured URL.
    pub fn target_url(&self) -> String {
        match std::env::var(&self.target.url_env) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => self.target.url.clone(),
        }
    }

    pub fn audio_asset(&self) -> AudioAsset {
        AudioAsset {
            source_path: self.audio.source_path.clone(),
            target_sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            bits_per_sample: self.audio.bits_per_sample,
        }
    }

    /// Settings table handed to the selected audio converter.
    pub fn converter_settings(&self) -> toml::Value {
        match self.audio.converter.as_str() {
            "ffmpeg" => self
                .audio
                .ffmpeg
                .clone()
                .unwrap_or_else(|| toml::Value::Table(Default::default())),
            _ => toml::Value::Table(Default::default()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            target: TargetConfig::default(),
            service: default_services(),
            readiness: ReadinessConfig::default(),
            audio: AudioConfig::default(),
            stream: StreamConfig::default(),
            matcher: MatcherConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[target]
url = "ws://lily-core:8000"

[[service]]
name = "lily-core"
health_url = "http://lily-core:8000/health"

[[service]]
name = "echo"
health_url = "http://echo:8000/health"

[readiness]
attempts = 5
interval_ms = 100

[audio]
source_path = "fixtures/hello.pcm"
converter = "raw"

[stream]
chunk_size = 4096
pacing_ms = 0

[matcher]
expected = ["good morning"]
overall_timeout_ms = 1000
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.target.url, "ws://lily-core:8000");
        assert_eq!(config.service.len(), 2);
        assert_eq!(config.service[0].name, "lily-core");
        assert_eq!(config.service[1].health_check_url, "http://echo:8000/health");
        assert_eq!(config.readiness.attempts, 5);
        assert_eq!(config.readiness.interval(), Duration::from_millis(100));
        assert_eq!(config.audio.converter, "raw");
        assert_eq!(config.audio.source_path, PathBuf::from("fixtures/hello.pcm"));
        assert_eq!(config.stream.chunk_size, 4096);
        assert_eq!(config.stream.pacing(), Duration::ZERO);
        assert_eq!(config.matcher.expected, vec!["good morning"]);
        assert_eq!(config.matcher.overall_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.target.url, "ws://localhost:8000");
        assert_eq!(config.target.url_env, "VOXPROBE_TARGET_URL");
        assert_eq!(config.service.len(), 1);
        assert_eq!(config.service[0].name, "lily-core");
        assert_eq!(config.service[0].health_check_url, "http://localhost:8000/health");
        assert_eq!(config.readiness.attempts, 30);
        assert_eq!(config.readiness.interval(), Duration::from_secs(2));
        assert_eq!(config.audio.converter, "ffmpeg");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.audio.bits_per_sample, 16);
        assert_eq!(config.stream.chunk_size, 32768);
        assert_eq!(config.stream.pacing(), Duration::from_millis(10));
        assert_eq!(config.stream.silence_secs, 3);
        assert_eq!(config.matcher.prefix, "transcription:");
        assert_eq!(config.matcher.receive_timeout(), Duration::from_secs(5));
        assert_eq!(config.matcher.overall_timeout(), Duration::from_secs(60));
        assert!(config.diagnostics.enabled);
        assert_eq!(
            config.diagnostics.transcription_paths,
            vec!["/v1/audio/transcriptions", "/transcribe"]
        );
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("VOXPROBE_TEST_HEALTH_HOST", "echo.internal");
        let toml_str = r#"
[[service]]
name = "echo"
health_url = "http://${VOXPROBE_TEST_HEALTH_HOST}/health"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.service[0].health_check_url, "http://echo.internal/health");
        std::env::remove_var("VOXPROBE_TEST_HEALTH_HOST");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[general]
log_level = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let err = AppConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let result = AppConfig::from_toml_str("this is not valid toml [[[");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_target_url_from_env() {
        let toml_str = r#"
[target]
url = "ws://fallback:8000"
url_env = "VOXPROBE_TEST_TARGET_URL_SET"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        std::env::set_var("VOXPROBE_TEST_TARGET_URL_SET", "ws://from-env:9000");
        assert_eq!(config.target_url(), "ws://from-env:9000");
        std::env::remove_var("VOXPROBE_TEST_TARGET_URL_SET");
    }

    #[test]
    fn test_config_target_url_default_when_unset() {
        let toml_str = r#"
[target]
url = "ws://fallback:8000"
url_env = "VOXPROBE_TEST_TARGET_URL_UNSET"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.target_url(), "ws://fallback:8000");
    }

    #[test]
    fn test_config_audio_asset() {
        let toml_str = r#"
[audio]
source_path = "samples/hello_world.mp3"
sample_rate = 8000
"#;
        let asset = AppConfig::from_toml_str(toml_str).unwrap().audio_asset();
        assert_eq!(asset.source_path, PathBuf::from("samples/hello_world.mp3"));
        assert_eq!(asset.target_sample_rate, 8000);
        assert_eq!(asset.bytes_per_second(), 16000);
    }

    #[test]
    fn test_config_ffmpeg_settings() {
        let toml_str = r#"
[audio.ffmpeg]
path = "/usr/local/bin/ffmpeg"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        let settings = config.converter_settings();
        assert_eq!(
            settings.get("path").and_then(|v| v.as_str()),
            Some("/usr/local/bin/ffmpeg")
        );
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("voxprobe_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[readiness]
attempts = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.readiness.attempts, 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }

    #[test]
    fn test_config_empty_service_list_disables_gate() {
        let config = AppConfig::from_toml_str("service = []").unwrap();
        assert!(config.service.is_empty());
    }

    #[test]
    fn test_config_default_matches_empty_file() {
        let parsed = AppConfig::from_toml_str("").unwrap();
        let built = AppConfig::default();
        assert_eq!(parsed.service, built.service);
        assert_eq!(parsed.audio.bits_per_sample, built.audio.bits_per_sample);
    }

    #[test]
    fn test_config_rejects_non_s16_bits_per_sample() {
        for bits in [8, 24, 32] {
            let toml_str = format!("[audio]\nbits_per_sample = {bits}\n");
            match AppConfig::from_toml_str(&toml_str) {
                Err(ConfigError::Invalid(msg)) => assert!(msg.contains("bits_per_sample")),
                other => panic!("expected Invalid for {bits} bits, got {other:?}"),
            }
        }
        assert!(AppConfig::from_toml_str("[audio]\nbits_per_sample = 16\n").is_ok());
    }

    #[test]
    fn test_config_rejects_zero_sample_rate() {
        let result = AppConfig::from_toml_str("[audio]\nsample_rate = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
