//! Best-effort sanity checks against the transcription service.
//!
//! Nothing here affects the verdict: every failure is recorded in the
//! [`ProbeReport`] and logged at `warn`.

use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use voxprobe_core::config::DiagnosticsConfig;
use voxprobe_core::ReadinessError;

const BODY_PREVIEW_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl ProbeResult {
    fn ok(name: &str, detail: String) -> Self {
        Self {
            name: name.to_string(),
            ok: true,
            detail,
        }
    }

    fn failed(name: &str, detail: String) -> Self {
        Self {
            name: name.to_string(),
            ok: false,
            detail,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.ok)
    }

    pub fn get(&self, name: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

pub struct DiagnosticProbe {
    client: reqwest::Client,
    config: DiagnosticsConfig,
}

impl DiagnosticProbe {
    pub fn new(config: DiagnosticsConfig) -> Result<Self, ReadinessError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ReadinessError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Run every probe in order: health, each transcription path, websocket.
    pub async fn run(&self, audio_path: &Path) -> ProbeReport {
        let mut report = ProbeReport::default();
        report.results.push(self.probe_health().await);

        match tokio::fs::read(audio_path).await {
            Ok(audio) => {
                let file_name = audio_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "audio".to_string());
                for path in &self.config.transcription_paths {
                    report
                        .results
                        .push(self.probe_transcription(path, &file_name, &audio).await);
                }
            }
            Err(e) => report.results.push(ProbeResult::failed(
                "transcription",
                format!("could not read {}: {e}", audio_path.display()),
            )),
        }

        report.results.push(self.probe_websocket().await);

        for failure in report.failures() {
            tracing::warn!(probe = %failure.name, "diagnostic check failed: {}", failure.detail);
        }
        report
    }

    pub async fn probe_health(&self) -> ProbeResult {
        let url = format!("{}{}", self.config.base_url, self.config.health_path);
        tracing::info!("checking service health via HTTP: {url}");
        match self.client.get(&url).send().await {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let detail = format!("{status} {}", preview(&body));
                tracing::info!("health: {detail}");
                if status.is_success() {
                    ProbeResult::ok("health", detail)
                } else {
                    ProbeResult::failed("health", detail)
                }
            }
            Err(e) => ProbeResult::failed("health", e.to_string()),
        }
    }

    pub async fn probe_transcription(&self, path: &str, file_name: &str, audio: &[u8]) -> ProbeResult {
        let name = format!("transcription {path}");
        let url = format!("{}{}", self.config.base_url, path);
        tracing::info!("checking transcription via HTTP: {url}");

        let part = match Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
        {
            Ok(part) => part,
            Err(e) => return ProbeResult::failed(&name, e.to_string()),
        };
        let form = Form::new().part("file", part);

        match self.client.post(&url).multipart(form).send().await {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let detail = format!("{status} {}", preview(&body));
                tracing::info!("transcription result: {detail}");
                if status.is_success() {
                    ProbeResult::ok(&name, detail)
                } else {
                    ProbeResult::failed(&name, detail)
                }
            }
            Err(e) => ProbeResult::failed(&name, e.to_string()),
        }
    }

    pub async fn probe_websocket(&self) -> ProbeResult {
        let url = &self.config.ws_url;
        tracing::info!("checking websocket directly: {url}");
        let connect = tokio_tungstenite::connect_async(url.as_str());
        match tokio::time::timeout(self.ws_timeout(), connect).await {
            Ok(Ok((mut ws, _))) => {
                let _ = ws.close(None).await;
                ProbeResult::ok("websocket", format!("connected to {url}"))
            }
            Ok(Err(e)) => ProbeResult::failed("websocket", e.to_string()),
            Err(_) => ProbeResult::failed(
                "websocket",
                format!("connect timed out after {:?}", self.ws_timeout()),
            ),
        }
    }

    fn ws_timeout(&self) -> Duration {
        self.config.timeout()
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
