use crate::converter_trait::AudioConverter;
use crate::pcm::PcmStream;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use voxprobe_core::{AudioAsset, AudioError};

/// Decodes any ffmpeg-readable file to signed 16-bit little-endian PCM.
pub struct FfmpegConverter {
    program: String,
}

impl FfmpegConverter {
    pub fn new() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(asset: &AudioAsset) -> Vec<String> {
        vec![
            "-i".to_string(),
            asset.source_path.to_string_lossy().into_owned(),
            "-f".to_string(),
            "s16le".to_string(),
            "-ac".to_string(),
            asset.channels.to_string(),
            "-ar".to_string(),
            asset.target_sample_rate.to_string(),
            "-".to_string(),
        ]
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), AudioError> {
        if let Some(path) = config.get("path") {
            let path = path.as_str().ok_or_else(|| {
                AudioError::InitializationFailed("'path' in ffmpeg config must be a string".to_string())
            })?;
            self.program = path.to_string();
        }
        tracing::debug!(program = %self.program, "FfmpegConverter initialized");
        Ok(())
    }

    async fn convert(&self, asset: &AudioAsset) -> Result<PcmStream, AudioError> {
        let args = Self::args(asset);
        tracing::info!(
            source = %asset.source_path.display(),
            "converting to PCM ({} Hz, {} ch, s16le)",
            asset.target_sample_rate,
            asset.channels,
        );

        // The whole of stdout is buffered; test fixtures are short.
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AudioError::ConverterMissing(self.program.clone()),
                _ => AudioError::Io(e),
            })?;

        if !output.status.success() {
            return Err(AudioError::ConverterFailed(format!(
                "{} {} exited with {}",
                self.program,
                args.join(" "),
                output.status
            )));
        }

        tracing::debug!(bytes = output.stdout.len(), "ffmpeg conversion complete");
        Ok(PcmStream::new(output.stdout, asset))
    }
}
