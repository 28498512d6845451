use crate::converter_trait::AudioConverter;
use crate::pcm::PcmStream;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use voxprobe_core::{AudioAsset, AudioError};

/// Passes through a source file that already holds canonical PCM.
pub struct RawConverter {
    convert_count: AtomicUsize,
}

impl RawConverter {
    pub fn new() -> Self {
        Self {
            convert_count: AtomicUsize::new(0),
        }
    }

    pub fn convert_count(&self) -> usize {
        self.convert_count.load(Ordering::Relaxed)
    }
}

impl Default for RawConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioConverter for RawConverter {
    fn name(&self) -> &str {
        "raw"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), AudioError> {
        Ok(())
    }

    async fn convert(&self, asset: &AudioAsset) -> Result<PcmStream, AudioError> {
        let data = tokio::fs::read(&asset.source_path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AudioError::FixtureMissing(asset.source_path.clone()),
            _ => AudioError::Io(e),
        })?;
        let count = self.convert_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("RawConverter read #{count}, {} bytes", data.len());
        Ok(PcmStream::new(data, asset))
    }
}
