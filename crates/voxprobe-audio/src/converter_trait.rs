use crate::pcm::PcmStream;
use async_trait::async_trait;
use voxprobe_core::{AudioAsset, AudioError};

/// Turns a source audio file into canonical PCM for streaming.
///
/// Implementations are registered via [`ConverterRegistry`](crate::ConverterRegistry)
/// so alternate decoding strategies can be swapped in by name.
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Returns the converter's registry name (e.g. `"ffmpeg"`, `"raw"`).
    fn name(&self) -> &str;
    /// One-time initialisation with converter-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), AudioError>;
    /// Convert the asset's source file into a fully buffered PCM stream.
    async fn convert(&self, asset: &AudioAsset) -> Result<PcmStream, AudioError>;
}
