pub mod converter_trait;
pub mod ffmpeg_converter;
pub mod pcm;
pub mod raw_converter;
pub mod registry;

pub use converter_trait::AudioConverter;
pub use ffmpeg_converter::FfmpegConverter;
pub use pcm::{PcmStream, DEFAULT_CHUNK_SIZE};
pub use raw_converter::RawConverter;
pub use registry::ConverterRegistry;

use voxprobe_core::{AudioAsset, AudioError};

/// Check the asset exists, then convert it to canonical PCM.
pub async fn normalize(
    converter: &dyn AudioConverter,
    asset: &AudioAsset,
) -> Result<PcmStream, AudioError> {
    asset.ensure_exists()?;
    let pcm = converter.convert(asset).await?;
    tracing::info!(
        converter = converter.name(),
        "normalized {} bytes of PCM ({:.2}s)",
        pcm.len(),
        pcm.duration().as_secs_f64(),
    );
    Ok(pcm)
}
