use std::time::Duration;
use voxprobe_core::AudioAsset;

/// Frame size used when streaming to the transcription service.
pub const DEFAULT_CHUNK_SIZE: usize = 32768;

/// Buffered raw PCM audio (signed little-endian samples, interleaved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmStream {
    data: Vec<u8>,
    bytes_per_second: usize,
}

impl PcmStream {
    pub fn new(data: Vec<u8>, asset: &AudioAsset) -> Self {
        Self {
            data,
            bytes_per_second: asset.bytes_per_second(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_second
    }

    pub fn duration(&self) -> Duration {
        if self.bytes_per_second == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.data.len() as f64 / self.bytes_per_second as f64)
    }

    /// Fixed-size frames in source order. Only the last frame may be short;
    /// an empty stream yields no frames.
    pub fn frames(&self, chunk_size: usize) -> std::slice::Chunks<'_, u8> {
        self.data.chunks(chunk_size.max(1))
    }

    pub fn frame_count(&self, chunk_size: usize) -> usize {
        self.data.len().div_ceil(chunk_size.max(1))
    }

    /// Zero-valued samples covering `seconds` of audio in this stream's format.
    pub fn silence_tail(&self, seconds: u32) -> Vec<u8> {
        vec![0u8; self.bytes_per_second * seconds as usize]
    }
}
