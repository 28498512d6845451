use futures::{Sink, SinkExt};
use std::fmt::Display;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use voxprobe_audio::PcmStream;
use voxprobe_core::config::StreamConfig;
use voxprobe_core::StreamError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub frames: usize,
    pub audio_bytes: usize,
    pub silence_bytes: usize,
}

/// Writes PCM to the connection as paced binary frames, then a silence tail.
pub struct StreamDriver {
    chunk_size: usize,
    pacing: Duration,
    silence_secs: u32,
}

impl StreamDriver {
    pub fn new(chunk_size: usize, pacing: Duration, silence_secs: u32) -> Self {
        Self {
            chunk_size,
            pacing,
            silence_secs,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.chunk_size, config.pacing(), config.silence_secs)
    }

    pub async fn stream<S>(&self, sink: &mut S, pcm: &PcmStream) -> Result<DriverStats, StreamError>
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let mut stats = DriverStats::default();
        tracing::info!(
            "sending {} bytes of PCM audio in {} frames",
            pcm.len(),
            pcm.frame_count(self.chunk_size)
        );

        for frame in pcm.frames(self.chunk_size) {
            sink.send(Message::binary(frame.to_vec()))
                .await
                .map_err(|e| StreamError::Transport(format!("send failed: {e}")))?;
            stats.frames += 1;
            stats.audio_bytes += frame.len();
            tokio::time::sleep(self.pacing).await;
        }

        let silence = pcm.silence_tail(self.silence_secs);
        if !silence.is_empty() {
            stats.silence_bytes = silence.len();
            sink.send(Message::binary(silence))
                .await
                .map_err(|e| StreamError::Transport(format!("send failed: {e}")))?;
            tracing::info!("sent silence padding ({}s)", self.silence_secs);
        }

        Ok(stats)
    }
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}
