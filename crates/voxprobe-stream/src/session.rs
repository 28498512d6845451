use crate::driver::StreamDriver;
use crate::matcher::{MatchState, ResponseMatcher};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use voxprobe_audio::PcmStream;
use voxprobe_core::{AppConfig, ScenarioError, StreamError, Verdict};

/// Upper bound on the closing handshake once the verdict is known. A peer
/// that stopped reading would otherwise block the flush forever.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// One WebSocket connection: audio goes out while transcripts come in.
pub struct StreamSession {
    driver: StreamDriver,
    matcher: ResponseMatcher,
}

impl StreamSession {
    pub fn new(driver: StreamDriver, matcher: ResponseMatcher) -> Self {
        Self { driver, matcher }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            StreamDriver::from_config(&config.stream),
            ResponseMatcher::from_config(&config.matcher),
        )
    }

    /// Connect to `url`, stream `pcm` and wait for the final transcript.
    pub async fn run(&self, url: &str, pcm: &PcmStream) -> Verdict {
        tracing::info!("connecting to {url}");
        let ws = match tokio_tungstenite::connect_async(url).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                return Verdict::from(ScenarioError::from(StreamError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                }))
            }
        };
        tracing::info!("connected to {url}");

        let (mut sink, mut stream) = ws.split();
        let verdict = self.drive(&mut sink, &mut stream, pcm).await;

        match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("close after scenario: {e}"),
            Err(_) => tracing::debug!("close after scenario: gave up after {CLOSE_TIMEOUT:?}"),
        }
        verdict
    }

    /// Run the driver and the matcher concurrently over an established
    /// connection. The matcher decides the outcome; a driver failure ends
    /// the session early.
    pub async fn drive<S, R>(&self, sink: &mut S, stream: &mut R, pcm: &PcmStream) -> Verdict
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let send = self.driver.stream(sink, pcm);
        let listen = self.matcher.run(stream);
        tokio::pin!(send);
        tokio::pin!(listen);

        let mut sending = true;
        let state = loop {
            tokio::select! {
                result = &mut send, if sending => {
                    sending = false;
                    match result {
                        Ok(stats) => tracing::info!(
                            frames = stats.frames,
                            silence_bytes = stats.silence_bytes,
                            "audio streaming complete, waiting for transcription"
                        ),
                        Err(e) => {
                            tracing::error!("audio streaming failed: {e}");
                            break MatchState::Errored(e);
                        }
                    }
                }
                state = &mut listen => break state,
            }
        };

        self.matcher.verdict(state)
    }
}
