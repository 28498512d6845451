use crate::envelope::parse_envelope;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use voxprobe_core::config::MatcherConfig;
use voxprobe_core::{ExpectedPhrases, ScenarioError, StreamError, Verdict};

/// Listening state. Everything except `Waiting` is terminal.
#[derive(Debug)]
pub enum MatchState {
    Waiting,
    Matched(String),
    TimedOut,
    Errored(StreamError),
}

impl MatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MatchState::Waiting)
    }
}

/// Consumes inbound messages until a final transcript arrives or the
/// overall deadline passes.
pub struct ResponseMatcher {
    prefix: String,
    expected: ExpectedPhrases,
    receive_timeout: Duration,
    overall_timeout: Duration,
}

impl ResponseMatcher {
    pub fn new(
        prefix: &str,
        expected: ExpectedPhrases,
        receive_timeout: Duration,
        overall_timeout: Duration,
    ) -> Self {
        Self {
            prefix: prefix.to_string(),
            expected,
            receive_timeout,
            overall_timeout,
        }
    }

    pub fn from_config(config: &MatcherConfig) -> Self {
        Self::new(
            &config.prefix,
            config.expected_phrases(),
            config.receive_timeout(),
            config.overall_timeout(),
        )
    }

    pub fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }

    /// Transition for a single inbound message.
    pub fn on_message(&self, msg: Message) -> MatchState {
        match msg {
            Message::Text(text) => {
                tracing::debug!("received: {}", text.as_str());
                match parse_envelope(text.as_str(), &self.prefix) {
                    Ok(Some(event)) if event.is_final() => {
                        tracing::info!("final transcription received: '{}'", event.text);
                        MatchState::Matched(event.text)
                    }
                    Ok(Some(event)) => {
                        tracing::debug!(kind = ?event.kind, "intermediate transcript: '{}'", event.text);
                        MatchState::Waiting
                    }
                    Ok(None) => MatchState::Waiting,
                    Err(e) => MatchState::Errored(e),
                }
            }
            Message::Close(frame) => {
                let reason = frame
                    .map(|f| format!("{} {}", f.code, f.reason.as_str()))
                    .unwrap_or_else(|| "no close frame".to_string());
                MatchState::Errored(StreamError::Transport(format!(
                    "connection closed by server ({reason})"
                )))
            }
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                MatchState::Waiting
            }
        }
    }

    /// Listen until a terminal state. The overall deadline starts now, so
    /// when run alongside the driver it also covers the streaming time.
    pub async fn run<R>(&self, stream: &mut R) -> MatchState
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let deadline = Instant::now() + self.overall_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(
                    "no final transcription within {:?}",
                    self.overall_timeout
                );
                return MatchState::TimedOut;
            }

            let wait = remaining.min(self.receive_timeout);
            let state = match tokio::time::timeout(wait, stream.next()).await {
                Err(_) => {
                    tracing::debug!("no message within {wait:?}, still waiting");
                    continue;
                }
                Ok(None) => MatchState::Errored(StreamError::Transport(
                    "connection ended before a final transcript".to_string(),
                )),
                Ok(Some(Err(e))) => MatchState::Errored(StreamError::Transport(e.to_string())),
                Ok(Some(Ok(msg))) => self.on_message(msg),
            };

            if state.is_terminal() {
                return state;
            }
        }
    }

    /// Evaluate a terminal state against the expected phrases.
    pub fn verdict(&self, state: MatchState) -> Verdict {
        match state {
            MatchState::Matched(transcript) => {
                if self.expected.matches(&transcript) {
                    Verdict::Success { transcript }
                } else {
                    Verdict::from(ScenarioError::ContentMismatch {
                        transcript,
                        expected: self.expected.phrases().to_vec(),
                    })
                }
            }
            MatchState::Waiting | MatchState::TimedOut => Verdict::from(ScenarioError::from(
                StreamError::OverallTimeout(self.overall_timeout),
            )),
            MatchState::Errored(e) => Verdict::from(ScenarioError::from(e)),
        }
    }

    pub async fn await_verdict<R>(&self, stream: &mut R) -> Verdict
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let state = self.run(stream).await;
        self.verdict(state)
    }
}

impl Default for ResponseMatcher {
    fn default() -> Self {
        Self::from_config(&MatcherConfig::default())
    }
}
