use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use voxprobe_audio::PcmStream;
use voxprobe_core::{AppConfig, AudioAsset, Verdict};
use voxprobe_stream::{StreamSession, CLOSE_TIMEOUT};

/// What the fake service does once a connection is accepted.
#[derive(Clone, Copy)]
enum Behavior {
    /// Partials while audio arrives, final once the silence tail lands.
    FinalAfterSilence(&'static str),
    /// Final right after the first audio frame.
    FinalImmediately(&'static str),
    /// Only partials, never a final.
    PartialsOnly,
    /// A prefixed message that is not JSON.
    Malformed,
    /// Close the connection after the first frame.
    CloseEarly,
}

struct FakeService {
    url: String,
    received_bytes: Arc<AtomicUsize>,
}

async fn spawn_service(behavior: Behavior) -> FakeService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received_bytes = Arc::new(AtomicUsize::new(0));
    let counter = received_bytes.clone();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            let Message::Binary(data) = msg else {
                continue;
            };
            counter.fetch_add(data.len(), Ordering::SeqCst);
            let is_silence = data.iter().all(|b| *b == 0);

            let reply = match behavior {
                Behavior::FinalAfterSilence(text) if is_silence => {
                    Some(format!(r#"transcription:{{"type":"final","text":"{text}"}}"#))
                }
                Behavior::FinalAfterSilence(_) | Behavior::PartialsOnly => {
                    Some(r#"transcription:{"type":"partial","text":"hel"}"#.to_string())
                }
                Behavior::FinalImmediately(text) => {
                    Some(format!(r#"transcription:{{"type":"final","text":"{text}"}}"#))
                }
                Behavior::Malformed => Some("transcription:{definitely not json".to_string()),
                Behavior::CloseEarly => {
                    let _ = ws.close(None).await;
                    None
                }
            };

            match reply {
                Some(text) => {
                    if ws.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    });

    FakeService {
        url: format!("ws://{addr}/ws/transcribe"),
        received_bytes,
    }
}

fn quick_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.stream.pacing_ms = 1;
    config.matcher.receive_timeout_ms = 50;
    config.matcher.overall_timeout_ms = 1500;
    config
}

fn speech_pcm(len: usize) -> PcmStream {
    let data = (0..len).map(|i| (i % 250 + 1) as u8).collect();
    PcmStream::new(data, &AudioAsset::new("hello_world.mp3"))
}

#[tokio::test]
async fn test_session_success_after_silence_tail() {
    let service = spawn_service(Behavior::FinalAfterSilence("Hello world.")).await;
    let pcm = speech_pcm(32768 * 3 + 100);

    let verdict = StreamSession::from_config(&quick_config())
        .run(&service.url, &pcm)
        .await;

    match &verdict {
        Verdict::Success { transcript } => assert_eq!(transcript, "Hello world."),
        other => panic!("expected Success, got {other:?}"),
    }
    assert_eq!(
        service.received_bytes.load(Ordering::SeqCst),
        pcm.len() + 96_000
    );
}

#[tokio::test]
async fn test_session_final_mid_stream_wins() {
    let service = spawn_service(Behavior::FinalImmediately("hello")).await;
    let mut config = quick_config();
    config.stream.pacing_ms = 20;
    let pcm = speech_pcm(32768 * 40);

    let verdict = StreamSession::from_config(&config).run(&service.url, &pcm).await;

    assert!(verdict.is_success(), "{}", verdict.summary());
    assert!(service.received_bytes.load(Ordering::SeqCst) < pcm.len());
}

#[tokio::test]
async fn test_session_content_mismatch() {
    let service = spawn_service(Behavior::FinalAfterSilence("goodbye")).await;

    let verdict = StreamSession::from_config(&quick_config())
        .run(&service.url, &speech_pcm(5000))
        .await;

    match &verdict {
        Verdict::ContentMismatch { transcript } => assert_eq!(transcript, "goodbye"),
        other => panic!("expected ContentMismatch, got {other:?}"),
    }
    assert_eq!(verdict.exit_code(), 1);
}

#[tokio::test]
async fn test_session_partials_only_times_out() {
    let service = spawn_service(Behavior::PartialsOnly).await;

    let verdict = StreamSession::from_config(&quick_config())
        .run(&service.url, &speech_pcm(5000))
        .await;

    match &verdict {
        Verdict::Timeout(e) => assert_eq!(e.category(), "OverallTimeout"),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_malformed_envelope_is_protocol_error() {
    let service = spawn_service(Behavior::Malformed).await;

    let verdict = StreamSession::from_config(&quick_config())
        .run(&service.url, &speech_pcm(5000))
        .await;

    match &verdict {
        Verdict::ConnectionError(e) => assert_eq!(e.category(), "ProtocolError"),
        other => panic!("expected ConnectionError, got {other:?}"),
    }
    assert!(verdict.summary().starts_with("FAIL [ProtocolError]"));
}

#[tokio::test]
async fn test_session_server_close_is_transport_error() {
    let service = spawn_service(Behavior::CloseEarly).await;

    let verdict = StreamSession::from_config(&quick_config())
        .run(&service.url, &speech_pcm(32768 * 4))
        .await;

    match &verdict {
        Verdict::ConnectionError(e) => assert_eq!(e.category(), "TransportError"),
        other => panic!("expected ConnectionError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let verdict = StreamSession::from_config(&quick_config())
        .run(&format!("ws://{addr}/ws/transcribe"), &speech_pcm(10))
        .await;

    assert!(matches!(verdict, Verdict::ConnectionError(_)));
    assert_eq!(verdict.exit_code(), 1);
}

/// Accepts the handshake, then never reads another byte.
async fn spawn_stalled_service() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(ws);
    });

    format!("ws://{addr}/ws/transcribe")
}

#[tokio::test]
async fn test_session_returns_when_service_stops_reading() {
    let url = spawn_stalled_service().await;
    let mut config = quick_config();
    config.stream.pacing_ms = 0;
    config.matcher.overall_timeout_ms = 1000;
    // far more than the socket buffers can absorb
    let pcm = speech_pcm(64 * 1024 * 1024);

    let started = Instant::now();
    let verdict = tokio::time::timeout(
        Duration::from_secs(10),
        StreamSession::from_config(&config).run(&url, &pcm),
    )
    .await
    .expect("session must return after the overall deadline");

    match &verdict {
        Verdict::Timeout(e) => assert_eq!(e.category(), "OverallTimeout"),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(1) + CLOSE_TIMEOUT + Duration::from_secs(2));
}
