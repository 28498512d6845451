use voxprobe_core::{StreamError, TranscriptEvent};

/// Marker that precedes the JSON payload of a transcript message.
pub const TRANSCRIPTION_PREFIX: &str = "transcription:";

/// Extract a transcript event from an inbound text message.
///
/// Messages without `prefix` are not transcript envelopes and yield `Ok(None)`.
/// A prefixed message whose remainder is not a JSON object with a `type`
/// field is a protocol violation.
pub fn parse_envelope(text: &str, prefix: &str) -> Result<Option<TranscriptEvent>, StreamError> {
    let Some(payload) = text.strip_prefix(prefix) else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| StreamError::Protocol(format!("{e} in {payload:?}")))?;
    if !value.is_object() {
        return Err(StreamError::Protocol(format!(
            "expected a JSON object, got {payload:?}"
        )));
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| StreamError::Protocol(format!("{e} in {payload:?}")))
}
