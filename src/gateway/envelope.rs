//! Inbound frame normalization
//!
//! The gateway speaks a loosely-shaped JSON protocol: several tag aliases
//! for the same semantic event, and payload text under either `content` or
//! `text`. Everything is normalized here into a closed variant set before
//! any state-machine logic runs.

use serde_json::Value;

/// One normalized inbound protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEnvelope {
    /// Handshake acknowledged; the session is live
    Connected,
    /// The agent started working on a reply
    ChatStart,
    /// A streamed fragment of the reply (may carry no text)
    ChatDelta(Option<String>),
    /// The reply finished; an attached text replaces the streamed buffer
    ChatEnd(Option<String>),
    /// Upstream agent error with a user-visible message
    ErrorNotice(String),
    /// Recognized as a frame but not a tag we know; ignored for
    /// forward-compatibility. Carries the tag for logging.
    Other(String),
}

impl InboundEnvelope {
    /// Parse a raw text frame. `None` means the frame was malformed and
    /// must be dropped (never a state change, never fatal).
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }

    /// Normalize an already-parsed JSON value
    pub fn from_value(value: &Value) -> Option<Self> {
        let tag = value.get("type")?.as_str()?;

        let envelope = match tag {
            "connected" => Self::Connected,
            "chat.start" | "thinking" => Self::ChatStart,
            "chat.stream" | "chat.delta" => Self::ChatDelta(message_text(value)),
            "chat.end" | "chat" => Self::ChatEnd(message_text(value)),
            "error" => Self::ErrorNotice(
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Error")
                    .to_string(),
            ),
            other => Self::Other(other.to_string()),
        };
        Some(envelope)
    }
}

/// Reply text lives under `content` on newer gateways and `text` on older
/// ones
fn message_text(value: &Value) -> Option<String> {
    value
        .get("content")
        .or_else(|| value.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected() {
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"connected"}"#),
            Some(InboundEnvelope::Connected)
        );
    }

    #[test]
    fn test_chat_start_aliases() {
        for raw in [r#"{"type":"chat.start"}"#, r#"{"type":"thinking"}"#] {
            assert_eq!(InboundEnvelope::parse(raw), Some(InboundEnvelope::ChatStart));
        }
    }

    #[test]
    fn test_delta_field_aliases() {
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"chat.delta","content":"Hel"}"#),
            Some(InboundEnvelope::ChatDelta(Some("Hel".to_string())))
        );
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"chat.stream","text":"lo"}"#),
            Some(InboundEnvelope::ChatDelta(Some("lo".to_string())))
        );
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"chat.delta"}"#),
            Some(InboundEnvelope::ChatDelta(None))
        );
    }

    #[test]
    fn test_end_aliases() {
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"chat.end","content":"done"}"#),
            Some(InboundEnvelope::ChatEnd(Some("done".to_string())))
        );
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"chat","text":"done"}"#),
            Some(InboundEnvelope::ChatEnd(Some("done".to_string())))
        );
    }

    #[test]
    fn test_error_message_default() {
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"error","message":"boom"}"#),
            Some(InboundEnvelope::ErrorNotice("boom".to_string()))
        );
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"error"}"#),
            Some(InboundEnvelope::ErrorNotice("Error".to_string()))
        );
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(
            InboundEnvelope::parse(r#"{"type":"presence.ping","content":"x"}"#),
            Some(InboundEnvelope::Other("presence.ping".to_string()))
        );
    }

    #[test]
    fn test_malformed_frames_dropped() {
        assert_eq!(InboundEnvelope::parse("not json"), None);
        assert_eq!(InboundEnvelope::parse(r#"{"no_type":true}"#), None);
        assert_eq!(InboundEnvelope::parse(r#"{"type":42}"#), None);
        assert_eq!(InboundEnvelope::parse("[1,2,3]"), None);
    }
}
