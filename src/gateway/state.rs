//! Presence state machine
//!
//! The synchronous core of the connection component: transport and protocol
//! events go in, a single discrete presence state comes out. The async
//! client owns a socket and feeds this machine; keeping the machine
//! transport-free makes the full transition table unit-testable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::envelope::InboundEnvelope;

/// Discrete, externally observable behavioral mode of the face.
/// Exactly one value is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    /// Initial state, and re-entry point after any transport failure
    #[default]
    Disconnected,
    /// Transport dialing / handshake sent, waiting for acknowledgement
    Connecting,
    /// Handshake acknowledged (transitional; the machine settles in Idle)
    Connected,
    /// Session live, nothing in flight
    Idle,
    /// The agent is working on a reply
    Thinking,
    /// Reply text is streaming in
    Speaking,
    /// A user message was sent; waiting for the agent to react
    Listening,
    /// Configuration, transport or upstream error
    Error,
}

impl PresenceState {
    /// States in which the session is usable for outbound sends
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Disconnected | Self::Connecting | Self::Error)
    }
}

/// An observed state change (from != to always holds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PresenceState,
    pub to: PresenceState,
}

/// Status message shown when the auth token is absent
pub const MISSING_TOKEN_MESSAGE: &str = "Missing token. Pass --token or set gateway.token";

/// Connection state machine core
#[derive(Debug, Default)]
pub struct StateMachine {
    state: PresenceState,
    status: String,
    response: String,
    terminal_error: bool,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// User-visible status line
    pub fn status_message(&self) -> &str {
        &self.status
    }

    /// Accumulated (or final) reply text
    pub fn response_text(&self) -> &str {
        &self.response
    }

    /// A configuration error with no auto-retry; cleared by a connect
    /// attempt with valid auth
    pub fn is_terminal_error(&self) -> bool {
        self.terminal_error
    }

    /// A connect attempt begins. Without auth this is a terminal error;
    /// with auth the machine enters Connecting and stays there until the
    /// `connected` envelope arrives.
    pub fn begin_connect(&mut self, has_token: bool) -> Option<Transition> {
        if !has_token {
            self.terminal_error = true;
            return self.enter(PresenceState::Error, MISSING_TOKEN_MESSAGE);
        }
        self.terminal_error = false;
        self.enter(PresenceState::Connecting, "Connecting...")
    }

    /// Apply one inbound envelope. Envelopes are applied regardless of the
    /// current state: a `connected` or `chat.*` frame recovers an Error
    /// state, and unknown tags never change anything.
    pub fn handle_envelope(&mut self, envelope: &InboundEnvelope) -> Option<Transition> {
        match envelope {
            InboundEnvelope::Connected => self.enter(PresenceState::Idle, "Connected"),
            InboundEnvelope::ChatStart => self.enter(PresenceState::Thinking, "Thinking..."),
            InboundEnvelope::ChatDelta(text) => {
                if let Some(text) = text {
                    self.response.push_str(text);
                }
                self.enter_keep_status(PresenceState::Speaking)
            }
            InboundEnvelope::ChatEnd(text) => {
                // Final text replaces whatever streamed in
                if let Some(text) = text {
                    self.response = text.clone();
                }
                self.enter(PresenceState::Idle, "")
            }
            InboundEnvelope::ErrorNotice(message) => {
                let message = message.clone();
                self.enter(PresenceState::Error, &message)
            }
            InboundEnvelope::Other(tag) => {
                debug!("Ignoring unrecognized envelope tag '{}'", tag);
                None
            }
        }
    }

    /// An outbound message was accepted by the live transport: listen
    /// optimistically and clear the previous reply.
    pub fn note_send(&mut self) -> Option<Transition> {
        self.response.clear();
        self.enter_keep_status(PresenceState::Listening)
    }

    /// The transport errored (dial failure, socket error)
    pub fn transport_error(&mut self, message: &str) -> Option<Transition> {
        let message = message.to_string();
        self.enter(PresenceState::Error, &message)
    }

    /// The transport closed; the owner schedules the reconnect
    pub fn transport_closed(&mut self) -> Option<Transition> {
        self.enter(PresenceState::Disconnected, "Disconnected")
    }

    fn enter(&mut self, next: PresenceState, status: &str) -> Option<Transition> {
        self.status = status.to_string();
        self.enter_keep_status(next)
    }

    fn enter_keep_status(&mut self, next: PresenceState) -> Option<Transition> {
        if self.state == next {
            return None;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        debug!("Presence {:?} -> {:?}", transition.from, transition.to);
        self.state = next;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(raw: &str) -> InboundEnvelope {
        InboundEnvelope::parse(raw).unwrap()
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), PresenceState::Disconnected);
        assert_eq!(machine.response_text(), "");
    }

    #[test]
    fn test_connect_without_token_is_terminal_error() {
        let mut machine = StateMachine::new();
        let transition = machine.begin_connect(false).unwrap();
        assert_eq!(transition.to, PresenceState::Error);
        assert_eq!(machine.status_message(), MISSING_TOKEN_MESSAGE);
        assert!(machine.is_terminal_error());

        // Reconfiguring with a token clears the terminal flag
        machine.begin_connect(true);
        assert_eq!(machine.state(), PresenceState::Connecting);
        assert!(!machine.is_terminal_error());
    }

    #[test]
    fn test_full_chat_roundtrip() {
        let mut machine = StateMachine::new();
        machine.begin_connect(true);

        machine.handle_envelope(&env(r#"{"type":"connected"}"#));
        assert_eq!(machine.state(), PresenceState::Idle);

        machine.handle_envelope(&env(r#"{"type":"chat.start"}"#));
        assert_eq!(machine.state(), PresenceState::Thinking);

        machine.handle_envelope(&env(r#"{"type":"chat.delta","content":"Hel"}"#));
        machine.handle_envelope(&env(r#"{"type":"chat.delta","content":"lo"}"#));
        assert_eq!(machine.state(), PresenceState::Speaking);
        assert_eq!(machine.response_text(), "Hello");

        machine.handle_envelope(&env(r#"{"type":"chat.end","content":"Hello there"}"#));
        assert_eq!(machine.state(), PresenceState::Idle);
        // End replaces, never appends
        assert_eq!(machine.response_text(), "Hello there");
    }

    #[test]
    fn test_end_without_text_keeps_streamed_buffer() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"chat.delta","text":"partial"}"#));
        machine.handle_envelope(&env(r#"{"type":"chat.end"}"#));
        assert_eq!(machine.state(), PresenceState::Idle);
        assert_eq!(machine.response_text(), "partial");
    }

    #[test]
    fn test_send_listens_and_clears_buffer() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"connected"}"#));
        machine.handle_envelope(&env(r#"{"type":"chat.delta","content":"old"}"#));

        let transition = machine.note_send().unwrap();
        assert_eq!(transition.to, PresenceState::Listening);
        assert_eq!(machine.response_text(), "");
    }

    #[test]
    fn test_error_envelope_recoverable_by_chat() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"connected"}"#));
        machine.handle_envelope(&env(r#"{"type":"error","message":"agent crashed"}"#));
        assert_eq!(machine.state(), PresenceState::Error);
        assert_eq!(machine.status_message(), "agent crashed");
        assert!(!machine.is_terminal_error());

        machine.handle_envelope(&env(r#"{"type":"chat.start"}"#));
        assert_eq!(machine.state(), PresenceState::Thinking);
    }

    #[test]
    fn test_unknown_tags_change_nothing() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"connected"}"#));
        let before = machine.state();
        assert!(machine
            .handle_envelope(&env(r#"{"type":"totally.new.tag"}"#))
            .is_none());
        assert_eq!(machine.state(), before);
    }

    #[test]
    fn test_transport_close_from_any_state() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"connected"}"#));
        machine.handle_envelope(&env(r#"{"type":"chat.start"}"#));

        let transition = machine.transport_closed().unwrap();
        assert_eq!(transition.from, PresenceState::Thinking);
        assert_eq!(transition.to, PresenceState::Disconnected);
    }

    #[test]
    fn test_no_transition_when_state_repeats() {
        let mut machine = StateMachine::new();
        machine.handle_envelope(&env(r#"{"type":"chat.delta","content":"a"}"#));
        // Second delta keeps Speaking: buffer grows, no transition
        let second = machine.handle_envelope(&env(r#"{"type":"chat.delta","content":"b"}"#));
        assert!(second.is_none());
        assert_eq!(machine.response_text(), "ab");
    }
}
