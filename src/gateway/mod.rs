//! Connection State Machine
//!
//! Turns the unreliable bidirectional gateway stream into a small set of
//! discrete, UI-consumable presence states with automatic reconnection.
//! The synchronous transition core lives in [`state`]; the async transport
//! task in [`client`] owns the socket and the session lifecycle.

pub mod client;
pub mod envelope;
pub mod session;
pub mod state;

pub use client::{GatewayClient, GatewaySettings, PresenceSnapshot};
pub use envelope::InboundEnvelope;
pub use session::{Session, RECONNECT_DELAY};
pub use state::{PresenceState, StateMachine, Transition, MISSING_TOKEN_MESSAGE};
