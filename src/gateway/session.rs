//! Gateway session
//!
//! Owns the exclusive transport handle and the single pending reconnect
//! delay. Every teardown path funnels through this entity, which is what
//! makes "at most one live transport, at most one pending reconnect"
//! checkable in one place.

use std::pin::Pin;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::time::Sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Flat reconnect interval after a transport close, no backoff or jitter
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsWriter = SplitSink<WsStream, Message>;
pub type WsReader = SplitStream<WsStream>;

/// Connection session state owned by the gateway client task
pub struct Session {
    pub token: Option<String>,
    pub session_id: String,
    pub reconnect_attempts: u32,
    transport: Option<WsWriter>,
    reconnect_delay: Option<Pin<Box<Sleep>>>,
}

impl Session {
    pub fn new(token: Option<String>, session_id: String) -> Self {
        Self {
            token,
            session_id,
            reconnect_attempts: 0,
            transport: None,
            reconnect_delay: None,
        }
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Install a fresh write half. The previous handle, if any, is closed
    /// first so at most one live transport exists per session.
    pub async fn install_transport(&mut self, writer: WsWriter) {
        self.close_transport().await;
        self.transport = Some(writer);
    }

    pub fn transport_mut(&mut self) -> Option<&mut WsWriter> {
        self.transport.as_mut()
    }

    /// Close and drop the current transport handle
    pub async fn close_transport(&mut self) {
        if let Some(mut writer) = self.transport.take() {
            if let Err(e) = writer.close().await {
                debug!("Transport close: {}", e);
            }
        }
    }

    /// Arm the reconnect delay. Arming replaces any pending delay instead
    /// of stacking a second one.
    pub fn arm_reconnect(&mut self) {
        self.reconnect_delay = Some(Box::pin(tokio::time::sleep(RECONNECT_DELAY)));
    }

    pub fn disarm_reconnect(&mut self) {
        self.reconnect_delay = None;
    }

    pub fn reconnect_armed(&self) -> bool {
        self.reconnect_delay.is_some()
    }

    /// Delay slot for the select loop
    pub fn reconnect_slot(&mut self) -> &mut Option<Pin<Box<Sleep>>> {
        &mut self.reconnect_delay
    }

    /// Scoped teardown: cancel the pending delay and close the transport.
    /// Runs on every exit path of the client task.
    pub async fn teardown(&mut self) {
        self.disarm_reconnect();
        self.close_transport().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arming_replaces_pending_delay() {
        let mut session = Session::new(Some("t".to_string()), "main".to_string());
        assert!(!session.reconnect_armed());

        session.arm_reconnect();
        assert!(session.reconnect_armed());

        // A second close re-arms the same slot; there is still exactly one
        session.arm_reconnect();
        assert!(session.reconnect_armed());

        session.disarm_reconnect();
        assert!(!session.reconnect_armed());
    }

    #[tokio::test]
    async fn test_teardown_clears_everything() {
        let mut session = Session::new(None, "main".to_string());
        session.arm_reconnect();
        session.teardown().await;
        assert!(!session.reconnect_armed());
        assert!(!session.has_transport());
    }
}
