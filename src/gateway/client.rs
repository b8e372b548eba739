//! Gateway transport client
//!
//! Owns the WebSocket and the state machine, processing commands, inbound
//! frames and the reconnect delay in a single task so envelopes are always
//! handled to completion in arrival order. Only discrete presence
//! snapshots and transitions cross the component boundary.

use std::pin::Pin;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use super::envelope::InboundEnvelope;
use super::session::{Session, WsReader};
use super::state::{PresenceState, StateMachine, Transition};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings resolved from config + CLI
#[derive(Debug, Clone, Default)]
pub struct GatewaySettings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub session: String,
}

/// Latest externally visible connection state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceSnapshot {
    pub state: PresenceState,
    pub status: String,
    pub response: String,
    pub reconnect_attempts: u32,
}

#[derive(Debug)]
enum Command {
    Send(String),
    Reconnect,
    Shutdown,
}

enum Event {
    Cmd(Option<Command>),
    Frame(Option<Result<Message, WsError>>),
    ReconnectDue,
}

/// Handle to the gateway client task
pub struct GatewayClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<PresenceSnapshot>,
    task: JoinHandle<()>,
}

impl GatewayClient {
    /// Spawn the client task and begin connecting. Returns the handle plus
    /// the transition feed (every state change, never coalesced) consumed
    /// by the mood engine.
    pub fn spawn(settings: GatewaySettings) -> (Self, mpsc::UnboundedReceiver<Transition>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PresenceSnapshot::default());
        let (transition_tx, transition_rx) = mpsc::unbounded_channel();

        let session = Session::new(settings.token.clone(), settings.session.clone());
        let task = ClientTask {
            settings,
            machine: StateMachine::new(),
            session,
            reader: None,
            snapshot_tx,
            transition_tx,
        };
        let task = tokio::spawn(task.run(cmd_rx));

        (
            Self {
                cmd_tx,
                snapshot_rx,
                task,
            },
            transition_rx,
        )
    }

    /// Transmit a user message. Silently dropped when no live transport
    /// exists; there is no queueing.
    pub fn send(&self, content: impl Into<String>) {
        let _ = self.cmd_tx.send(Command::Send(content.into()));
    }

    /// Tear down the current session and dial again
    pub fn reconnect(&self) {
        let _ = self.cmd_tx.send(Command::Reconnect);
    }

    pub fn subscribe(&self) -> watch::Receiver<PresenceSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Graceful shutdown: timers cancelled, transport closed
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

struct ClientTask {
    settings: GatewaySettings,
    machine: StateMachine,
    session: Session,
    reader: Option<WsReader>,
    snapshot_tx: watch::Sender<PresenceSnapshot>,
    transition_tx: mpsc::UnboundedSender<Transition>,
}

impl ClientTask {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        self.connect().await;

        loop {
            let reader_live = self.reader.is_some();
            let reconnect_armed = self.session.reconnect_armed();

            let event = tokio::select! {
                cmd = cmd_rx.recv() => Event::Cmd(cmd),
                frame = next_frame(&mut self.reader), if reader_live => Event::Frame(frame),
                () = delay_elapsed(self.session.reconnect_slot()), if reconnect_armed => {
                    Event::ReconnectDue
                }
            };

            match event {
                Event::Cmd(None) | Event::Cmd(Some(Command::Shutdown)) => break,
                Event::Cmd(Some(Command::Send(content))) => self.handle_send(content).await,
                Event::Cmd(Some(Command::Reconnect)) => {
                    self.session.teardown().await;
                    self.reader = None;
                    self.connect().await;
                }
                Event::Frame(Some(Ok(Message::Text(text)))) => self.handle_text(&text),
                Event::Frame(Some(Ok(Message::Close(_)))) | Event::Frame(None) => {
                    self.handle_close().await;
                }
                Event::Frame(Some(Ok(_))) => {} // ping/pong/binary: transport noise
                Event::Frame(Some(Err(e))) => {
                    self.apply(|m| m.transport_error("Connection error"));
                    warn!("Transport error: {}", e);
                    self.handle_close().await;
                }
                Event::ReconnectDue => {
                    self.session.disarm_reconnect();
                    self.connect().await;
                }
            }
        }

        // Guaranteed teardown on every exit path
        self.session.teardown().await;
        self.reader = None;
        debug!("Gateway client task exited");
    }

    /// Establish (or re-establish) the session
    async fn connect(&mut self) {
        let Some(url) = self.settings.url.clone() else {
            warn!("No gateway URL configured; staying disconnected");
            self.publish();
            return;
        };

        let has_token = self.session.token.is_some();
        self.apply(|m| m.begin_connect(has_token));
        if self.machine.is_terminal_error() {
            // Requires reconfiguration; no retry loop
            return;
        }

        self.session.reconnect_attempts += 1;
        match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url.as_str())).await {
            Ok(Ok((ws, _response))) => {
                let (writer, reader) = ws.split();
                self.session.install_transport(writer).await;
                self.reader = Some(reader);

                if let Err(e) = self.send_handshake().await {
                    warn!("Handshake failed: {}", e);
                    self.apply(|m| m.transport_error("Connection error"));
                    self.handle_close().await;
                    return;
                }
                info!("Transport open to {}; awaiting connected envelope", url);
            }
            Ok(Err(e)) => {
                warn!("Failed to connect: {}", e);
                self.apply(|m| m.transport_error("Connection error"));
                self.handle_close().await;
            }
            Err(_) => {
                warn!("Connect attempt timed out");
                self.apply(|m| m.transport_error("Connection error"));
                self.handle_close().await;
            }
        }
    }

    async fn send_handshake(&mut self) -> Result<(), WsError> {
        let frame = json!({
            "type": "connect",
            "token": self.session.token.clone().unwrap_or_default(),
            "session": self.session.session_id,
        })
        .to_string();
        self.transport_send(frame).await
    }

    async fn handle_send(&mut self, content: String) {
        if !self.session.has_transport() {
            debug!("Dropping outbound message: no live transport");
            return;
        }

        // Optimistic: listen before the frame is even on the wire
        self.apply(|m| m.note_send());

        let frame = json!({"type": "chat.send", "content": content}).to_string();
        if let Err(e) = self.transport_send(frame).await {
            warn!("Send failed: {}", e);
            self.apply(|m| m.transport_error("Connection error"));
            self.handle_close().await;
        }
    }

    async fn transport_send(&mut self, frame: String) -> Result<(), WsError> {
        match self.session.transport_mut() {
            Some(writer) => writer.send(Message::Text(frame)).await,
            None => Ok(()),
        }
    }

    fn handle_text(&mut self, raw: &str) {
        match InboundEnvelope::parse(raw) {
            Some(envelope) => {
                if envelope == InboundEnvelope::Connected {
                    self.session.reconnect_attempts = 0;
                }
                self.apply(|m| m.handle_envelope(&envelope));
            }
            None => {
                let preview: String = raw.chars().take(120).collect();
                warn!("Dropping malformed frame: {}", preview);
            }
        }
    }

    /// Transport gone: close the handle, enter Disconnected, arm the flat
    /// reconnect delay (replacing, never stacking).
    async fn handle_close(&mut self) {
        self.session.close_transport().await;
        self.reader = None;
        self.apply(|m| m.transport_closed());
        if !self.machine.is_terminal_error() {
            self.session.arm_reconnect();
        }
    }

    fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(&mut StateMachine) -> Option<Transition>,
    {
        if let Some(transition) = f(&mut self.machine) {
            let _ = self.transition_tx.send(transition);
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = PresenceSnapshot {
            state: self.machine.state(),
            status: self.machine.status_message().to_string(),
            response: self.machine.response_text().to_string(),
            reconnect_attempts: self.session.reconnect_attempts,
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

async fn next_frame(reader: &mut Option<WsReader>) -> Option<Result<Message, WsError>> {
    match reader.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn delay_elapsed(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot.as_mut() {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::state::MISSING_TOKEN_MESSAGE;

    async fn wait_for_state(
        rx: &mut watch::Receiver<PresenceSnapshot>,
        wanted: PresenceState,
    ) -> PresenceSnapshot {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if rx.borrow().state == wanted {
                    return rx.borrow().clone();
                }
                rx.changed().await.ok();
            }
        })
        .await
        .unwrap_or_else(|_| panic!("never reached {wanted:?}"))
    }

    #[tokio::test]
    async fn test_no_url_stays_disconnected() {
        let (client, _transitions) = GatewayClient::spawn(GatewaySettings {
            url: None,
            token: Some("tok".to_string()),
            session: "main".to_string(),
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.snapshot().state, PresenceState::Disconnected);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_token_is_terminal_error() {
        let (client, _transitions) = GatewayClient::spawn(GatewaySettings {
            url: Some("ws://127.0.0.1:9".to_string()),
            token: None,
            session: "main".to_string(),
        });

        let mut rx = client.subscribe();
        let snapshot = wait_for_state(&mut rx, PresenceState::Error).await;
        assert_eq!(snapshot.status, MISSING_TOKEN_MESSAGE);
        // No dial attempt is made without auth
        assert_eq!(snapshot.reconnect_attempts, 0);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_without_transport_is_dropped() {
        let (client, mut transitions) = GatewayClient::spawn(GatewaySettings {
            url: None,
            token: Some("tok".to_string()),
            session: "main".to_string(),
        });

        client.send("hello");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.snapshot().state, PresenceState::Disconnected);
        assert!(transitions.try_recv().is_err());
        client.shutdown().await;
    }
}
