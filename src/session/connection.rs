//! Session handle and driver task
//!
//! `Session::connect` opens a transport and spawns a driver task that owns
//! it. The handle only queues outbound messages; everything the driver sees
//! comes back on the event receiver in arrival order.
//!
//! ```text
//!   Session::send ──► outbound queue ──┐
//!                                      ▼
//!                               ┌────────────┐  text   ┌───────────┐
//!   keepalive interval ───────► │   Driver   │ ◄─────► │ Transport │
//!                               └─────┬──────┘         └───────────┘
//!                                     │ parse_inbound
//!                                     ▼
//!            Opened, Inbound(..)*, Closed(reason) ──► event receiver
//! ```
//!
//! `Closed` is emitted exactly once. A session is never reopened; the
//! caller connects a new one if it wants to.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::TransportError;
use crate::store::CameraId;

use super::config::SessionConfig;
use super::message::{parse_inbound, InboundEvent, OutboundMessage};
use super::state::{CloseReason, SessionId, SessionPhase};
use super::transport::{Connector, Transport};

/// Events emitted by a session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The transport is open; always the first event
    Opened,
    /// A parsed inbound message
    Inbound(InboundEvent),
    /// The session ended; always the last event
    Closed(CloseReason),
}

/// Handle to a running session
pub struct Session {
    id: SessionId,
    outbound: mpsc::Sender<OutboundMessage>,
    phase: watch::Receiver<SessionPhase>,
    shutdown: Option<oneshot::Sender<()>>,
    driver: Option<JoinHandle<()>>,
}

impl Session {
    /// Open a transport through `connector` and start the driver
    ///
    /// Returns the handle and the receiver for session events.
    pub async fn connect<C: Connector>(
        connector: &C,
        id: SessionId,
        config: &SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>), TransportError> {
        let endpoint = config.endpoint();

        let transport = match connector.connect(&endpoint).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!(session_id = %id, url = %endpoint, error = %e, "Session connect failed");
                return Err(e);
            }
        };

        tracing::info!(session_id = %id, url = %endpoint, "Session opened");
        Ok(Self::start(transport, id, config))
    }

    /// Start a driver over an already open transport
    pub fn start<T: Transport>(
        transport: T,
        id: SessionId,
        config: &SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));
        let (events_tx, events_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Open);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Capacity is at least one and nothing has been sent yet.
        let _ = events_tx.try_send(SessionEvent::Opened);

        let driver = Driver {
            id,
            transport,
            outbound: outbound_rx,
            events: events_tx,
            phase: phase_tx,
            keepalive: config.keepalive_interval,
        };
        let handle = tokio::spawn(driver.run(shutdown_rx));

        let session = Self {
            id,
            outbound: outbound_tx,
            phase: phase_rx,
            shutdown: Some(shutdown_tx),
            driver: Some(handle),
        };

        (session, events_rx)
    }

    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Whether messages can be sent
    pub fn is_open(&self) -> bool {
        self.phase().is_open()
    }

    /// Queue a message for sending
    ///
    /// Never waits: fails with [`TransportError::NotOpen`] once the session
    /// has closed, and refuses the message if the queue is full.
    pub fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }

        self.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Io("outbound queue full".into())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::NotOpen,
        })
    }

    /// Ask the server for a camera's frames
    pub fn subscribe(&self, camera_id: &CameraId) -> Result<(), TransportError> {
        self.send(OutboundMessage::SubscribeCamera {
            camera_id: camera_id.clone(),
        })
    }

    /// Tell the server to stop a camera's frames
    pub fn unsubscribe(&self, camera_id: &CameraId) -> Result<(), TransportError> {
        self.send(OutboundMessage::UnsubscribeCamera {
            camera_id: camera_id.clone(),
        })
    }

    /// Close the session and wait for the driver to finish
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                tracing::error!(session_id = %self.id, error = %e, "Session driver panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

struct Driver<T> {
    id: SessionId,
    transport: T,
    outbound: mpsc::Receiver<OutboundMessage>,
    events: mpsc::Sender<SessionEvent>,
    phase: watch::Sender<SessionPhase>,
    keepalive: Duration,
}

impl<T: Transport> Driver<T> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut keepalive = tokio::time::interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                // Fires on an explicit close and when the handle is dropped
                _ = &mut shutdown => break CloseReason::Local,

                inbound = self.transport.next() => match inbound {
                    Some(Ok(text)) => {
                        if !self.dispatch(&text).await {
                            break CloseReason::Local;
                        }
                    }
                    Some(Err(e)) => break CloseReason::Error(e.to_string()),
                    None => break CloseReason::Remote,
                },

                message = self.outbound.recv() => match message {
                    Some(message) => {
                        if let Err(e) = self.write(&message).await {
                            break CloseReason::Error(e.to_string());
                        }
                    }
                    None => break CloseReason::Local,
                },

                _ = keepalive.tick() => {
                    tracing::trace!(session_id = %self.id, "Keepalive");
                    if let Err(e) = self.write(&OutboundMessage::Ping).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
            }
        };

        self.phase.send_replace(SessionPhase::Closing);
        self.transport.close().await;
        self.phase.send_replace(SessionPhase::Closed);

        if reason.is_unexpected() {
            tracing::warn!(session_id = %self.id, reason = %reason, "Session closed");
        } else {
            tracing::info!(session_id = %self.id, "Session closed");
        }

        let _ = self.events.send(SessionEvent::Closed(reason)).await;
    }

    /// Parse and forward one message; false once nobody is listening
    async fn dispatch(&mut self, text: &str) -> bool {
        match parse_inbound(text) {
            Ok(Some(event)) => {
                tracing::trace!(session_id = %self.id, kind = event.kind(), "Inbound");
                self.events.send(SessionEvent::Inbound(event)).await.is_ok()
            }
            Ok(None) => {
                tracing::debug!(session_id = %self.id, "Ignoring unrecognized message type");
                true
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Dropping malformed message");
                true
            }
        }
    }

    async fn write(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "Failed to encode message");
                return Ok(());
            }
        };
        self.transport.send(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;
    use crate::session::transport::{ChannelConnector, ChannelPeer, ChannelTransport};

    fn open() -> (Session, mpsc::Receiver<SessionEvent>, ChannelPeer) {
        let (transport, peer) = ChannelTransport::pair();
        let (session, events) = Session::start(transport, SessionId(1), &SessionConfig::default());
        (session, events, peer)
    }

    async fn expect_inbound(events: &mut mpsc::Receiver<SessionEvent>) -> InboundEvent {
        match events.recv().await {
            Some(SessionEvent::Inbound(event)) => event,
            other => panic!("expected inbound event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_opened_then_inbound() {
        let (_session, mut events, peer) = open();

        assert!(matches!(events.recv().await, Some(SessionEvent::Opened)));

        peer.send_text(r#"{"type":"detection_status","camera_id":"c1","enabled":true}"#);
        let event = expect_inbound(&mut events).await;
        assert!(matches!(event, InboundEvent::DetectionStatus { enabled: true, .. }));
    }

    #[tokio::test]
    async fn test_zero_capacities_are_raised() {
        let (transport, peer) = ChannelTransport::pair();
        let config = SessionConfig {
            outbound_capacity: 0,
            inbound_capacity: 0,
            ..SessionConfig::default()
        };
        let (session, mut events) = Session::start(transport, SessionId(1), &config);

        assert!(matches!(events.recv().await, Some(SessionEvent::Opened)));
        assert_ok!(session.subscribe(&CameraId::new("cam-1")));

        peer.send_text(r#"{"type":"pong"}"#);
        assert!(matches!(expect_inbound(&mut events).await, InboundEvent::KeepaliveAck));
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_messages_are_skipped() {
        let (_session, mut events, peer) = open();
        events.recv().await;

        peer.send_text("{{{");
        peer.send_text(r#"{"type":"mystery"}"#);
        peer.send_text(r#"{"type":"pong"}"#);

        assert!(matches!(expect_inbound(&mut events).await, InboundEvent::KeepaliveAck));
    }

    #[tokio::test]
    async fn test_send_reaches_peer() {
        let (session, _events, mut peer) = open();

        assert_ok!(session.subscribe(&CameraId::new("cam-1")));

        assert_eq!(
            peer.recv().await.as_deref(),
            Some(r#"{"type":"subscribe_camera","camera_id":"cam-1"}"#)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_ping() {
        let (_session, _events, mut peer) = open();
        let started = Instant::now();

        assert_eq!(peer.recv().await.as_deref(), Some(r#"{"type":"ping"}"#));
        assert!(started.elapsed() >= Duration::from_secs(30));

        assert_eq!(peer.recv().await.as_deref(), Some(r#"{"type":"ping"}"#));
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_remote_close_emits_closed_once() {
        let (session, mut events, peer) = open();
        events.recv().await;

        drop(peer);

        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Closed(CloseReason::Remote))
        ));
        assert!(events.recv().await.is_none());
        assert_eq!(session.phase(), SessionPhase::Closed);
        assert_eq!(
            session.send(OutboundMessage::Ping),
            Err(TransportError::NotOpen)
        );
    }

    #[tokio::test]
    async fn test_local_close() {
        let (mut session, mut events, _peer) = open();
        events.recv().await;

        session.close().await;

        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Closed(CloseReason::Local))
        ));
        assert!(!session.is_open());
        assert_eq!(
            session.unsubscribe(&CameraId::new("c")),
            Err(TransportError::NotOpen)
        );
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let connector = ChannelConnector::refusing();
        let result = Session::connect(&connector, SessionId(7), &SessionConfig::default()).await;

        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn test_connect_through_connector() {
        let (transport, _peer) = ChannelTransport::pair();
        let connector = ChannelConnector::new(transport);

        let (session, mut events) =
            assert_ok!(Session::connect(&connector, SessionId(2), &SessionConfig::default()).await);

        assert_eq!(session.id(), SessionId(2));
        assert!(session.is_open());
        assert!(matches!(events.recv().await, Some(SessionEvent::Opened)));
    }
}
