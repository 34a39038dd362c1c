//! Transport abstraction
//!
//! A [`Transport`] moves whole text messages in both directions; a
//! [`Connector`] opens one. The session driver is written against these
//! traits so it can run over a WebSocket in production and over in-memory
//! channels in tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::error::TransportError;

/// Bidirectional text-message channel
pub trait Transport: Send + 'static {
    /// Send one text message
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Next inbound text message
    ///
    /// `None` means the peer closed the channel cleanly.
    fn next(&mut self) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;

    /// Close the channel; errors are ignored
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens transports
pub trait Connector: Send + Sync + 'static {
    /// Transport produced by this connector
    type Transport: Transport;

    /// Open a transport to `url`
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Transport, TransportError>> + Send;
}

/// In-memory transport backed by unbounded channels
#[derive(Debug)]
pub struct ChannelTransport {
    to_peer: mpsc::UnboundedSender<String>,
    from_peer: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

/// Far end of a [`ChannelTransport`]
///
/// Dropping it closes the transport from the remote side.
#[derive(Debug)]
pub struct ChannelPeer {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ChannelTransport {
    /// Create a connected transport and its peer
    pub fn pair() -> (ChannelTransport, ChannelPeer) {
        let (to_peer, from_client) = mpsc::unbounded_channel();
        let (to_client, from_peer) = mpsc::unbounded_channel();

        (
            ChannelTransport {
                to_peer,
                from_peer,
                closed: false,
            },
            ChannelPeer {
                to_client,
                from_client,
            },
        )
    }
}

impl Transport for ChannelTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::NotOpen);
        }
        self.to_peer
            .send(text)
            .map_err(|_| TransportError::Closed("peer dropped".into()))
    }

    async fn next(&mut self) -> Option<Result<String, TransportError>> {
        if self.closed {
            return None;
        }
        self.from_peer.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closed = true;
        self.from_peer.close();
    }
}

impl ChannelPeer {
    /// Push a raw text message to the client
    ///
    /// Returns false once the client side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client.send(text.into()).is_ok()
    }

    /// Push a JSON value to the client
    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        self.send_text(value.to_string())
    }

    /// Next message sent by the client
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next message sent by the client, if one is already queued
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }
}

/// Connector that hands out pre-built [`ChannelTransport`]s in order
///
/// Once they are used up every connect fails.
#[derive(Debug, Default)]
pub struct ChannelConnector {
    transports: Mutex<VecDeque<ChannelTransport>>,
}

impl ChannelConnector {
    /// Connector that yields `transport` on the first connect
    pub fn new(transport: ChannelTransport) -> Self {
        Self::sequence([transport])
    }

    /// Connector that yields one transport per connect
    pub fn sequence(transports: impl IntoIterator<Item = ChannelTransport>) -> Self {
        Self {
            transports: Mutex::new(transports.into_iter().collect()),
        }
    }

    /// Connector whose every connect fails
    pub fn refusing() -> Self {
        Self::default()
    }
}

impl Connector for ChannelConnector {
    type Transport = ChannelTransport;

    async fn connect(&self, url: &str) -> Result<ChannelTransport, TransportError> {
        let taken = match self.transports.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        taken.ok_or_else(|| TransportError::ConnectFailed(format!("{}: connection refused", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_moves_messages_both_ways() {
        let (mut transport, mut peer) = ChannelTransport::pair();

        transport.send("hello".into()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        assert!(peer.send_text("world"));
        assert_eq!(transport.next().await.unwrap().unwrap(), "world");
    }

    #[tokio::test]
    async fn test_peer_drop_ends_stream() {
        let (mut transport, peer) = ChannelTransport::pair();
        drop(peer);

        assert!(transport.next().await.is_none());
        assert!(transport.send("x".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_send() {
        let (mut transport, _peer) = ChannelTransport::pair();
        transport.close().await;

        assert_eq!(
            transport.send("x".into()).await,
            Err(TransportError::NotOpen)
        );
    }

    #[tokio::test]
    async fn test_connector_hands_out_once() {
        let (transport, _peer) = ChannelTransport::pair();
        let connector = ChannelConnector::new(transport);

        assert!(connector.connect("mem://a").await.is_ok());
        assert!(matches!(
            connector.connect("mem://a").await,
            Err(TransportError::ConnectFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_connector_sequence_in_order() {
        let (first, _first_peer) = ChannelTransport::pair();
        let (second, mut second_peer) = ChannelTransport::pair();
        let connector = ChannelConnector::sequence([first, second]);

        assert!(connector.connect("mem://a").await.is_ok());
        let mut transport = connector.connect("mem://a").await.unwrap();
        transport.send("second".into()).await.unwrap();
        assert_eq!(second_peer.recv().await.as_deref(), Some("second"));

        assert!(connector.connect("mem://a").await.is_err());
    }
}
