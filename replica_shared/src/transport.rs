//! Transport abstraction.
//!
//! The replication core never talks to a socket directly; it hands finished
//! buffers to a [`Transport`] and drains inbound `(sender, bytes)` pairs
//! from a channel at the start of each tick. Delivery is fire-and-forget:
//! datagram-like, mostly delivered, not necessarily ordered, never
//! acknowledged.
//!
//! [`LoopbackHub`] wires several in-process peers together over channels,
//! which is enough for the demo binary and for headless tests.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::identity::PeerId;

/// An inbound datagram: who sent it and the raw payload.
pub type Inbound = (PeerId, Bytes);

/// Outbound side of the transport collaborator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends to a single participant. Best effort; errors mean the local
    /// send failed, never that delivery failed.
    async fn send_to(&self, peer: PeerId, bytes: Bytes) -> anyhow::Result<()>;

    /// Sends to every other participant, excluding self.
    async fn send_to_all(&self, bytes: Bytes) -> anyhow::Result<()>;
}

/// In-process hub connecting loopback peers.
///
/// Each registered peer gets a [`LoopbackTransport`] handle plus the
/// receiver its session drains.
#[derive(Default)]
pub struct LoopbackHub {
    peers: Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<Inbound>>>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer and returns its transport handle and inbound queue.
    pub async fn register(
        &self,
        peer: PeerId,
    ) -> (LoopbackTransport, mpsc::UnboundedReceiver<Inbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().await.insert(peer, tx);
        (
            LoopbackTransport {
                local: peer,
                peers: Arc::clone(&self.peers),
            },
            rx,
        )
    }

    /// Removes a peer; buffers already queued for it are simply dropped.
    pub async fn unregister(&self, peer: PeerId) {
        self.peers.lock().await.remove(&peer);
    }
}

/// Per-peer handle into a [`LoopbackHub`].
#[derive(Clone)]
pub struct LoopbackTransport {
    local: PeerId,
    peers: Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<Inbound>>>>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send_to(&self, peer: PeerId, bytes: Bytes) -> anyhow::Result<()> {
        let peers = self.peers.lock().await;
        match peers.get(&peer) {
            Some(tx) => {
                // A closed receiver means the peer is gone; fire-and-forget.
                let _ = tx.send((self.local, bytes));
            }
            None => debug!(%peer, "Dropping send to unknown peer"),
        }
        Ok(())
    }

    async fn send_to_all(&self, bytes: Bytes) -> anyhow::Result<()> {
        let peers = self.peers.lock().await;
        for (peer, tx) in peers.iter() {
            if *peer != self.local {
                let _ = tx.send((self.local, bytes.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u64) -> PeerId {
        PeerId::from_u64(n)
    }

    #[tokio::test]
    async fn send_to_one_routes_with_sender_identity() {
        let hub = LoopbackHub::new();
        let (a, _rx_a) = hub.register(peer(1)).await;
        let (_b, mut rx_b) = hub.register(peer(2)).await;

        a.send_to(peer(2), Bytes::from_static(b"hi")).await.unwrap();
        let (from, bytes) = rx_b.recv().await.unwrap();
        assert_eq!(from, peer(1));
        assert_eq!(&bytes[..], b"hi");
    }

    #[tokio::test]
    async fn broadcast_excludes_self() {
        let hub = LoopbackHub::new();
        let (a, mut rx_a) = hub.register(peer(1)).await;
        let (_b, mut rx_b) = hub.register(peer(2)).await;
        let (_c, mut rx_c) = hub.register(peer(3)).await;

        a.send_to_all(Bytes::from_static(b"snap")).await.unwrap();

        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_peer_is_silently_dropped() {
        let hub = LoopbackHub::new();
        let (a, _rx_a) = hub.register(peer(1)).await;
        a.send_to(peer(99), Bytes::from_static(b"x")).await.unwrap();
    }
}
