//! Connection-accepting role.
//!
//! The radio driver owns an [`AcceptorHandle`] and reports connection events
//! to it. The handle admits at most one active peer at a time: while a peer is
//! live, further connections are disconnected straight away and never reach
//! the application. Each admitted connection gets a [`ConnectionId`]; the
//! driver quotes it back in [`AcceptorHandle::on_disconnect`] so that the
//! disconnect of a rejected device can never tear down the active session.
//!
//! Admitted peers wait in a single pending slot until the application takes
//! them with [`Acceptor::accept`]. A newer admission replaces a pending peer
//! that has already disconnected, so the driver never waits on the
//! application.

use std::{
    fmt,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::LinkConfig,
    error::{PeerError, Result},
    link::PacketLink,
    metrics,
    peer::{Peer, PeerRole},
};

/// Identity of one admitted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Raw numeric value, unique per [`Acceptor`].
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Result of reporting a new connection to the [`AcceptorHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The connection became the active peer. Pass the id to
    /// [`AcceptorHandle::on_disconnect`] when the link drops.
    Accepted(ConnectionId),
    /// Another peer was active; the connection was disconnected.
    Rejected,
}

struct ActiveConnection {
    id: ConnectionId,
    closed: CancellationToken,
}

struct Pending<L> {
    peer: Option<Peer<L>>,
    acceptor_dropped: bool,
}

struct Gate<L> {
    active: Mutex<Option<ActiveConnection>>,
    pending: Mutex<Pending<L>>,
    ready: Notify,
    handles: AtomicUsize,
    next_id: AtomicU64,
}

impl<L> Gate<L> {
    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Pending<L>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A slot is active until its peer is closed or dropped.
    fn is_active(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|active| !active.closed.is_cancelled())
    }
}

/// Application side: yields peers as connections are admitted.
pub struct Acceptor<L> {
    gate: Arc<Gate<L>>,
}

/// Driver side: reports connection events.
pub struct AcceptorHandle<L> {
    config: LinkConfig,
    gate: Arc<Gate<L>>,
}

impl<L> fmt::Debug for Acceptor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptor")
            .field("active", &self.gate.is_active())
            .finish_non_exhaustive()
    }
}

impl<L> fmt::Debug for AcceptorHandle<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptorHandle")
            .field("config", &self.config)
            .field("active", &self.gate.is_active())
            .finish_non_exhaustive()
    }
}

impl<L> Clone for AcceptorHandle<L> {
    fn clone(&self) -> Self {
        self.gate.handles.fetch_add(1, Ordering::AcqRel);
        Self {
            config: self.config,
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<L> Drop for AcceptorHandle<L> {
    fn drop(&mut self) {
        if self.gate.handles.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.gate.ready.notify_one();
        }
    }
}

impl<L> Drop for Acceptor<L> {
    fn drop(&mut self) {
        let stale = {
            let mut pending = self.gate.lock_pending();
            pending.acceptor_dropped = true;
            pending.peer.take()
        };
        drop(stale);
    }
}

impl<L: PacketLink> Acceptor<L> {
    /// Create the acceptor and the handle its driver reports events to.
    #[must_use]
    pub fn new(config: LinkConfig) -> (Self, AcceptorHandle<L>) {
        let gate = Arc::new(Gate {
            active: Mutex::new(None),
            pending: Mutex::new(Pending {
                peer: None,
                acceptor_dropped: false,
            }),
            ready: Notify::new(),
            handles: AtomicUsize::new(1),
            next_id: AtomicU64::new(1),
        });
        (
            Self {
                gate: Arc::clone(&gate),
            },
            AcceptorHandle { config, gate },
        )
    }

    /// Wait for the next admitted peer.
    ///
    /// Peers that disconnected before being taken are skipped. Returns `None`
    /// once every [`AcceptorHandle`] has been dropped.
    pub async fn accept(&mut self) -> Option<Peer<L>> {
        loop {
            let queued = self.gate.lock_pending().peer.take();
            match queued {
                Some(peer) if peer.is_closed() => {
                    debug!("skipping peer that disconnected before accept");
                }
                Some(peer) => return Some(peer),
                None if self.gate.handles.load(Ordering::Acquire) == 0 => return None,
                None => self.gate.ready.notified().await,
            }
        }
    }

    /// Report whether a peer is currently active.
    #[must_use]
    pub fn has_active_peer(&self) -> bool { self.gate.is_active() }
}

impl<L: PacketLink> AcceptorHandle<L> {
    /// Report a newly established connection.
    ///
    /// Never waits on the application: an unaccepted peer that has already
    /// disconnected is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Link`] if the link cannot be subscribed to and
    /// [`PeerError::Closed`] if the [`Acceptor`] has been dropped. Rejected
    /// connections are not errors.
    pub async fn on_connect(&self, link: L) -> Result<ConnectOutcome> {
        let closed = CancellationToken::new();
        let Some(id) = self.claim(&closed) else {
            metrics::inc_connections_rejected();
            warn!("rejecting connection: another peer is active");
            if let Err(err) = link.disconnect().await {
                debug!(error = %err, "rejected link failed to disconnect");
            }
            return Ok(ConnectOutcome::Rejected);
        };

        let peer = match Peer::with_close_token(link, PeerRole::Acceptor, self.config, closed) {
            Ok(peer) => peer,
            Err(err) => {
                self.release(id);
                return Err(err);
            }
        };

        let stale = {
            let mut pending = self.gate.lock_pending();
            if pending.acceptor_dropped {
                drop(pending);
                drop(peer);
                self.release(id);
                return Err(PeerError::Closed);
            }
            pending.peer.replace(peer)
        };
        if stale.is_some() {
            debug!("replaced unaccepted peer that already disconnected");
        }
        drop(stale);
        self.gate.ready.notify_one();
        info!(connection = %id, "connection accepted");
        Ok(ConnectOutcome::Accepted(id))
    }

    /// Report that the connection admitted as `id` has ended.
    ///
    /// The matching peer is closed so pending reads return
    /// [`PeerError::Closed`], and the next connection will be admitted. Ids
    /// that are not the active connection are ignored.
    pub fn on_disconnect(&self, id: ConnectionId) {
        let ended = {
            let mut active = self.gate.lock_active();
            if active.as_ref().is_some_and(|current| current.id == id) {
                active.take()
            } else {
                None
            }
        };
        let Some(ended) = ended else {
            debug!(connection = %id, "ignoring disconnect of inactive connection");
            return;
        };
        ended.closed.cancel();
        let stale = self
            .gate
            .lock_pending()
            .peer
            .take_if(|peer| peer.is_closed());
        drop(stale);
        info!(connection = %id, "active connection ended");
    }

    /// Report whether a peer is currently active.
    #[must_use]
    pub fn has_active_peer(&self) -> bool { self.gate.is_active() }

    /// Atomically mark `closed` as the active peer's token if the slot is free.
    fn claim(&self, closed: &CancellationToken) -> Option<ConnectionId> {
        let mut active = self.gate.lock_active();
        if active
            .as_ref()
            .is_some_and(|current| !current.closed.is_cancelled())
        {
            return None;
        }
        let id = ConnectionId(self.gate.next_id.fetch_add(1, Ordering::Relaxed));
        *active = Some(ActiveConnection {
            id,
            closed: closed.clone(),
        });
        Some(id)
    }

    fn release(&self, id: ConnectionId) {
        let mut active = self.gate.lock_active();
        if active.as_ref().is_some_and(|current| current.id == id) {
            active.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tracing_test::traced_test;

    use super::*;
    use crate::link::MemoryLink;

    fn link() -> MemoryLink {
        let (local, _remote) = MemoryLink::pair(LinkConfig::DEFAULT.mtu);
        local
    }

    fn accepted(outcome: ConnectOutcome) -> ConnectionId {
        match outcome {
            ConnectOutcome::Accepted(id) => id,
            ConnectOutcome::Rejected => panic!("connection was rejected"),
        }
    }

    #[tokio::test]
    async fn first_connection_is_accepted() {
        let (mut acceptor, handle) = Acceptor::new(LinkConfig::default());

        let outcome = handle.on_connect(link()).await.expect("accepted");
        assert!(matches!(outcome, ConnectOutcome::Accepted(_)));

        let peer = acceptor.accept().await.expect("peer delivered");
        assert_eq!(peer.role(), PeerRole::Acceptor);
        assert!(acceptor.has_active_peer());
    }

    #[traced_test]
    #[tokio::test]
    async fn second_connection_is_rejected_and_disconnected() {
        let (mut acceptor, handle) = Acceptor::new(LinkConfig::default());
        handle
            .on_connect(SharedLink(Arc::new(link())))
            .await
            .expect("first accepted");
        let _peer = acceptor.accept().await.expect("peer delivered");

        let second = Arc::new(link());
        let outcome = handle
            .on_connect(SharedLink(Arc::clone(&second)))
            .await
            .expect("rejection is not an error");
        assert_eq!(outcome, ConnectOutcome::Rejected);
        assert!(second.is_disconnected());
        assert!(acceptor.has_active_peer());
        assert!(logs_contain("rejecting connection: another peer is active"));
    }

    #[tokio::test]
    async fn disconnect_closes_active_peer_and_frees_slot() {
        let (mut acceptor, handle) = Acceptor::new(LinkConfig::default());
        let id = accepted(handle.on_connect(link()).await.expect("first accepted"));
        let peer = acceptor.accept().await.expect("peer delivered");

        handle.on_disconnect(id);
        assert!(peer.is_closed());
        assert!(matches!(peer.read().await, Err(PeerError::Closed)));
        assert!(!handle.has_active_peer());

        let next = accepted(handle.on_connect(link()).await.expect("accepted again"));
        assert_ne!(next, id);
    }

    #[tokio::test]
    async fn unrelated_disconnect_leaves_active_peer_open() {
        let config = LinkConfig::default();
        let (mut acceptor, handle) = Acceptor::new(config);

        let earlier = accepted(handle.on_connect(link()).await.expect("earlier accepted"));
        drop(acceptor.accept().await.expect("earlier delivered"));
        handle.on_disconnect(earlier);

        let (local, remote) = MemoryLink::pair(config.mtu);
        accepted(handle.on_connect(local).await.expect("active accepted"));
        let active = acceptor.accept().await.expect("active delivered");
        let outcome = handle.on_connect(link()).await.expect("rejection is not an error");
        assert_eq!(outcome, ConnectOutcome::Rejected);

        // A late or duplicate disconnect report names a connection that is no
        // longer active.
        handle.on_disconnect(earlier);

        assert!(!active.is_closed());
        assert!(handle.has_active_peer());
        let central = Peer::new(remote, PeerRole::Initiator, config).expect("central");
        central.write(b"still here").await.expect("write");
        let message = active.read().await.expect("active peer still reads");
        assert_eq!(&message[..], b"still here");
    }

    #[tokio::test]
    async fn disconnect_before_accept_does_not_block_next_connection() {
        let config = LinkConfig::default();
        let (mut acceptor, handle) = Acceptor::new(config);

        let first = accepted(handle.on_connect(link()).await.expect("first accepted"));
        handle.on_disconnect(first);

        let (local, _remote) = MemoryLink::pair(config.mtu);
        let outcome = timeout(Duration::from_millis(200), handle.on_connect(local))
            .await
            .expect("driver must not wait for accept")
            .expect("second accepted");
        let second = accepted(outcome);
        assert_ne!(second, first);

        let peer = acceptor.accept().await.expect("peer delivered");
        assert!(!peer.is_closed(), "stale peer handed to the application");
        assert!(acceptor.has_active_peer());
    }

    #[tokio::test]
    async fn disconnected_pending_peer_is_never_delivered() {
        let (mut acceptor, handle) = Acceptor::new(LinkConfig::default());
        let id = accepted(handle.on_connect(link()).await.expect("accepted"));
        handle.on_disconnect(id);
        drop(handle);

        assert!(acceptor.accept().await.is_none());
    }

    #[tokio::test]
    async fn dropping_active_peer_frees_slot() {
        let (mut acceptor, handle) = Acceptor::new(LinkConfig::default());
        handle.on_connect(link()).await.expect("first accepted");
        drop(acceptor.accept().await.expect("peer delivered"));

        assert!(!handle.has_active_peer());
        let outcome = handle.on_connect(link()).await.expect("accepted again");
        assert!(matches!(outcome, ConnectOutcome::Accepted(_)));
    }

    #[tokio::test]
    async fn dropped_acceptor_reports_closed() {
        let (acceptor, handle) = Acceptor::<MemoryLink>::new(LinkConfig::default());
        drop(acceptor);

        let err = handle.on_connect(link()).await.expect_err("no one to accept");
        assert!(err.is_closed());
        assert!(!handle.has_active_peer());
    }

    /// Lets the test observe a link after handing it to the acceptor.
    #[derive(Debug)]
    struct SharedLink(Arc<MemoryLink>);

    #[async_trait::async_trait]
    impl PacketLink for SharedLink {
        async fn send_packet(&self, packet: &[u8]) -> Result<(), crate::link::LinkError> {
            self.0.send_packet(packet).await
        }

        fn subscribe(&self, sink: crate::link::InboundSink) -> Result<(), crate::link::LinkError> {
            self.0.subscribe(sink)
        }

        async fn disconnect(&self) -> Result<(), crate::link::LinkError> { self.0.disconnect().await }
    }
}
