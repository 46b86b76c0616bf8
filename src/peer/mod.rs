//! Message-oriented endpoint over a packet link.
//!
//! [`Peer`] binds one [`PacketLink`], one [`MessageAssembler`], and one bounded
//! pending-message queue. `write` splits a message and sends each fragment in
//! order; `read` suspends until the link's notification path has reassembled a
//! complete message.
//!
//! Both connection roles share this type. They differ only in how the link is
//! obtained, see [`Initiator`](crate::initiator::Initiator) and
//! [`Acceptor`](crate::acceptor::Acceptor).
//!
//! Closing a peer (explicitly or by dropping it) wakes any pending `read` with
//! [`PeerError::Closed`] and makes the inbound sink refuse further packets.

mod role;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use role::PeerRole;

use crate::{
    config::LinkConfig,
    error::{PeerError, Result},
    fragment::MessageAssembler,
    link::{InboundSink, PacketLink},
    message::Message,
    metrics::{self, Direction},
};

/// A connected endpoint exchanging whole messages.
#[derive(Debug)]
pub struct Peer<L> {
    link: L,
    role: PeerRole,
    config: LinkConfig,
    assembler: Arc<MessageAssembler>,
    inbound: Mutex<mpsc::Receiver<Bytes>>,
    write_lock: Mutex<()>,
    closed: CancellationToken,
}

impl<L: PacketLink> Peer<L> {
    /// Wrap an established link and subscribe to its notifications.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Link`] when the link refuses the subscription.
    pub fn new(link: L, role: PeerRole, config: LinkConfig) -> Result<Self> {
        Self::with_close_token(link, role, config, CancellationToken::new())
    }

    pub(crate) fn with_close_token(
        link: L,
        role: PeerRole,
        config: LinkConfig,
        closed: CancellationToken,
    ) -> Result<Self> {
        let assembler = Arc::new(MessageAssembler::with_max_message_size(
            config.mtu,
            config.max_message_size,
        ));
        let (tx, rx) = mpsc::channel(config.queue_capacity.get());
        let sink = InboundSink::new(Arc::clone(&assembler), tx, closed.clone(), role);
        link.subscribe(sink).inspect_err(|err| {
            metrics::inc_errors("subscribe");
            warn!(%role, error = %err, "failed to subscribe to inbound notifications");
        })?;

        metrics::inc_peers();
        info!(%role, mtu = config.mtu.get(), queue = config.queue_capacity.get(), "peer connected");
        Ok(Self {
            link,
            role,
            config,
            assembler,
            inbound: Mutex::new(rx),
            write_lock: Mutex::new(()),
            closed,
        })
    }

    /// Send `message` as an ordered sequence of fragments.
    ///
    /// Concurrent writers on the same peer are serialised so their fragments
    /// never interleave on the link.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Transmit`] on the first fragment the link refuses.
    /// Fragments already sent are not retried or rolled back, so the remote
    /// side is left holding an unterminated partial message. Returns
    /// [`PeerError::Closed`] if the peer is closed before the write starts or
    /// between two fragments; no further fragments are sent after that.
    pub async fn write(&self, message: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let _guard = self.write_lock.lock().await;
        let fragments = self.assembler.chunk(message);
        let total = fragments.total();

        for (index, fragment) in fragments.enumerate() {
            // close() may land while this write waited for the lock or between fragments.
            self.ensure_open()?;
            if let Err(source) = self.link.send_packet(fragment.as_bytes()).await {
                metrics::inc_errors("transmit");
                warn!(role = %self.role, index, total, error = %source, "fragment transmission failed");
                return Err(PeerError::Transmit {
                    index,
                    total,
                    source,
                });
            }
            metrics::inc_fragments(Direction::Outbound);
        }

        metrics::inc_messages(Direction::Outbound);
        debug!(role = %self.role, len = message.len(), fragments = total, "message written");
        Ok(())
    }

    /// Serialise `message` with bincode and write it.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Encode`] if serialisation fails, otherwise as
    /// [`Peer::write`].
    pub async fn write_message<M: Message>(&self, message: &M) -> Result<()> {
        let bytes = message.to_bytes()?;
        self.write(&bytes).await
    }
}

impl<L> Peer<L> {
    /// Wait for the next complete message.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Closed`] once the peer is closed or the link has
    /// dropped its inbound handler.
    pub async fn read(&self) -> Result<Bytes> {
        let mut inbound = tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(PeerError::Closed),
            guard = self.inbound.lock() => guard,
        };
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(PeerError::Closed),
            message = inbound.recv() => message.ok_or(PeerError::Closed),
        }
    }

    /// Read the next message and decode it with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Decode`] if the payload is not a valid `M`,
    /// otherwise as [`Peer::read`].
    pub async fn read_message<M: Message>(&self) -> Result<M> {
        let bytes = self.read().await?;
        let (message, _) = M::from_bytes(&bytes)?;
        Ok(message)
    }

    /// Close the peer, waking pending reads.
    ///
    /// Messages still queued are discarded. Closing twice is harmless.
    pub fn close(&self) {
        if !self.closed.is_cancelled() {
            info!(role = %self.role, "peer closed");
        }
        self.closed.cancel();
    }

    /// Report whether the peer has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.is_cancelled() }

    /// Return the role this peer was created for.
    #[must_use]
    pub const fn role(&self) -> PeerRole { self.role }

    /// Return the configuration the peer was built with.
    #[must_use]
    pub const fn config(&self) -> &LinkConfig { &self.config }

    /// Borrow the underlying link.
    #[must_use]
    pub const fn link(&self) -> &L { &self.link }

    /// Payload bytes received for a message that has not completed yet.
    #[must_use]
    pub fn pending_bytes(&self) -> usize { self.assembler.buffered_len() }

    /// Drop a partially received message, returning the bytes discarded.
    ///
    /// Use this to resynchronise after the remote side reported a failed
    /// write part-way through a message.
    pub fn discard_partial(&self) -> usize { self.assembler.discard_partial() }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(PeerError::Closed);
        }
        Ok(())
    }
}

impl<L> Drop for Peer<L> {
    fn drop(&mut self) {
        self.closed.cancel();
        metrics::dec_peers();
    }
}
