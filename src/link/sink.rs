//! Inbound notification handler handed to link backends.
//!
//! [`InboundSink`] is the only path by which packets enter a peer. Each call
//! feeds one packet to the peer's [`MessageAssembler`]; a completed message is
//! then pushed onto the bounded pending-message queue. The assembler lock is
//! released before the hand-off, so a full queue blocks the caller without
//! blocking the engine.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    fragment::{FragmentError, MessageAssembler},
    metrics::{self, Direction},
    peer::PeerRole,
};

/// Errors returned to the link driver when delivering a packet.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DeliverError {
    /// The packet could not be decoded as a fragment.
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    /// The peer has been closed or dropped; further packets are discarded.
    #[error("peer closed")]
    Closed,
}

/// Cloneable handle the link driver calls for every inbound packet.
#[derive(Clone, Debug)]
pub struct InboundSink {
    assembler: Arc<MessageAssembler>,
    queue: mpsc::Sender<Bytes>,
    closed: CancellationToken,
    role: PeerRole,
}

impl InboundSink {
    pub(crate) fn new(
        assembler: Arc<MessageAssembler>,
        queue: mpsc::Sender<Bytes>,
        closed: CancellationToken,
        role: PeerRole,
    ) -> Self {
        Self {
            assembler,
            queue,
            closed,
            role,
        }
    }

    /// Deliver one packet, waiting for queue space if a message completes.
    ///
    /// With the default single-slot queue this suspends until the application
    /// has read the previous message, propagating back-pressure into the link
    /// driver.
    ///
    /// # Errors
    ///
    /// Returns [`DeliverError::Fragment`] for malformed packets and
    /// [`DeliverError::Closed`] once the peer has gone away.
    pub async fn deliver(&self, packet: &[u8]) -> Result<(), DeliverError> {
        let Some(message) = self.reassemble(packet)? else {
            return Ok(());
        };
        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(DeliverError::Closed),
            sent = self.queue.send(message) => sent.map_err(|_| DeliverError::Closed),
        }
    }

    /// Deliver one packet from a thread that is not driven by an async
    /// runtime, such as a native radio callback.
    ///
    /// # Errors
    ///
    /// See [`InboundSink::deliver`].
    pub fn blocking_deliver(&self, packet: &[u8]) -> Result<(), DeliverError> {
        futures::executor::block_on(self.deliver(packet))
    }

    /// Report whether the owning peer has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.is_cancelled() || self.queue.is_closed() }

    fn reassemble(&self, packet: &[u8]) -> Result<Option<Bytes>, DeliverError> {
        if self.is_closed() {
            return Err(DeliverError::Closed);
        }
        metrics::inc_fragments(Direction::Inbound);
        match self.assembler.feed(packet) {
            Ok(Some(message)) => {
                metrics::inc_messages(Direction::Inbound);
                debug!(role = %self.role, len = message.len(), "message reassembled");
                Ok(Some(message))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                metrics::inc_errors(err.kind());
                warn!(role = %self.role, packet_len = packet.len(), error = %err, "inbound fragment rejected");
                Err(err.into())
            }
        }
    }
}
