//! Inbound helper that stitches link packets back into complete messages.
//!
//! [`Reassembler`] holds the payload bytes received since the last final
//! marker. It has no notion of message identity: the link's ordering guarantee
//! is the only thing keeping fragments of different messages apart, so
//! interleaved senders produce corrupted output rather than an error.
//!
//! [`MessageAssembler`] wraps a [`Reassembler`] in a mutex so the link's
//! notification path can feed it while the application writes through the
//! same engine.

use std::{num::NonZeroUsize, sync::PoisonError};

#[cfg(not(loom))]
use std::sync::Mutex;

use bytes::{Bytes, BytesMut};
#[cfg(loom)]
use loom::sync::Mutex;
use tracing::{debug, trace};

use super::{FragmentError, Fragments, LinkMtu, MARKER_CONTINUATION, MARKER_FINAL, split};

/// Unsynchronised reassembly buffer.
#[derive(Debug)]
pub struct Reassembler {
    mtu: LinkMtu,
    max_message_size: Option<NonZeroUsize>,
    buffer: BytesMut,
}

impl Reassembler {
    /// Create a reassembler accepting packets of at most `mtu` bytes.
    #[must_use]
    pub fn new(mtu: LinkMtu) -> Self {
        Self {
            mtu,
            max_message_size: None,
            buffer: BytesMut::new(),
        }
    }

    /// Cap the size of a reassembled message. `None` removes the cap.
    #[must_use]
    pub fn with_max_message_size(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Process one link packet.
    ///
    /// Returns `Ok(Some(message))` when the packet carries the final marker,
    /// `Ok(None)` while more fragments are expected.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError`] when the packet is empty, oversized, or
    /// carries an unknown marker; the buffer is left untouched in those cases.
    /// Returns [`FragmentError::MessageTooLarge`] when the configured cap is
    /// exceeded, after discarding the partial message.
    pub fn push(&mut self, packet: &[u8]) -> Result<Option<Bytes>, FragmentError> {
        let (&marker, payload) = packet.split_first().ok_or(FragmentError::Malformed)?;
        if packet.len() > self.mtu.get() {
            return Err(FragmentError::Oversized {
                len: packet.len(),
                mtu: self.mtu.get(),
            });
        }
        let is_final = match marker {
            MARKER_FINAL => true,
            MARKER_CONTINUATION => false,
            marker => return Err(FragmentError::UnknownMarker { marker }),
        };

        self.check_limit(payload.len())?;
        self.buffer.extend_from_slice(payload);
        trace!(
            payload = payload.len(),
            buffered = self.buffer.len(),
            is_final,
            "fragment accepted"
        );

        if is_final {
            Ok(Some(self.buffer.split().freeze()))
        } else {
            Ok(None)
        }
    }

    /// Number of payload bytes waiting for a final marker.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffer.len() }

    /// Drop any partially received message, returning the bytes discarded.
    pub fn discard_partial(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    fn check_limit(&mut self, incoming: usize) -> Result<(), FragmentError> {
        let Some(limit) = self.max_message_size else {
            return Ok(());
        };
        let attempted = self.buffer.len().saturating_add(incoming);
        if attempted > limit.get() {
            let dropped = self.discard_partial();
            debug!(attempted, limit = limit.get(), dropped, "partial message discarded");
            return Err(FragmentError::MessageTooLarge { attempted, limit });
        }
        Ok(())
    }
}

/// Fragmentation engine shared between the outbound and inbound paths.
///
/// Splitting never touches the buffer. Feeding holds the lock for exactly one
/// packet and never across an await point.
#[derive(Debug)]
pub struct MessageAssembler {
    mtu: LinkMtu,
    inner: Mutex<Reassembler>,
}

impl MessageAssembler {
    /// Create an engine for packets of at most `mtu` bytes.
    #[must_use]
    pub fn new(mtu: LinkMtu) -> Self { Self::with_max_message_size(mtu, None) }

    /// Create an engine that also caps reassembled message size.
    #[must_use]
    pub fn with_max_message_size(mtu: LinkMtu, limit: Option<NonZeroUsize>) -> Self {
        Self {
            mtu,
            inner: Mutex::new(Reassembler::new(mtu).with_max_message_size(limit)),
        }
    }

    /// Return the MTU this engine splits to and validates against.
    #[must_use]
    pub const fn mtu(&self) -> LinkMtu { self.mtu }

    /// Split `message` into packets sized for this engine's link.
    #[must_use]
    pub fn chunk<'a>(&self, message: &'a [u8]) -> Fragments<'a> { split(message, self.mtu) }

    /// Feed one inbound packet.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn feed(&self, packet: &[u8]) -> Result<Option<Bytes>, FragmentError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(packet)
    }

    /// Number of payload bytes waiting for a final marker.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffered_len()
    }

    /// Drop any partially received message, returning the bytes discarded.
    ///
    /// Useful after the remote side is known to have abandoned a message
    /// part-way through.
    pub fn discard_partial(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .discard_partial()
    }
}
