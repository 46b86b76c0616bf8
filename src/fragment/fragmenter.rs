//! Outbound helper that splits logical messages into link packets.
//!
//! [`split`] returns a lazy [`Fragments`] iterator. Each item is a complete
//! link packet ready to hand to the transport: the marker byte followed by up
//! to `mtu - 1` payload bytes. Fragments must be transmitted in the order the
//! iterator yields them because the wire format carries no ordering metadata.

use std::iter::FusedIterator;

use bytes::{BufMut, Bytes, BytesMut};

use super::{LinkMtu, MARKER_CONTINUATION, MARKER_FINAL, MARKER_LEN};

/// A single encoded link packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    packet: Bytes,
}

impl Fragment {
    /// Encode a fragment from its parts.
    #[must_use]
    pub fn new(is_final: bool, payload: &[u8]) -> Self {
        let mut packet = BytesMut::with_capacity(MARKER_LEN + payload.len());
        packet.put_u8(if is_final {
            MARKER_FINAL
        } else {
            MARKER_CONTINUATION
        });
        packet.put_slice(payload);
        Self {
            packet: packet.freeze(),
        }
    }

    /// Return the marker byte.
    #[must_use]
    pub fn marker(&self) -> u8 { self.packet[0] }

    /// Report whether this fragment completes its message.
    #[must_use]
    pub fn is_final(&self) -> bool { self.marker() == MARKER_FINAL }

    /// Return the payload bytes that follow the marker.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.packet[MARKER_LEN..] }

    /// Borrow the encoded packet.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.packet }

    /// Size of the encoded packet in bytes.
    #[expect(
        clippy::len_without_is_empty,
        reason = "a fragment always carries its marker byte"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.packet.len() }

    /// Consume the fragment, returning the encoded packet.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.packet }
}

impl AsRef<[u8]> for Fragment {
    fn as_ref(&self) -> &[u8] { self.as_bytes() }
}

/// Split `message` into link packets no larger than `mtu`.
///
/// An empty message still yields one final fragment so the receiver observes
/// an empty message rather than nothing at all.
///
/// # Examples
///
/// ```
/// use bleframe::fragment::{LinkMtu, split};
/// let fragments: Vec<_> = split(&[7_u8; 25], LinkMtu::DEFAULT).collect();
/// assert_eq!(fragments.len(), 2);
/// assert_eq!(fragments[0].payload().len(), 19);
/// assert_eq!(fragments[1].payload().len(), 6);
/// assert!(fragments[1].is_final());
/// ```
#[must_use]
pub fn split(message: &[u8], mtu: LinkMtu) -> Fragments<'_> { Fragments::new(message, mtu) }

/// Lazy, in-order sequence of fragments for one message.
#[derive(Clone, Debug)]
pub struct Fragments<'a> {
    message: &'a [u8],
    chunk: usize,
    next: usize,
    total: usize,
}

impl<'a> Fragments<'a> {
    fn new(message: &'a [u8], mtu: LinkMtu) -> Self {
        let chunk = mtu.payload_capacity().get();
        let total = message.len().div_ceil(chunk).max(1);
        Self {
            message,
            chunk,
            next: 0,
            total,
        }
    }

    /// Total number of fragments the message splits into.
    #[must_use]
    pub fn total(&self) -> usize { self.total }

    /// Index of the fragment the next call to `next` yields.
    #[must_use]
    pub fn position(&self) -> usize { self.next }
}

impl Iterator for Fragments<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next * self.chunk;
        let end = (start + self.chunk).min(self.message.len());
        self.next += 1;
        let is_final = self.next == self.total;
        Some(Fragment::new(is_final, &self.message[start..end]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Fragments<'_> {}

impl FusedIterator for Fragments<'_> {}
