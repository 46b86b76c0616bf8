//! Marker-byte fragmentation for small-packet links.
//!
//! Every link packet carries a one byte completion marker followed by a slice
//! of the logical message:
//!
//! ```text
//! +--------+------------------------------+
//! | marker | payload (0..=mtu - 1 bytes)  |
//! +--------+------------------------------+
//! ```
//!
//! A marker of [`MARKER_CONTINUATION`] means more fragments follow; a marker
//! of [`MARKER_FINAL`] closes the message. There is no length prefix, checksum,
//! or sequence number, so the link must deliver packets in order.
//!
//! [`split`] produces the outbound fragment sequence and [`MessageAssembler`]
//! stitches inbound packets back into messages.

pub mod error;
pub mod fragmenter;
pub mod mtu;
pub mod reassembler;

pub use error::FragmentError;
pub use fragmenter::{Fragment, Fragments, split};
pub use mtu::LinkMtu;
pub use reassembler::{MessageAssembler, Reassembler};

/// Marker byte for a fragment that is followed by more fragments.
pub const MARKER_CONTINUATION: u8 = 0x00;
/// Marker byte for the final fragment of a message.
pub const MARKER_FINAL: u8 = 0x01;
/// Number of bytes the marker occupies at the start of each packet.
pub const MARKER_LEN: usize = 1;
/// Packet size imposed by the default link.
pub const DEFAULT_LINK_MTU: usize = 20;
