//! Errors raised while decoding inbound fragments.
//!
//! Splitting never fails, so only the reassembly side reports errors. Every
//! variant leaves the engine in a usable state.

use std::num::NonZeroUsize;

use thiserror::Error;

/// Errors produced by [`MessageAssembler::feed`](crate::fragment::MessageAssembler::feed).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// The packet did not even carry a marker byte.
    #[error("malformed fragment: packet is empty")]
    Malformed,
    /// The marker byte was neither continuation nor final.
    #[error("malformed fragment: unknown marker {marker:#04x}")]
    UnknownMarker { marker: u8 },
    /// The packet exceeded the link MTU.
    #[error("malformed fragment: {len} bytes exceeds link mtu {mtu}")]
    Oversized { len: usize, mtu: usize },
    /// Appending the payload would push the message past the configured cap.
    /// The partial message is discarded.
    #[error("reassembled message too large: attempted {attempted} bytes, limit {limit}")]
    MessageTooLarge {
        attempted: usize,
        limit: NonZeroUsize,
    },
}

impl FragmentError {
    /// Short label used for logging and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::UnknownMarker { .. } => "unknown_marker",
            Self::Oversized { .. } => "oversized",
            Self::MessageTooLarge { .. } => "message_too_large",
        }
    }
}
