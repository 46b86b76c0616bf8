//! Canonical error and result types for the crate.
//!
//! [`PeerError`] is the single error surface returned by peer reads, writes,
//! and role constructors. Lower layers keep their own focused enums
//! ([`FragmentError`](crate::fragment::FragmentError),
//! [`LinkError`](crate::link::LinkError),
//! [`ConfigError`](crate::config::ConfigError)) which convert into it.

use std::time::Duration;

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

use crate::{config::ConfigError, link::LinkError};

/// Top-level error type exposed by `bleframe`.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The link refused a fragment. Earlier fragments of the message were
    /// already sent and are not rolled back.
    #[error("failed to transmit fragment {index} of {total}: {source}")]
    Transmit {
        index: usize,
        total: usize,
        #[source]
        source: LinkError,
    },
    /// The link failed outside of fragment transmission.
    #[error("link error: {0}")]
    Link(#[from] LinkError),
    /// The peer was closed locally or its link went away.
    #[error("peer closed")]
    Closed,
    /// Discovery did not produce a link in time.
    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),
    /// A typed message could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    /// A received message could not be deserialised.
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
    /// The supplied configuration was invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PeerError {
    /// Returns true if this error reports an orderly shutdown.
    #[must_use]
    pub fn is_closed(&self) -> bool { matches!(self, Self::Closed) }

    /// Short label used for logging and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transmit { .. } => "transmit",
            Self::Link(_) => "link",
            Self::Closed => "closed",
            Self::Timeout(_) => "timeout",
            Self::Encode(_) => "encode",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
        }
    }
}

/// Canonical result alias used by `bleframe` public APIs.
pub type Result<T, E = PeerError> = std::result::Result<T, E>;
