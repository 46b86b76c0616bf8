//! Metric helpers for `bleframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking live peers.
pub const PEERS_ACTIVE: &str = "bleframe_peers_active";
/// Name of the counter tracking link packets sent or received.
pub const FRAGMENTS_TOTAL: &str = "bleframe_fragments_total";
/// Name of the counter tracking whole messages written or reassembled.
pub const MESSAGES_TOTAL: &str = "bleframe_messages_total";
/// Name of the counter tracking error occurrences, labelled by kind.
pub const ERRORS_TOTAL: &str = "bleframe_errors_total";
/// Name of the counter tracking connections refused by the acceptor.
pub const CONNECTIONS_REJECTED: &str = "bleframe_connections_rejected_total";

/// Direction of traffic relative to the local peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Packets arriving from the link.
    Inbound,
    /// Packets handed to the link.
    Outbound,
}

impl Direction {
    /// Label value used when recording metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the live peers gauge.
pub fn inc_peers() {
    #[cfg(feature = "metrics")]
    gauge!(PEERS_ACTIVE).increment(1.0);
}

/// Decrement the live peers gauge.
pub fn dec_peers() {
    #[cfg(feature = "metrics")]
    gauge!(PEERS_ACTIVE).decrement(1.0);
}

/// Record a link packet for the given direction.
pub fn inc_fragments(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a complete message for the given direction.
pub fn inc_messages(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence of the given kind.
pub fn inc_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a connection refused because another peer was active.
pub fn inc_connections_rejected() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTIONS_REJECTED).increment(1);
}
