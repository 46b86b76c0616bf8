//! Capability interface for the underlying packet link.
//!
//! A [`PacketLink`] is what remains of a wireless connection once discovery,
//! pairing, and characteristic enumeration are done: an outbound primitive
//! that sends one packet of at most `mtu` bytes, and an inbound notification
//! stream that the peer subscribes to exactly once. Radio backends implement
//! this trait; [`memory::MemoryLink`] provides an in-process pair for tests
//! and demos.

pub mod memory;
pub mod sink;

use std::error::Error;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryDiscovery, MemoryLink};
pub use sink::{DeliverError, InboundSink};

/// Errors reported by link backends.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The packet does not fit in one link unit.
    #[error("packet of {len} bytes exceeds link mtu {mtu}")]
    PacketTooLarge { len: usize, mtu: usize },
    /// The link is no longer connected.
    #[error("link disconnected")]
    Disconnected,
    /// Registering the inbound handler failed.
    #[error("failed to subscribe to inbound notifications: {0}")]
    Subscribe(String),
    /// Backend-specific failure.
    #[error("link backend error: {0}")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}

impl LinkError {
    /// Wrap a backend error.
    pub fn backend(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Backend(error.into())
    }
}

/// One established link connection.
///
/// Implementations must deliver packets passed to [`send_packet`] to the
/// remote side as single atomic units, in call order, and must invoke the
/// subscribed [`InboundSink`] once per received packet, in arrival order.
///
/// [`send_packet`]: PacketLink::send_packet
#[async_trait]
pub trait PacketLink: Send + Sync + 'static {
    /// Transmit a single packet of at most `mtu` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the backend rejects the packet.
    async fn send_packet(&self, packet: &[u8]) -> Result<(), LinkError>;

    /// Register the handler for inbound packets.
    ///
    /// Called exactly once per peer. The backend keeps `sink` for as long as
    /// it delivers notifications; dropping every clone tells the peer the link
    /// has gone away.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] when the notification stream cannot be enabled.
    fn subscribe(&self, sink: InboundSink) -> Result<(), LinkError>;

    /// Tear the connection down.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] if the backend fails to disconnect.
    async fn disconnect(&self) -> Result<(), LinkError> { Ok(()) }
}
