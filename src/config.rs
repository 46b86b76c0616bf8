//! Link and peer configuration.
//!
//! [`LinkConfig`] bundles the parameters a [`Peer`](crate::peer::Peer) needs:
//! the link MTU, the depth of the pending-message queue, an optional cap on
//! reassembled message size, and the discovery timeout used by the initiator
//! role.

use std::{num::NonZeroUsize, time::Duration};

use thiserror::Error;

use crate::fragment::LinkMtu;

/// Default time the initiator waits for discovery to produce a link.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised when building configuration values.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The MTU cannot carry a marker byte plus payload.
    #[error("link mtu {mtu} is too small; at least {} bytes are required", LinkMtu::MIN)]
    MtuTooSmall { mtu: usize },
    /// The pending-message queue needs at least one slot.
    #[error("pending-message queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

/// Settings shared by both peer roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkConfig {
    /// Largest packet the link carries.
    pub mtu: LinkMtu,
    /// Completed messages that may wait for `read` before delivery blocks the
    /// link driver. One slot reproduces strict hand-off back-pressure.
    pub queue_capacity: NonZeroUsize,
    /// Optional cap on a single reassembled message.
    pub max_message_size: Option<NonZeroUsize>,
    /// Upper bound on the initiator's discovery phase.
    pub discovery_timeout: Duration,
}

impl LinkConfig {
    /// Configuration matching the default 20 byte link.
    pub const DEFAULT: Self = Self {
        mtu: LinkMtu::DEFAULT,
        queue_capacity: NonZeroUsize::MIN,
        max_message_size: None,
        discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
    };

    /// Replace the MTU.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MtuTooSmall`] if `mtu` is below [`LinkMtu::MIN`].
    pub fn with_mtu(mut self, mtu: usize) -> Result<Self, ConfigError> {
        self.mtu = LinkMtu::new(mtu)?;
        Ok(self)
    }

    /// Replace the pending-message queue depth.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroQueueCapacity`] when `capacity` is zero.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        self.queue_capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroQueueCapacity)?;
        Ok(self)
    }

    /// Cap reassembled messages at `limit` bytes; `None` removes the cap.
    #[must_use]
    pub fn with_max_message_size(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Replace the discovery timeout.
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self { Self::DEFAULT }
}
