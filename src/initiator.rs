//! Connection-initiating role.
//!
//! The initiator runs an external [`Discovery`] collaborator (scan, connect,
//! enumerate characteristics, enable notifications) under a timeout, then
//! wraps the resulting link in a [`Peer`].

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    config::LinkConfig,
    error::{PeerError, Result},
    link::{LinkError, PacketLink},
    metrics,
    peer::{Peer, PeerRole},
};

/// Produces a connected link for the initiator role.
#[async_trait]
pub trait Discovery: Send {
    /// Link type yielded once discovery succeeds.
    type Link: PacketLink;

    /// Find the remote device and establish a link to it.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError`] when the device cannot be found or connected.
    async fn discover(&mut self) -> Result<Self::Link, LinkError>;
}

/// Builds initiator-role peers.
#[derive(Clone, Copy, Debug, Default)]
pub struct Initiator {
    config: LinkConfig,
}

impl Initiator {
    /// Create an initiator using `config`.
    #[must_use]
    pub const fn new(config: LinkConfig) -> Self { Self { config } }

    /// Return the configuration applied to new peers.
    #[must_use]
    pub const fn config(&self) -> &LinkConfig { &self.config }

    /// Run `discovery` and wrap the link it yields.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Timeout`] if discovery exceeds
    /// [`LinkConfig::discovery_timeout`], [`PeerError::Link`] if discovery or
    /// subscription fails.
    pub async fn connect<D: Discovery>(&self, mut discovery: D) -> Result<Peer<D::Link>> {
        let limit = self.config.discovery_timeout;
        info!(timeout = ?limit, "discovering link");

        let link = match tokio::time::timeout(limit, discovery.discover()).await {
            Ok(Ok(link)) => link,
            Ok(Err(err)) => {
                metrics::inc_errors("discovery");
                warn!(error = %err, "discovery failed");
                return Err(PeerError::Link(err));
            }
            Err(_) => {
                metrics::inc_errors("timeout");
                warn!(timeout = ?limit, "discovery timed out");
                return Err(PeerError::Timeout(limit));
            }
        };

        Peer::new(link, PeerRole::Initiator, self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::link::{MemoryDiscovery, MemoryLink};

    struct NeverFound;

    #[async_trait]
    impl Discovery for NeverFound {
        type Link = MemoryLink;

        async fn discover(&mut self) -> Result<Self::Link, LinkError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_times_out() {
        let config = LinkConfig::default().with_discovery_timeout(Duration::from_secs(10));
        let err = Initiator::new(config)
            .connect(NeverFound)
            .await
            .expect_err("discovery never completes");

        assert!(matches!(err, PeerError::Timeout(limit) if limit == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn discovery_failure_is_surfaced() {
        let (link, _remote) = MemoryLink::pair(LinkConfig::DEFAULT.mtu);
        let mut discovery = MemoryDiscovery::new(link);
        let _ = discovery.discover().await.expect("first discovery yields the link");

        let err = Initiator::default()
            .connect(discovery)
            .await
            .expect_err("link already handed out");
        assert!(matches!(err, PeerError::Link(LinkError::Disconnected)));
    }

    #[tokio::test]
    async fn discovered_link_becomes_initiator_peer() {
        let (link, _remote) = MemoryLink::pair(LinkConfig::DEFAULT.mtu);
        let peer = Initiator::default()
            .connect(MemoryDiscovery::new(link))
            .await
            .expect("connects");

        assert_eq!(peer.role(), PeerRole::Initiator);
        assert!(!peer.is_closed());
    }
}
