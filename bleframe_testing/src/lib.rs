//! Test utilities for exercising `bleframe` peers without a radio.
//!
//! [`RecordingLink`] stands in for a real packet link: it captures every
//! packet a peer transmits and lets the test push packets into the peer's
//! inbound path by hand.
//!
//! ```rust
//! use bleframe::{LinkConfig, Peer, PeerRole};
//! use bleframe_testing::RecordingLink;
//!
//! # async fn demo() -> bleframe::Result<()> {
//! let config = LinkConfig::default();
//! let link = RecordingLink::new(config.mtu);
//! let peer = Peer::new(link.clone(), PeerRole::Initiator, config)?;
//!
//! peer.write(b"hello").await?;
//! assert_eq!(link.sent().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod payloads;
pub mod recording;

pub use logging::{LoggerHandle, logger};
pub use payloads::{encode_fragments, patterned_payload};
pub use recording::RecordingLink;
