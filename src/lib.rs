#![doc(html_root_url = "https://docs.rs/bleframe/latest")]
//! Public API for the `bleframe` library.
//!
//! This crate turns a low-MTU, notification-based packet link (such as a BLE
//! characteristic pair) into a message-oriented peer. Outbound messages are
//! split into marker-tagged fragments that fit the link; inbound fragments are
//! reassembled and handed to readers through a bounded queue.
//!
//! ```
//! use bleframe::{LinkConfig, MemoryLink, Peer, PeerRole};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bleframe::Result<()> {
//! let config = LinkConfig::default();
//! let (a, b) = MemoryLink::pair(config.mtu);
//! let initiator = Peer::new(a, PeerRole::Initiator, config)?;
//! let acceptor = Peer::new(b, PeerRole::Acceptor, config)?;
//!
//! initiator.write(b"a message longer than a single twenty byte packet").await?;
//! let message = acceptor.read().await?;
//! assert_eq!(&message[..], b"a message longer than a single twenty byte packet");
//! # Ok(())
//! # }
//! ```

pub mod acceptor;
pub mod config;
pub mod error;
pub mod fragment;
pub mod initiator;
pub mod link;
pub mod message;
pub mod metrics;
pub mod peer;

pub use acceptor::{Acceptor, AcceptorHandle, ConnectOutcome, ConnectionId};
pub use config::{ConfigError, LinkConfig};
pub use error::{PeerError, Result};
pub use fragment::{
    DEFAULT_LINK_MTU,
    Fragment,
    FragmentError,
    Fragments,
    LinkMtu,
    MARKER_CONTINUATION,
    MARKER_FINAL,
    MessageAssembler,
    Reassembler,
    split,
};
pub use initiator::{Discovery, Initiator};
pub use link::{DeliverError, InboundSink, LinkError, MemoryDiscovery, MemoryLink, PacketLink};
pub use message::Message;
pub use peer::{Peer, PeerRole};
