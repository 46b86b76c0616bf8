use std::fmt;

/// Which side of the connection a peer represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeerRole {
    /// The side that discovered and connected to the remote device.
    Initiator,
    /// The side that advertised and accepted the connection.
    Acceptor,
}

impl PeerRole {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PeerRole::Initiator => "initiator",
            PeerRole::Acceptor => "acceptor",
        }
    }
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
