//! Validated link packet size.

use std::{fmt, num::NonZeroUsize};

use super::{DEFAULT_LINK_MTU, MARKER_LEN};
use crate::config::ConfigError;

/// Largest packet the link carries, in bytes.
///
/// The value always leaves room for the marker byte plus at least one payload
/// byte, so fragmenting any message terminates.
///
/// # Examples
///
/// ```
/// use bleframe::fragment::LinkMtu;
/// let mtu = LinkMtu::new(20).expect("valid mtu");
/// assert_eq!(mtu.payload_capacity().get(), 19);
/// assert!(LinkMtu::new(1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkMtu(NonZeroUsize);

impl LinkMtu {
    /// Smallest MTU that can carry payload.
    pub const MIN: usize = MARKER_LEN + 1;

    /// The MTU of the default link.
    pub const DEFAULT: Self = match NonZeroUsize::new(DEFAULT_LINK_MTU) {
        Some(mtu) => Self(mtu),
        None => unreachable!(),
    };

    /// Validate `mtu`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MtuTooSmall`] when `mtu` cannot hold the marker
    /// byte and one payload byte.
    pub const fn new(mtu: usize) -> Result<Self, ConfigError> {
        if mtu < Self::MIN {
            return Err(ConfigError::MtuTooSmall { mtu });
        }
        match NonZeroUsize::new(mtu) {
            Some(mtu) => Ok(Self(mtu)),
            None => Err(ConfigError::MtuTooSmall { mtu }),
        }
    }

    /// Return the MTU in bytes.
    #[must_use]
    pub const fn get(self) -> usize { self.0.get() }

    /// Payload bytes available in each fragment after the marker.
    #[must_use]
    pub const fn payload_capacity(self) -> NonZeroUsize {
        match NonZeroUsize::new(self.0.get() - MARKER_LEN) {
            Some(capacity) => capacity,
            None => unreachable!(),
        }
    }
}

impl Default for LinkMtu {
    fn default() -> Self { Self::DEFAULT }
}

impl fmt::Display for LinkMtu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<usize> for LinkMtu {
    type Error = ConfigError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { Self::new(value) }
}
