//! Typed application messages carried over a peer.
//!
//! Peers move raw byte messages. [`Message`] adds a bincode layer on top so
//! applications can exchange structured values with
//! [`Peer::write_message`](crate::peer::Peer::write_message) and
//! [`Peer::read_message`](crate::peer::Peer::read_message).

use bincode::{
    BorrowDecode,
    Encode,
    borrow_decode_from_slice,
    config,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};

/// Values that can be sent as a single peer message.
///
/// Implemented for every type deriving [`Encode`] and [`BorrowDecode`].
///
/// # Examples
///
/// ```
/// use bincode::{BorrowDecode, Encode};
/// use bleframe::message::Message;
///
/// #[derive(Debug, PartialEq, Encode, BorrowDecode)]
/// struct Ping(u32);
///
/// let bytes = Ping(7).to_bytes().expect("encode");
/// let (decoded, _) = Ping::from_bytes(&bytes).expect("decode");
/// assert_eq!(decoded, Ping(7));
/// ```
pub trait Message: Encode + for<'de> BorrowDecode<'de, ()> {
    /// Serialise the value with bincode's standard configuration.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialisation fails.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> { encode_to_vec(self, config::standard()) }

    /// Deserialise a value, returning it with the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if `bytes` is not a valid encoding.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), DecodeError>
    where
        Self: Sized,
    {
        borrow_decode_from_slice(bytes, config::standard())
    }
}

impl<T> Message for T where for<'de> T: Encode + BorrowDecode<'de, ()> {}
