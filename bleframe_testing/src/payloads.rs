//! Payload builders shared by the integration suites.

use bleframe::{LinkMtu, split};
use bytes::Bytes;

/// Deterministic payload of `len` bytes cycling through `0..=250`.
#[must_use]
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect()
}

/// Encode `message` into the packets a peer would transmit on `mtu`.
#[must_use]
pub fn encode_fragments(message: &[u8], mtu: LinkMtu) -> Vec<Bytes> {
    split(message, mtu).map(bleframe::Fragment::into_bytes).collect()
}

#[cfg(test)]
mod tests {
    use bleframe::{LinkMtu, MARKER_CONTINUATION, MARKER_FINAL};

    use super::{encode_fragments, patterned_payload};

    #[test]
    fn pattern_cycles_every_251_bytes() {
        let payload = patterned_payload(600);
        assert_eq!(payload.len(), 600);
        assert_eq!(payload[251], 0);
        assert_eq!(payload[250], 250);
    }

    #[test]
    fn fragments_carry_expected_markers() {
        let packets = encode_fragments(&patterned_payload(40), LinkMtu::DEFAULT);
        let markers: Vec<u8> = packets.iter().map(|p| p[0]).collect();
        assert_eq!(
            markers,
            vec![MARKER_CONTINUATION, MARKER_CONTINUATION, MARKER_FINAL]
        );
        assert_eq!(packets[2].len(), 3);
    }
}
