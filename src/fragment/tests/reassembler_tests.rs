//! Tests for inbound reassembly, validation, and limits.

use std::num::NonZeroUsize;

use rstest::{fixture, rstest};

use crate::fragment::{FragmentError, LinkMtu, Reassembler, split};

#[fixture]
fn reassembler() -> Reassembler { Reassembler::new(LinkMtu::DEFAULT) }

#[rstest]
fn single_final_fragment_completes_immediately(mut reassembler: Reassembler) {
    let complete = reassembler
        .push(&[0x01, 1, 2, 3])
        .expect("fragment accepted")
        .expect("final fragment completes message");

    assert_eq!(complete.as_ref(), &[1, 2, 3]);
    assert_eq!(reassembler.buffered_len(), 0);
}

#[rstest]
fn continuation_fragments_accumulate(mut reassembler: Reassembler) {
    assert!(
        reassembler
            .push(&[0x00, 5, 6, 7])
            .expect("first fragment accepted")
            .is_none()
    );
    assert_eq!(reassembler.buffered_len(), 3);

    let complete = reassembler
        .push(&[0x01, 8, 9])
        .expect("final fragment accepted")
        .expect("message should complete");

    assert_eq!(complete.as_ref(), &[5, 6, 7, 8, 9]);
    assert_eq!(reassembler.buffered_len(), 0);
}

#[rstest]
fn empty_final_fragment_yields_empty_message(mut reassembler: Reassembler) {
    let complete = reassembler
        .push(&[0x01])
        .expect("fragment accepted")
        .expect("empty message must still complete");

    assert!(complete.is_empty());
}

#[rstest]
fn zero_length_packet_is_malformed(mut reassembler: Reassembler) {
    reassembler
        .push(&[0x00, 1])
        .expect("partial accepted");

    let err = reassembler.push(&[]).expect_err("empty packet must fail");

    assert_eq!(err, FragmentError::Malformed);
    assert_eq!(reassembler.buffered_len(), 1, "buffer left untouched");
}

#[rstest]
fn unknown_marker_is_rejected(mut reassembler: Reassembler) {
    let err = reassembler
        .push(&[0x02, 1])
        .expect_err("unknown marker must fail");

    assert_eq!(err, FragmentError::UnknownMarker { marker: 0x02 });
    assert_eq!(reassembler.buffered_len(), 0);
}

#[rstest]
fn oversized_packet_is_rejected(mut reassembler: Reassembler) {
    let packet = vec![0x01; 21];
    let err = reassembler
        .push(&packet)
        .expect_err("oversized packet must fail");

    assert_eq!(err, FragmentError::Oversized { len: 21, mtu: 20 });
}

#[test]
fn message_cap_discards_partial_message() {
    let limit = NonZeroUsize::new(4).expect("non-zero");
    let mut reassembler = Reassembler::new(LinkMtu::DEFAULT).with_max_message_size(Some(limit));

    assert!(
        reassembler
            .push(&[0x00, 1, 2, 3])
            .expect("first fragment within cap")
            .is_none()
    );
    let err = reassembler
        .push(&[0x01, 4, 5])
        .expect_err("growth beyond cap must fail");

    assert_eq!(
        err,
        FragmentError::MessageTooLarge {
            attempted: 5,
            limit,
        }
    );
    assert_eq!(reassembler.buffered_len(), 0);

    let next = reassembler
        .push(&[0x01, 9])
        .expect("next message accepted")
        .expect("next message completes");
    assert_eq!(next.as_ref(), &[9]);
}

#[test]
fn message_exactly_at_cap_is_accepted() {
    let limit = NonZeroUsize::new(25).expect("non-zero");
    let mut reassembler = Reassembler::new(LinkMtu::DEFAULT).with_max_message_size(Some(limit));
    let message = [3_u8; 25];

    let mut output = None;
    for fragment in split(&message, LinkMtu::DEFAULT) {
        output = reassembler.push(fragment.as_bytes()).expect("within cap");
    }

    assert_eq!(output.expect("message completes").len(), 25);
}

#[rstest]
fn buffer_resets_between_messages(mut reassembler: Reassembler) {
    let first = [1_u8; 30];
    let second = b"unrelated";

    let mut completed = Vec::new();
    for fragment in split(&first, LinkMtu::DEFAULT).chain(split(second, LinkMtu::DEFAULT)) {
        if let Some(message) = reassembler.push(fragment.as_bytes()).expect("accepted") {
            assert_eq!(reassembler.buffered_len(), 0);
            completed.push(message);
        }
    }

    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].as_ref(), &first);
    assert_eq!(completed[1].as_ref(), second);
}

#[rstest]
fn discard_partial_reports_dropped_bytes(mut reassembler: Reassembler) {
    reassembler.push(&[0x00, 1, 2]).expect("accepted");

    assert_eq!(reassembler.discard_partial(), 2);
    assert_eq!(reassembler.buffered_len(), 0);
    assert_eq!(reassembler.discard_partial(), 0);
}

#[rstest]
fn interleaved_messages_corrupt_silently(mut reassembler: Reassembler) {
    let a = [0xAA_u8; 30];
    let b = [0xBB_u8; 30];
    let a_fragments: Vec<_> = split(&a, LinkMtu::DEFAULT).collect();
    let b_fragments: Vec<_> = split(&b, LinkMtu::DEFAULT).collect();

    let mut completed = Vec::new();
    for fragment in [
        &a_fragments[0],
        &b_fragments[0],
        &a_fragments[1],
        &b_fragments[1],
    ] {
        if let Some(message) = reassembler
            .push(fragment.as_bytes())
            .expect("interleaving is not detectable")
        {
            completed.push(message);
        }
    }

    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].len(), 19 + 19 + 11);
    assert_ne!(completed[0].as_ref(), &a);
    assert_eq!(completed[1].as_ref(), &b[19..]);
}
