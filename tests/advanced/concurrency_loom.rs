#![cfg(all(feature = "advanced-tests", loom))]
//! Concurrency tests for the shared fragmentation engine using loom.
//!
//! `MessageAssembler` swaps to `loom::sync::Mutex` under `cfg(loom)`, letting
//! loom explore every interleaving of concurrent feeds, splits and discards.

use bleframe::{LinkMtu, MessageAssembler};
use loom::{model, sync::Arc, thread};

#[test]
fn concurrent_single_fragment_feeds_each_complete() {
    model(|| {
        let assembler = Arc::new(MessageAssembler::new(LinkMtu::DEFAULT));
        let a = Arc::clone(&assembler);
        let b = Arc::clone(&assembler);

        let t1 = thread::spawn(move || a.feed(&[0x01, b'a']).expect("feed a"));
        let t2 = thread::spawn(move || b.feed(&[0x01, b'b']).expect("feed b"));

        let first = t1.join().expect("first feeder panicked");
        let second = t2.join().expect("second feeder panicked");

        assert_eq!(first.as_deref(), Some(b"a".as_slice()));
        assert_eq!(second.as_deref(), Some(b"b".as_slice()));
        assert_eq!(assembler.buffered_len(), 0);
    });
}

#[test]
fn discard_races_with_multi_fragment_feed() {
    model(|| {
        let assembler = Arc::new(MessageAssembler::new(LinkMtu::DEFAULT));
        let feeder = Arc::clone(&assembler);
        let discarder = Arc::clone(&assembler);

        let t1 = thread::spawn(move || {
            assert!(feeder.feed(&[0x00, 1, 2]).expect("continuation").is_none());
            feeder.feed(&[0x01, 3]).expect("final")
        });
        let t2 = thread::spawn(move || discarder.discard_partial());

        let message = t1.join().expect("feeder panicked").expect("final marker completes");
        let dropped = t2.join().expect("discarder panicked");

        match dropped {
            0 => assert_eq!(&message[..], &[1, 2, 3]),
            2 => assert_eq!(&message[..], &[3]),
            other => panic!("unexpected discard of {other} bytes"),
        }
        assert_eq!(assembler.buffered_len(), 0);
    });
}

#[test]
fn split_does_not_disturb_concurrent_feed() {
    model(|| {
        let assembler = Arc::new(MessageAssembler::new(LinkMtu::DEFAULT));
        let writer = Arc::clone(&assembler);
        let reader = Arc::clone(&assembler);

        let t1 = thread::spawn(move || writer.chunk(&[9; 30]).count());
        let t2 = thread::spawn(move || {
            reader.feed(&[0x00, 4]).expect("continuation");
            reader.feed(&[0x01, 5]).expect("final")
        });

        assert_eq!(t1.join().expect("splitter panicked"), 2);
        let message = t2.join().expect("feeder panicked");
        assert_eq!(message.as_deref(), Some([4, 5].as_slice()));
    });
}
