#![no_main]

use libfuzzer_sys::fuzz_target;
use tapsig_musig::{AggNonce, PubNonce};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a public nonce. Parsing must never panic, only
    // return Ok or Err.
    if let Ok(nonce) = PubNonce::from_bytes(data) {
        // A successful parse must round-trip byte-for-byte.
        let bytes = nonce.serialize();
        assert_eq!(PubNonce::from_bytes(&bytes).unwrap(), nonce);

        // The two layouts are identical; the aggregate parser must agree.
        let agg = AggNonce::from_bytes(&bytes).unwrap();
        assert_eq!(agg.serialize(), bytes);
    }
});
