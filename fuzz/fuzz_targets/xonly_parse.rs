#![no_main]

use libfuzzer_sys::fuzz_target;
use tapsig_musig::XOnlyPublicKey;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as an x-only public key. Must never panic; accepted
    // keys must round-trip.
    if let Ok(bytes) = <[u8; 32]>::try_from(data) {
        if let Ok(pubkey) = XOnlyPublicKey::from_bytes(&bytes) {
            assert_eq!(pubkey.serialize(), bytes);
        }
    }
});
