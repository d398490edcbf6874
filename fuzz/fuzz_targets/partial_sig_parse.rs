#![no_main]

use libfuzzer_sys::fuzz_target;
use tapsig_musig::PartialSig;

fuzz_target!(|data: &[u8]| {
    // PartialSig::from_bytes must never panic, and anything it accepts
    // must serialize back to the same 32 bytes.
    if let Ok(bytes) = <[u8; 32]>::try_from(data) {
        if let Ok(sig) = PartialSig::from_bytes(&bytes) {
            assert_eq!(sig.serialize(), bytes);
        }
    }
});
