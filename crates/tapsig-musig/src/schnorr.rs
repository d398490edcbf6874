//! BIP-340 verification for the aggregate output.
//!
//! Single-party BIP-340 signing is deliberately absent; this engine only
//! ever signs cooperatively. Verification is here so callers can validate
//! what [`crate::partial_sig_agg`] produced before publishing it.

use k256::elliptic_curve::group::Group;
use k256::ProjectivePoint;

use crate::keys::XOnlyPublicKey;
use crate::{hashes, point};

/// Verify a 64-byte signature `x(R) ‖ s` over `msg32` under an x-only key.
pub fn verify(sig64: &[u8; 64], msg32: &[u8; 32], pubkey: &XOnlyPublicKey) -> bool {
    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&sig64[..32]);
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&sig64[32..]);

    let s = match point::parse_scalar(&s_bytes) {
        Some(s) => s,
        None => return false,
    };
    let e = hashes::challenge_scalar(&r_bytes, &pubkey.serialize(), msg32);

    // R = s·G − e·P; valid iff R is finite with even y and x(R) = r.
    let r = ProjectivePoint::GENERATOR * s + ProjectivePoint::from(*pubkey.point()) * (-e);
    if bool::from(r.is_identity()) {
        return false;
    }
    let r = r.to_affine();
    !point::has_odd_y(&r) && point::xonly_bytes(&r) == r_bytes
}
