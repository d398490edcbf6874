//! Tagged SHA-256 (BIP-340 style) and the signature challenge.

use k256::Scalar;
use sha2::{Digest, Sha256};

use crate::point;

/// Commits to the full ordered signer set.
pub(crate) const TAG_KEYAGG_LIST: &[u8] = b"KeyAgg list";
/// Per-signer aggregation coefficient.
pub(crate) const TAG_KEYAGG_COEF: &[u8] = b"KeyAgg coefficient";
/// Deterministic two-nonce derivation.
pub(crate) const TAG_MUSIG_NONCE: &[u8] = b"MuSig/nonce";
/// BIP-340 challenge.
pub(crate) const TAG_CHALLENGE: &[u8] = b"BIP0340/challenge";

/// SHA-256 pre-keyed with `SHA256(tag) ‖ SHA256(tag)`.
pub(crate) fn tagged_hash(tag: &[u8]) -> Sha256 {
    let tag_hash = Sha256::digest(tag);
    let mut digest = Sha256::new();
    digest.update(tag_hash);
    digest.update(tag_hash);
    digest
}

/// `e = int(H_challenge(r ‖ pk ‖ msg)) mod n`.
pub(crate) fn challenge_scalar(
    fin_nonce: &[u8; 32],
    agg_pk32: &[u8; 32],
    msg32: &[u8; 32],
) -> Scalar {
    let digest: [u8; 32] = tagged_hash(TAG_CHALLENGE)
        .chain_update(fin_nonce)
        .chain_update(agg_pk32)
        .chain_update(msg32)
        .finalize()
        .into();
    point::reduce_scalar(&digest)
}
