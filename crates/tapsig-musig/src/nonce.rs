//! Round one: nonce generation and aggregation.
//!
//! Every signer derives a pair of secret nonce scalars (k₁, k₂) and
//! publishes the matching point pair (k₁·G, k₂·G); a combiner sums the
//! published pairs coordinate-wise. The secret pair is strictly one-shot:
//! [`crate::partial_sign`] consumes and wipes it.

use core::fmt;

use k256::elliptic_curve::group::Group;
use k256::{AffinePoint, ProjectivePoint, Scalar};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::hashes::{self, TAG_MUSIG_NONCE};
use crate::keyagg::KeyAggCache;
use crate::{point, MusigError};

/// Wire size of [`PubNonce`] and [`AggNonce`]: two compressed points.
pub const NONCE_SERIALIZED_SIZE: usize = 66;

// ─── Secret nonces ──────────────────────────────────────────────────────────

/// One-shot secret nonce pair.
///
/// CRITICAL: a `SecNonce` must feed exactly one `partial_sign` call.
/// Producing two partial signatures from the same pair reveals the secret
/// key. The type is neither `Clone` nor `Copy`; signing wipes it in place,
/// so any second use fails with [`MusigError::SecNonceReused`].
pub struct SecNonce {
    k1: Scalar,
    k2: Scalar,
    alive: bool,
}

impl SecNonce {
    /// Hand out the scalars exactly once, wiping the nonce in the same
    /// breath so no fallible step can run between read and erase.
    pub(crate) fn take_scalars(
        &mut self,
    ) -> Result<(Zeroizing<Scalar>, Zeroizing<Scalar>), MusigError> {
        if !self.alive || self.k1 == Scalar::ZERO || self.k2 == Scalar::ZERO {
            return Err(MusigError::SecNonceReused);
        }
        let k1 = Zeroizing::new(self.k1);
        let k2 = Zeroizing::new(self.k2);
        self.wipe();
        Ok((k1, k2))
    }

    fn wipe(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.alive = false;
    }
}

impl Drop for SecNonce {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl fmt::Debug for SecNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The scalars never appear in debug output.
        f.debug_struct("SecNonce")
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

// ─── Public nonces ──────────────────────────────────────────────────────────

/// A signer's public nonce pair (R₁, R₂); both points always finite.
#[derive(Clone, Copy, Debug)]
pub struct PubNonce {
    r1: AffinePoint,
    r2: AffinePoint,
}

impl PubNonce {
    pub fn serialize(&self) -> [u8; NONCE_SERIALIZED_SIZE] {
        serialize_nonce_points(&self.r1, &self.r2)
    }

    /// Parse 66 bytes of `ser₃₃(R₁) ‖ ser₃₃(R₂)`. Rejects wrong lengths,
    /// off-curve points, and the point at infinity.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MusigError> {
        let (r1, r2) = parse_nonce_points(bytes)?;
        Ok(Self { r1, r2 })
    }

    pub(crate) fn points(&self) -> (AffinePoint, AffinePoint) {
        (self.r1, self.r2)
    }
}

impl PartialEq for PubNonce {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for PubNonce {}

// ─── Nonce aggregation ──────────────────────────────────────────────────────

/// Coordinate-wise sum of all signers' public nonces. Same wire layout as
/// [`PubNonce`].
#[derive(Clone, Copy, Debug)]
pub struct AggNonce {
    r1: AffinePoint,
    r2: AffinePoint,
}

impl AggNonce {
    /// Sum the signers' nonces.
    ///
    /// Either coordinate summing to infinity is a hard failure; crafted
    /// nonces can force it, and the only sound response is to restart the
    /// round with fresh nonces from everyone.
    pub fn sum(pubnonces: &[PubNonce]) -> Result<Self, MusigError> {
        if pubnonces.is_empty() {
            return Err(MusigError::EmptyNonceList);
        }
        let mut sum1 = ProjectivePoint::IDENTITY;
        let mut sum2 = ProjectivePoint::IDENTITY;
        for nonce in pubnonces {
            sum1 += ProjectivePoint::from(nonce.r1);
            sum2 += ProjectivePoint::from(nonce.r2);
        }
        if bool::from(sum1.is_identity()) || bool::from(sum2.is_identity()) {
            return Err(MusigError::NonceSumInfinity);
        }
        Ok(Self {
            r1: sum1.to_affine(),
            r2: sum2.to_affine(),
        })
    }

    pub fn serialize(&self) -> [u8; NONCE_SERIALIZED_SIZE] {
        serialize_nonce_points(&self.r1, &self.r2)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MusigError> {
        let (r1, r2) = parse_nonce_points(bytes)?;
        Ok(Self { r1, r2 })
    }

    pub(crate) fn points(&self) -> (AffinePoint, AffinePoint) {
        (self.r1, self.r2)
    }
}

impl PartialEq for AggNonce {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for AggNonce {}

fn serialize_nonce_points(r1: &AffinePoint, r2: &AffinePoint) -> [u8; NONCE_SERIALIZED_SIZE] {
    let mut out = [0u8; NONCE_SERIALIZED_SIZE];
    out[..33].copy_from_slice(&point::serialize_compressed(r1));
    out[33..].copy_from_slice(&point::serialize_compressed(r2));
    out
}

fn parse_nonce_points(bytes: &[u8]) -> Result<(AffinePoint, AffinePoint), MusigError> {
    let bytes: &[u8; NONCE_SERIALIZED_SIZE] =
        bytes.try_into().map_err(|_| MusigError::InvalidPubNonce)?;
    let mut halves = [[0u8; 33]; 2];
    halves[0].copy_from_slice(&bytes[..33]);
    halves[1].copy_from_slice(&bytes[33..]);
    let r1 = point::parse_compressed(&halves[0]).ok_or(MusigError::InvalidPubNonce)?;
    let r2 = point::parse_compressed(&halves[1]).ok_or(MusigError::InvalidPubNonce)?;
    Ok((r1, r2))
}

// ─── Generation ─────────────────────────────────────────────────────────────

/// Derive a fresh secret/public nonce pair for one signing session.
///
/// `session_id` must be unique on every call: uniformly random (see
/// [`random_session_id`]) if `seckey` is not supplied; a never-repeating
/// counter is acceptable when it is. Binding the optional secret key,
/// message, aggregate key, and extra input limits the blast radius of a
/// bad session id, but none of them make repetition safe.
pub fn nonce_gen(
    session_id: &[u8; 32],
    seckey: Option<&[u8; 32]>,
    msg32: Option<&[u8; 32]>,
    keyagg_cache: Option<&KeyAggCache>,
    extra_input: Option<&[u8; 32]>,
) -> Result<(SecNonce, PubNonce), MusigError> {
    if let Some(sk) = seckey {
        // Reject keys that could never sign, before they shape the nonce.
        point::parse_scalar(sk)
            .filter(|s| *s != Scalar::ZERO)
            .ok_or(MusigError::InvalidSecretKey)?;
    }
    let agg_pk32 = keyagg_cache.map(|cache| point::xonly_bytes(cache.pk()));

    let mut sha = hashes::tagged_hash(TAG_MUSIG_NONCE);
    sha.update(session_id);
    for field in [seckey, agg_pk32.as_ref(), msg32, extra_input] {
        match field {
            Some(bytes) => {
                sha.update([1u8]);
                sha.update(bytes);
            }
            None => sha.update([0u8]),
        }
    }
    let seed = Zeroizing::new(<[u8; 32]>::from(sha.finalize()));

    let mut scalars = [Scalar::ZERO; 2];
    for (i, k) in scalars.iter_mut().enumerate() {
        let digest = Zeroizing::new(<[u8; 32]>::from(
            Sha256::new()
                .chain_update(*seed)
                .chain_update([i as u8])
                .finalize(),
        ));
        *k = point::reduce_scalar(&digest);
        if *k == Scalar::ZERO {
            // Unreachable for honest inputs, fatal if it ever happens.
            scalars.zeroize();
            return Err(MusigError::ZeroNonce);
        }
    }

    let pubnonce = PubNonce {
        r1: (ProjectivePoint::GENERATOR * scalars[0]).to_affine(),
        r2: (ProjectivePoint::GENERATOR * scalars[1]).to_affine(),
    };
    let secnonce = SecNonce {
        k1: scalars[0],
        k2: scalars[1],
        alive: true,
    };
    scalars.zeroize();
    Ok((secnonce, pubnonce))
}

/// 32 uniform bytes from the operating-system RNG, suitable as a
/// [`nonce_gen`] session id.
pub fn random_session_id() -> [u8; 32] {
    let mut id = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut id);
    id
}
