//! Key aggregation with rogue-key-resistant coefficients, plus the BIP-341
//! x-only tweak.

use k256::elliptic_curve::group::Group;
use k256::{AffinePoint, ProjectivePoint, Scalar};
use sha2::Digest;

use crate::hashes::{self, TAG_KEYAGG_COEF, TAG_KEYAGG_LIST};
use crate::keys::{PublicKey, XOnlyPublicKey};
use crate::{point, MusigError};

/// Per-signer-set aggregation state.
///
/// Carries the aggregate point, the hash committing to the ordered key
/// list, the "second distinct key" slot (whose coefficient is 1), and the
/// tweak bookkeeping the signing equations need to undo x-only
/// normalization.
///
/// Aggregation is order-sensitive: permuting the key list changes the
/// aggregate key. Cosigners that must derive the same key independently
/// should sort the x-only keys lexicographically first.
#[derive(Clone, Debug)]
pub struct KeyAggCache {
    /// Aggregate point; replaced by the tweaked point once tweaked.
    pk: AffinePoint,
    /// x of the first listed key that differs from the first key.
    second_pk_x: Option<[u8; 32]>,
    pk_hash: [u8; 32],
    is_tweaked: bool,
    tweak: Scalar,
    /// Whether the pre-tweak aggregate had odd y.
    internal_key_parity: bool,
}

impl KeyAggCache {
    /// Aggregate an ordered, non-empty list of x-only public keys.
    pub fn aggregate(pubkeys: &[XOnlyPublicKey]) -> Result<Self, MusigError> {
        if pubkeys.is_empty() {
            return Err(MusigError::EmptyKeyList);
        }

        let mut list = hashes::tagged_hash(TAG_KEYAGG_LIST);
        for pubkey in pubkeys {
            list.update(pubkey.serialize());
        }
        let pk_hash: [u8; 32] = list.finalize().into();

        let first = pubkeys[0].serialize();
        let second_pk_x = pubkeys[1..]
            .iter()
            .map(|pubkey| pubkey.serialize())
            .find(|ser| *ser != first);

        let mut acc = ProjectivePoint::IDENTITY;
        for pubkey in pubkeys {
            let coef = keyagg_coef(&pk_hash, second_pk_x.as_ref(), &pubkey.serialize());
            acc += ProjectivePoint::from(*pubkey.point()) * coef;
        }
        if bool::from(acc.is_identity()) {
            return Err(MusigError::AggregateKeyInfinity);
        }
        let pk = acc.to_affine();

        Ok(Self {
            internal_key_parity: point::has_odd_y(&pk),
            pk,
            second_pk_x,
            pk_hash,
            is_tweaked: false,
            tweak: Scalar::ZERO,
        })
    }

    /// The aggregate key signatures verify against: x(|pk|).
    pub fn agg_pk(&self) -> XOnlyPublicKey {
        XOnlyPublicKey::from_even_y_point(point::even_y(&self.pk))
    }

    /// Apply one additive x-only tweak: pk ← |pk| + t·G.
    ///
    /// At most one tweak per cache. The pre-tweak parity stays recorded so
    /// the signing and verification equations can flip scalars correctly.
    /// Returns the full tweaked key, parity included.
    pub fn pubkey_tweak_add(&mut self, tweak32: &[u8; 32]) -> Result<PublicKey, MusigError> {
        if self.is_tweaked {
            return Err(MusigError::AlreadyTweaked);
        }
        let tweak = point::parse_scalar(tweak32)
            .filter(|t| *t != Scalar::ZERO)
            .ok_or(MusigError::InvalidTweak)?;

        let tweaked =
            ProjectivePoint::from(point::even_y(&self.pk)) + ProjectivePoint::GENERATOR * tweak;
        if bool::from(tweaked.is_identity()) {
            return Err(MusigError::TweakCancelsKey);
        }

        self.pk = tweaked.to_affine();
        self.is_tweaked = true;
        self.tweak = tweak;
        Ok(PublicKey::from_point(self.pk))
    }

    /// KeyAgg coefficient μ for the signer whose x-only form is `x32`.
    pub(crate) fn keyagg_coef(&self, x32: &[u8; 32]) -> Scalar {
        keyagg_coef(&self.pk_hash, self.second_pk_x.as_ref(), x32)
    }

    pub(crate) fn pk(&self) -> &AffinePoint {
        &self.pk
    }

    pub(crate) fn agg_pk_has_odd_y(&self) -> bool {
        point::has_odd_y(&self.pk)
    }

    pub(crate) fn is_tweaked(&self) -> bool {
        self.is_tweaked
    }

    pub(crate) fn tweak(&self) -> Scalar {
        self.tweak
    }

    pub(crate) fn internal_key_parity(&self) -> bool {
        self.internal_key_parity
    }
}

/// μᵢ = 1 for keys matching the second distinct key, hashed otherwise.
/// When every input key is identical there is no second distinct key and
/// every coefficient is hashed (no x coordinate is ever zero).
fn keyagg_coef(pk_hash: &[u8; 32], second_pk_x: Option<&[u8; 32]>, x32: &[u8; 32]) -> Scalar {
    if second_pk_x == Some(x32) {
        return Scalar::ONE;
    }
    let digest: [u8; 32] = hashes::tagged_hash(TAG_KEYAGG_COEF)
        .chain_update(pk_hash)
        .chain_update(x32)
        .finalize()
        .into();
    point::reduce_scalar(&digest)
}
