//! Session processing: binding the aggregate nonce, message, aggregate key
//! and optional adaptor point into the round-two coefficients.

use k256::elliptic_curve::group::Group;
use k256::{ProjectivePoint, Scalar};
use sha2::{Digest, Sha256};

use crate::keyagg::KeyAggCache;
use crate::keys::PublicKey;
use crate::nonce::AggNonce;
use crate::{hashes, point, MusigError};

/// Everything round two needs: the final nonce and its parity, the binding
/// coefficient b, the challenge e, and the tweak contribution s_part that
/// the aggregator folds into the signature.
#[derive(Clone, Copy, Debug)]
pub struct Session {
    fin_nonce_parity: bool,
    fin_nonce: [u8; 32],
    noncecoef: Scalar,
    challenge: Scalar,
    s_part: Scalar,
}

impl Session {
    /// Combine the aggregate nonce with the message and aggregate key,
    /// optionally injecting an adaptor point T into R₁.
    pub fn process(
        aggnonce: &AggNonce,
        msg32: &[u8; 32],
        keyagg_cache: &KeyAggCache,
        adaptor: Option<&PublicKey>,
    ) -> Result<Self, MusigError> {
        let agg_pk32 = point::xonly_bytes(keyagg_cache.pk());

        let (r1_affine, r2_affine) = aggnonce.points();
        let mut r1 = ProjectivePoint::from(r1_affine);
        let r2 = ProjectivePoint::from(r2_affine);
        if let Some(adaptor) = adaptor {
            r1 += ProjectivePoint::from(*adaptor.point());
        }
        if bool::from(r1.is_identity()) {
            // Only reachable with an adaptor crafted against the nonces.
            return Err(MusigError::NonceSumInfinity);
        }

        // Binding coefficient. Deliberately a bare SHA-256, not a tagged
        // hash: the wire peers this engine interoperates with hash it the
        // same way.
        let noncehash: [u8; 32] = Sha256::new()
            .chain_update(point::serialize_compressed(&r1.to_affine()))
            .chain_update(point::serialize_compressed(&r2_affine))
            .chain_update(agg_pk32)
            .chain_update(msg32)
            .finalize()
            .into();
        let noncecoef = point::reduce_scalar(&noncehash);

        // R = R₁ + b·R₂
        let fin = r1 + r2 * noncecoef;
        if bool::from(fin.is_identity()) {
            return Err(MusigError::FinalNonceInfinity);
        }
        let fin_affine = fin.to_affine();
        let fin_nonce = point::xonly_bytes(&fin_affine);
        let fin_nonce_parity = point::has_odd_y(&fin_affine);

        let challenge = hashes::challenge_scalar(&fin_nonce, &agg_pk32, msg32);

        // A tweaked aggregate key owes e·t to the signature; no single
        // signer's secret covers it, so the session carries it for the
        // aggregator. Negated when the tweaked aggregate was itself
        // flipped to even y.
        let mut s_part = Scalar::ZERO;
        if keyagg_cache.is_tweaked() {
            let mut e_tweak = challenge * keyagg_cache.tweak();
            if keyagg_cache.agg_pk_has_odd_y() {
                e_tweak = -e_tweak;
            }
            s_part = e_tweak;
        }

        Ok(Self {
            fin_nonce_parity,
            fin_nonce,
            noncecoef,
            challenge,
            s_part,
        })
    }

    /// Parity of the final nonce point R. Adaptor workflows must carry it
    /// into [`crate::adaptor::adapt`] and
    /// [`crate::adaptor::extract_adaptor`].
    pub fn nonce_parity(&self) -> bool {
        self.fin_nonce_parity
    }

    pub(crate) fn fin_nonce(&self) -> &[u8; 32] {
        &self.fin_nonce
    }

    pub(crate) fn noncecoef(&self) -> Scalar {
        self.noncecoef
    }

    pub(crate) fn challenge(&self) -> Scalar {
        self.challenge
    }

    pub(crate) fn s_part(&self) -> Scalar {
        self.s_part
    }
}
