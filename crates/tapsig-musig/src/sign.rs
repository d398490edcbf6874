//! Round two: producing, checking, and aggregating partial signatures.

use k256::elliptic_curve::group::Group;
use k256::{ProjectivePoint, Scalar};
use zeroize::Zeroizing;

use crate::keyagg::KeyAggCache;
use crate::keys::{Keypair, XOnlyPublicKey};
use crate::nonce::{PubNonce, SecNonce};
use crate::session::Session;
use crate::{point, MusigError};

/// One signer's share of the final signature scalar, below the curve order
/// by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialSig {
    s: Scalar,
}

impl PartialSig {
    pub fn serialize(&self) -> [u8; 32] {
        self.s.to_bytes().into()
    }

    /// Parse a 32-byte big-endian scalar; rejects values ≥ the curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, MusigError> {
        point::parse_scalar(bytes)
            .map(|s| Self { s })
            .ok_or(MusigError::ScalarOverflow)
    }

    pub(crate) fn scalar(&self) -> Scalar {
        self.s
    }
}

/// Whether a scalar enters an equation as-is or negated to compensate for
/// even-y normalization somewhere in the key pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScalarSign {
    Keep,
    Negate,
}

impl ScalarSign {
    fn from_odd(odd: bool) -> Self {
        if odd {
            Self::Negate
        } else {
            Self::Keep
        }
    }

    pub(crate) fn apply(self, s: Scalar) -> Scalar {
        match self {
            Self::Keep => s,
            Self::Negate => -s,
        }
    }
}

/// Sign of the signer's secret key in the partial-signature equation.
///
/// Three independent normalizations can each flip the effective secret
/// once: the signer's own point, the (possibly tweaked) aggregate point,
/// and, only when a tweak was applied, the pre-tweak internal key.
fn seckey_sign(signer_pk_odd: bool, cache: &KeyAggCache) -> ScalarSign {
    parity_flips(
        signer_pk_odd,
        cache.agg_pk_has_odd_y(),
        cache.is_tweaked() && cache.internal_key_parity(),
    )
}

/// Sign of the challenge term in partial verification. The signer's own
/// parity is absent because the verifier works with the even-y form of the
/// signer's key.
fn challenge_sign(cache: &KeyAggCache) -> ScalarSign {
    parity_flips(
        false,
        cache.agg_pk_has_odd_y(),
        cache.is_tweaked() && cache.internal_key_parity(),
    )
}

fn parity_flips(a: bool, b: bool, c: bool) -> ScalarSign {
    ScalarSign::from_odd(a ^ b ^ c)
}

/// Produce this signer's partial signature, consuming the secret nonce.
///
/// The nonce scalars are copied out and the `SecNonce` wiped before any
/// fallible step runs. A retry after ANY failure, like any later call with
/// the same nonce, fails with [`MusigError::SecNonceReused`] instead of
/// signing with the same nonce twice.
pub fn partial_sign(
    secnonce: &mut SecNonce,
    keypair: &Keypair,
    keyagg_cache: &KeyAggCache,
    session: &Session,
) -> Result<PartialSig, MusigError> {
    let (k1, k2) = secnonce.take_scalars()?;

    let mut sk = Zeroizing::new(*keypair.secret_scalar());
    *sk = seckey_sign(point::has_odd_y(keypair.public_point()), keyagg_cache).apply(*sk);

    let mu = keyagg_cache.keyagg_coef(&point::xonly_bytes(keypair.public_point()));
    *sk = *sk * mu;

    let nonce_sign = ScalarSign::from_odd(session.nonce_parity());
    let k1 = Zeroizing::new(nonce_sign.apply(*k1));
    let k2 = Zeroizing::new(nonce_sign.apply(*k2));

    let s = session.challenge() * *sk + *k1 + session.noncecoef() * *k2;
    Ok(PartialSig { s })
}

/// Check one signer's partial signature against their public nonce and
/// x-only key.
///
/// A `false` return identifies the misbehaving signer; the session stays
/// usable for verifying and aggregating the other shares. The tweak term
/// lives in the session's s_part, so it never appears here.
pub fn partial_sig_verify(
    partial_sig: &PartialSig,
    pubnonce: &PubNonce,
    pubkey: &XOnlyPublicKey,
    keyagg_cache: &KeyAggCache,
    session: &Session,
) -> bool {
    // The signer's effective nonce under this session's binding
    // coefficient: R = R₁ + b·R₂.
    let (r1, r2) = pubnonce.points();
    let mut r = ProjectivePoint::from(r1) + ProjectivePoint::from(r2) * session.noncecoef();

    // Scaling e by μ is equivalent to scaling the signer's key by μ.
    let mu = keyagg_cache.keyagg_coef(&pubkey.serialize());
    let e = challenge_sign(keyagg_cache).apply(session.challenge() * mu);

    if session.nonce_parity() {
        r = -r;
    }

    // s·G = R + e·P  ⟺  (−s)·G + e·P + R = ∞
    let check = ProjectivePoint::GENERATOR * (-partial_sig.scalar())
        + ProjectivePoint::from(*pubkey.point()) * e
        + r;
    bool::from(check.is_identity())
}

/// Sum the partial signatures (plus the session's tweak contribution) into
/// the 64-byte BIP-340 layout: `x(R) ‖ s`.
///
/// The output is NOT validated here; run it through
/// [`crate::schnorr::verify`] before publishing it.
pub fn partial_sig_agg(session: &Session, partial_sigs: &[PartialSig]) -> [u8; 64] {
    let mut s = session.s_part();
    for sig in partial_sigs {
        s += sig.scalar();
    }
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(session.fin_nonce());
    out[32..].copy_from_slice(&s.to_bytes());
    out
}
