//! Public-key and keypair types.
//!
//! [`XOnlyPublicKey`] is the canonical BIP-340 form: a 32-byte x coordinate
//! naming the curve point with even y. [`PublicKey`] keeps the full point
//! with its parity; it is what a tweak returns and what an adaptor point
//! is. [`Keypair`] stores the secret scalar next to its unnormalized public
//! point; the signing code consumes the natural parity of both.

use core::cmp::Ordering;
use core::fmt;

use k256::{AffinePoint, ProjectivePoint, Scalar};
use zeroize::Zeroize;

use crate::point;
use crate::MusigError;

/// A BIP-340 x-only public key (even-y convention).
#[derive(Clone, Copy, Debug)]
pub struct XOnlyPublicKey {
    point: AffinePoint,
}

impl XOnlyPublicKey {
    /// Parse the 32-byte x-only form. Fails if x is not on the curve.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, MusigError> {
        point::lift_x(bytes)
            .map(|point| Self { point })
            .ok_or(MusigError::InvalidPublicKey)
    }

    pub fn serialize(&self) -> [u8; 32] {
        point::xonly_bytes(&self.point)
    }

    pub(crate) fn point(&self) -> &AffinePoint {
        &self.point
    }

    pub(crate) fn from_even_y_point(point: AffinePoint) -> Self {
        debug_assert!(!point::has_odd_y(&point));
        Self { point }
    }
}

impl PartialEq for XOnlyPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for XOnlyPublicKey {}

// Lexicographic over the serialized form, so key lists can be sorted before
// aggregation when all cosigners must derive the same aggregate key.
impl Ord for XOnlyPublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialize().cmp(&other.serialize())
    }
}

impl PartialOrd for XOnlyPublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A full public key, SEC1-compressed on the wire.
#[derive(Clone, Copy, Debug)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    /// Parse a 33-byte compressed encoding. Rejects infinity and off-curve
    /// points.
    pub fn from_bytes(bytes: &[u8; 33]) -> Result<Self, MusigError> {
        point::parse_compressed(bytes)
            .map(|point| Self { point })
            .ok_or(MusigError::InvalidPublicKey)
    }

    pub fn serialize(&self) -> [u8; 33] {
        point::serialize_compressed(&self.point)
    }

    /// The x-only form plus whether y was odd (and the key therefore
    /// negated by the even-y convention).
    pub fn x_only_public_key(&self) -> (XOnlyPublicKey, bool) {
        let parity = point::has_odd_y(&self.point);
        (
            XOnlyPublicKey::from_even_y_point(point::even_y(&self.point)),
            parity,
        )
    }

    pub(crate) fn point(&self) -> &AffinePoint {
        &self.point
    }

    pub(crate) fn from_point(point: AffinePoint) -> Self {
        Self { point }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for PublicKey {}

/// A signer's secret scalar and its public point sk·G, kept with whatever
/// parity the point naturally has. The scalar is wiped on drop.
pub struct Keypair {
    sk: Scalar,
    pk: AffinePoint,
}

impl Keypair {
    /// Parse a 32-byte big-endian secret key. Rejects zero and encodings
    /// not below the curve order.
    pub fn from_seckey_bytes(bytes: &[u8; 32]) -> Result<Self, MusigError> {
        let sk = point::parse_scalar(bytes).ok_or(MusigError::InvalidSecretKey)?;
        if sk == Scalar::ZERO {
            return Err(MusigError::InvalidSecretKey);
        }
        let pk = (ProjectivePoint::GENERATOR * sk).to_affine();
        Ok(Self { sk, pk })
    }

    /// The signer's canonical x-only identity: the even-y form of sk·G.
    pub fn x_only_public_key(&self) -> XOnlyPublicKey {
        XOnlyPublicKey::from_even_y_point(point::even_y(&self.pk))
    }

    pub(crate) fn secret_scalar(&self) -> &Scalar {
        &self.sk
    }

    pub(crate) fn public_point(&self) -> &AffinePoint {
        &self.pk
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.sk.zeroize();
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret scalar.
        f.debug_struct("Keypair")
            .field("pk", &hex_x(&self.x_only_public_key()))
            .finish_non_exhaustive()
    }
}

fn hex_x(pk: &XOnlyPublicKey) -> String {
    pk.serialize().iter().map(|b| format!("{b:02x}")).collect()
}
