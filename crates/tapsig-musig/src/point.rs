//! Curve plumbing shared by the protocol modules.
//!
//! Thin wrappers over the k256 public API: x-only decompression, SEC1
//! compressed codecs, even-y normalization, and the two scalar parsing
//! modes (strict and reducing). Everything here is constant-time except
//! [`even_y`], which only ever sees public points.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::{AffineCoordinates, DecompressPoint};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::subtle::Choice;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, U256};

/// Lift a 32-byte x coordinate to the curve point with even y.
pub(crate) fn lift_x(x32: &[u8; 32]) -> Option<AffinePoint> {
    Option::from(AffinePoint::decompress(
        FieldBytes::from_slice(x32),
        Choice::from(0),
    ))
}

/// Parse a 33-byte SEC1 compressed encoding.
///
/// Rejects the point at infinity and anything not on the curve; with
/// cofactor 1 that is also the prime-order subgroup check.
pub(crate) fn parse_compressed(bytes: &[u8; 33]) -> Option<AffinePoint> {
    let pubkey = k256::PublicKey::from_sec1_bytes(bytes).ok()?;
    Some(*pubkey.as_affine())
}

/// SEC1 compressed serialization. The caller guarantees a finite point.
pub(crate) fn serialize_compressed(point: &AffinePoint) -> [u8; 33] {
    let encoded = point.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    out
}

/// The x coordinate, without any parity normalization.
pub(crate) fn xonly_bytes(point: &AffinePoint) -> [u8; 32] {
    point.x().into()
}

pub(crate) fn has_odd_y(point: &AffinePoint) -> bool {
    point.y_is_odd().into()
}

/// |P|: the even-y representative of {P, −P}.
pub(crate) fn even_y(point: &AffinePoint) -> AffinePoint {
    if has_odd_y(point) {
        (-ProjectivePoint::from(*point)).to_affine()
    } else {
        *point
    }
}

/// Strict parse: rejects encodings ≥ the curve order, keeps zero.
pub(crate) fn parse_scalar(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::from(Scalar::from_repr(FieldBytes::from(*bytes)))
}

/// Reducing parse: interpret 32 big-endian bytes as an integer mod n.
pub(crate) fn reduce_scalar(bytes: &[u8; 32]) -> Scalar {
    let repr = FieldBytes::from(*bytes);
    <Scalar as Reduce<U256>>::reduce_bytes(&repr)
}
