//! Scriptless-script adaptor operations on final-layout signatures.
//!
//! A session processed with an adaptor point T = t·G yields a
//! pre-signature that fails BIP-340 verification until [`adapt`] folds the
//! secret t into it; whoever later sees both signatures can recover t with
//! [`extract_adaptor`]. The nonce parity from [`Session::nonce_parity`]
//! must travel with the pre-signature.

use k256::Scalar;

use crate::session::Session;
use crate::{point, MusigError};

/// Parity of the session's final nonce, as both adaptor directions need it.
pub fn nonce_parity(session: &Session) -> bool {
    session.nonce_parity()
}

/// Complete a pre-signature with the secret adaptor t.
pub fn adapt(
    pre_sig64: &[u8; 64],
    sec_adaptor32: &[u8; 32],
    nonce_parity: bool,
) -> Result<[u8; 64], MusigError> {
    let s = parse_sig_scalar(pre_sig64)?;
    let mut t = point::parse_scalar(sec_adaptor32).ok_or(MusigError::ScalarOverflow)?;
    if nonce_parity {
        t = -t;
    }
    let mut out = *pre_sig64;
    out[32..].copy_from_slice(&(s + t).to_bytes());
    Ok(out)
}

/// Recover the adaptor scalar from a completed signature and the
/// pre-signature it came from.
///
/// Both inputs are trusted to be genuine signatures from the same session;
/// unrelated inputs produce a well-formed but meaningless scalar.
pub fn extract_adaptor(
    sig64: &[u8; 64],
    pre_sig64: &[u8; 64],
    nonce_parity: bool,
) -> Result<[u8; 32], MusigError> {
    let s = parse_sig_scalar(sig64)?;
    let pre_s = parse_sig_scalar(pre_sig64)?;
    let mut t = pre_s - s;
    if !nonce_parity {
        t = -t;
    }
    Ok(t.to_bytes().into())
}

fn parse_sig_scalar(sig64: &[u8; 64]) -> Result<Scalar, MusigError> {
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&sig64[32..]);
    point::parse_scalar(&s_bytes).ok_or(MusigError::ScalarOverflow)
}
