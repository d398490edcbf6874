//! # MuSig2 signing engine
//!
//! Two-round n-of-n multi-signatures over secp256k1, producing a single
//! BIP-340 Schnorr signature under an aggregated x-only public key. On-chain
//! the result is indistinguishable from a single-signer key-path spend.
//!
//! The protocol pipeline is strictly forward:
//!
//! ```text
//! KeyAggCache::aggregate ──▶ pubkey_tweak_add (optional, at most once)
//!          │
//! nonce_gen (each signer) ──▶ AggNonce::sum ──▶ Session::process
//!          │
//! partial_sign (each signer) ──▶ partial_sig_verify ──▶ partial_sig_agg
//!          │
//! adaptor::adapt / adaptor::extract_adaptor (scriptless-script branch)
//! ```
//!
//! Two rules are security-critical and cannot be enforced by types alone:
//!
//! - Session ids passed to [`nonce_gen`] must never repeat. Use
//!   [`random_session_id`] unless you maintain a strictly monotonic counter
//!   alongside the secret key. Reusing a nonce reveals the secret key.
//! - Key aggregation is order-sensitive. Sort the x-only keys first if the
//!   cosigners must all arrive at the same aggregate key independently.
//!
//! All operations are synchronous, deterministic in their inputs, and leave
//! no secret material behind on any exit path.

pub mod adaptor;
pub mod keyagg;
pub mod keys;
pub mod memory;
pub mod nonce;
pub mod schnorr;
pub mod session;
pub mod sign;

mod hashes;
mod point;

use thiserror::Error;

pub use keyagg::KeyAggCache;
pub use keys::{Keypair, PublicKey, XOnlyPublicKey};
pub use nonce::{nonce_gen, random_session_id, AggNonce, PubNonce, SecNonce};
pub use session::Session;
pub use sign::{partial_sig_agg, partial_sig_verify, partial_sign, PartialSig};

/// Coarse failure classes, one per [`MusigError`] variant.
///
/// `InvalidArgument` is a caller bug, `CryptographicFailure` means the
/// arithmetic hit a degenerate point and the session must be restarted with
/// fresh nonces, `ProtocolMisuse` means the API was driven out of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    CryptographicFailure,
    ProtocolMisuse,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusigError {
    #[error("public key list is empty")]
    EmptyKeyList,
    #[error("public nonce list is empty")]
    EmptyNonceList,
    #[error("invalid public key encoding")]
    InvalidPublicKey,
    #[error("invalid public nonce encoding")]
    InvalidPubNonce,
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("tweak is zero or not below the curve order")]
    InvalidTweak,
    #[error("scalar is not below the curve order")]
    ScalarOverflow,
    #[error("key aggregation cache was already tweaked")]
    AlreadyTweaked,
    #[error("aggregate public key is the point at infinity")]
    AggregateKeyInfinity,
    #[error("tweak cancels the aggregate public key")]
    TweakCancelsKey,
    #[error("aggregate nonce coordinate is the point at infinity")]
    NonceSumInfinity,
    #[error("final nonce is the point at infinity")]
    FinalNonceInfinity,
    #[error("derived nonce scalar is zero")]
    ZeroNonce,
    #[error("secret nonce already consumed or never initialized")]
    SecNonceReused,
}

impl MusigError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyKeyList
            | Self::EmptyNonceList
            | Self::InvalidPublicKey
            | Self::InvalidPubNonce
            | Self::InvalidSecretKey
            | Self::InvalidTweak
            | Self::ScalarOverflow
            | Self::AlreadyTweaked => ErrorKind::InvalidArgument,
            Self::AggregateKeyInfinity
            | Self::TweakCancelsKey
            | Self::NonceSumInfinity
            | Self::FinalNonceInfinity
            | Self::ZeroNonce => ErrorKind::CryptographicFailure,
            Self::SecNonceReused => ErrorKind::ProtocolMisuse,
        }
    }
}
