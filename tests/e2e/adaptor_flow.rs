//! Adaptor-signature (scriptless-script) flow and nonce one-shot
//! enforcement.

use secp256k1::Secp256k1;
use tapsig_musig::{
    adaptor, nonce_gen, partial_sig_agg, partial_sign, schnorr, AggNonce, KeyAggCache, Keypair,
    MusigError, PublicKey, SecNonce, Session, XOnlyPublicKey,
};

fn seckey(last_byte: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[31] = last_byte;
    bytes
}

fn session_id(first_byte: u8) -> [u8; 32] {
    let mut id = [0u8; 32];
    id[0] = first_byte;
    id
}

/// t·G as a full public key, computed through libsecp so the adaptor point
/// does not depend on the engine under test.
fn adaptor_point(t: &[u8; 32]) -> PublicKey {
    let secp = Secp256k1::new();
    let point = secp256k1::SecretKey::from_slice(t)
        .unwrap()
        .public_key(&secp)
        .serialize();
    PublicKey::from_bytes(&point).unwrap()
}

fn libsecp_verify(sig: &[u8; 64], msg: &[u8; 32], agg_pk: &XOnlyPublicKey) -> bool {
    let secp = Secp256k1::verification_only();
    let sig = match secp256k1::schnorr::Signature::from_slice(sig) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let msg = secp256k1::Message::from_digest(*msg);
    let pubkey = match secp256k1::XOnlyPublicKey::from_slice(&agg_pk.serialize()) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    secp.verify_schnorr(&sig, &msg, &pubkey).is_ok()
}

struct AdaptorRound {
    cache: KeyAggCache,
    session: Session,
    keypairs: Vec<Keypair>,
    secnonces: Vec<SecNonce>,
}

fn adaptor_round(msg: &[u8; 32], adaptor_pk: &PublicKey) -> AdaptorRound {
    let keypairs: Vec<Keypair> = [seckey(1), seckey(2)]
        .iter()
        .map(|sk| Keypair::from_seckey_bytes(sk).unwrap())
        .collect();
    let pubkeys: Vec<XOnlyPublicKey> = keypairs.iter().map(|kp| kp.x_only_public_key()).collect();
    let cache = KeyAggCache::aggregate(&pubkeys).unwrap();

    let mut secnonces = Vec::new();
    let mut pubnonces = Vec::new();
    for (i, sk) in [seckey(1), seckey(2)].iter().enumerate() {
        let (secnonce, pubnonce) = nonce_gen(
            &session_id(i as u8 + 1),
            Some(sk),
            Some(msg),
            Some(&cache),
            None,
        )
        .unwrap();
        secnonces.push(secnonce);
        pubnonces.push(pubnonce);
    }

    let aggnonce = AggNonce::sum(&pubnonces).unwrap();
    let session = Session::process(&aggnonce, msg, &cache, Some(adaptor_pk)).unwrap();
    AdaptorRound {
        cache,
        session,
        keypairs,
        secnonces,
    }
}

fn aggregate_presig(round: &mut AdaptorRound) -> [u8; 64] {
    let partials: Vec<_> = round
        .secnonces
        .iter_mut()
        .zip(&round.keypairs)
        .map(|(secnonce, keypair)| {
            partial_sign(secnonce, keypair, &round.cache, &round.session).unwrap()
        })
        .collect();
    partial_sig_agg(&round.session, &partials)
}

#[test]
fn adaptor_presig_completes_and_reveals_secret() {
    let msg = [0u8; 32];
    let t = seckey(0x07);
    let mut round = adaptor_round(&msg, &adaptor_point(&t));

    let pre_sig = aggregate_presig(&mut round);
    let agg_pk = round.cache.agg_pk();

    // The pre-signature is deliberately unfinished.
    assert!(!schnorr::verify(&pre_sig, &msg, &agg_pk));
    assert!(!libsecp_verify(&pre_sig, &msg, &agg_pk));

    // Folding in t completes it.
    let parity = adaptor::nonce_parity(&round.session);
    assert_eq!(parity, round.session.nonce_parity());
    let full_sig = adaptor::adapt(&pre_sig, &t, parity).unwrap();
    assert!(schnorr::verify(&full_sig, &msg, &agg_pk));
    assert!(libsecp_verify(&full_sig, &msg, &agg_pk));

    // And whoever sees both signatures learns t.
    assert_eq!(
        adaptor::extract_adaptor(&full_sig, &pre_sig, parity).unwrap(),
        t
    );
}

#[test]
fn adaptor_roundtrip_with_random_secrets() {
    let msg = [0x77u8; 32];
    for attempt in 0u8..4 {
        let mut t = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut t);
        if secp256k1::SecretKey::from_slice(&t).is_err() {
            continue;
        }

        let mut round = adaptor_round(&msg, &adaptor_point(&t));
        let pre_sig = aggregate_presig(&mut round);
        let parity = round.session.nonce_parity();

        let full_sig = adaptor::adapt(&pre_sig, &t, parity).unwrap();
        assert!(
            schnorr::verify(&full_sig, &msg, &round.cache.agg_pk()),
            "attempt {attempt}"
        );
        assert_eq!(
            adaptor::extract_adaptor(&full_sig, &pre_sig, parity).unwrap(),
            t,
            "attempt {attempt}"
        );
    }
}

#[test]
fn secnonce_cannot_sign_twice() {
    let msg = [0u8; 32];
    let t = seckey(0x07);
    let mut round = adaptor_round(&msg, &adaptor_point(&t));

    partial_sign(
        &mut round.secnonces[0],
        &round.keypairs[0],
        &round.cache,
        &round.session,
    )
    .unwrap();

    // Same nonce, same session: refused outright, no second share exists.
    let second = partial_sign(
        &mut round.secnonces[0],
        &round.keypairs[0],
        &round.cache,
        &round.session,
    );
    assert_eq!(second.unwrap_err(), MusigError::SecNonceReused);
}
