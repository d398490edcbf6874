//! Full-pipeline signing scenarios.
//!
//! Every final signature is checked twice: once with the engine's own
//! BIP-340 verifier and once through libsecp256k1, so an error in the
//! engine's arithmetic cannot hide behind a matching error in its
//! verifier.

use secp256k1::Secp256k1;
use tapsig_musig::{
    nonce_gen, partial_sig_agg, partial_sig_verify, partial_sign, schnorr, AggNonce, KeyAggCache,
    Keypair, PartialSig, PubNonce, SecNonce, Session, XOnlyPublicKey,
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

/// BIP-340 verification through libsecp256k1, independent of the engine.
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

struct Cosigner {
    keypair: Keypair,
    secnonce: SecNonce,
    pubnonce: PubNonce,
}

/// Round one for a fixed signer set: aggregate keys, apply the optional
/// tweak, and exchange nonces.
fn round_one(seckeys: &[[u8; 32]], msg: &[u8; 32], tweak: Option<[u8; 32]>) -> (Vec<Cosigner>, KeyAggCache, Session) {
    let keypairs: Vec<Keypair> = seckeys
        .iter()
        .map(|sk| Keypair::from_seckey_bytes(sk).unwrap())
        .collect();
    let pubkeys: Vec<XOnlyPublicKey> = keypairs.iter().map(|kp| kp.x_only_public_key()).collect();

    let mut cache = KeyAggCache::aggregate(&pubkeys).unwrap();
    if let Some(tweak) = tweak {
        cache.pubkey_tweak_add(&tweak).unwrap();
    }

    let mut cosigners = Vec::new();
    for (i, (keypair, sk)) in keypairs.into_iter().zip(seckeys).enumerate() {
        let (secnonce, pubnonce) = nonce_gen(
            &session_id(i as u8 + 1),
            Some(sk),
            Some(msg),
            Some(&cache),
            None,
        )
        .unwrap();
        cosigners.push(Cosigner {
            keypair,
            secnonce,
            pubnonce,
        });
    }

    let pubnonces: Vec<PubNonce> = cosigners.iter().map(|c| c.pubnonce).collect();
    let aggnonce = AggNonce::sum(&pubnonces).unwrap();
    let session = Session::process(&aggnonce, msg, &cache, None).unwrap();
    (cosigners, cache, session)
}

fn sign_all(cosigners: &mut [Cosigner], cache: &KeyAggCache, session: &Session) -> Vec<PartialSig> {
    cosigners
        .iter_mut()
        .map(|c| partial_sign(&mut c.secnonce, &c.keypair, cache, session).unwrap())
        .collect()
}

#[test]
fn two_of_two_signature_verifies() {
    let msg = [0u8; 32];
    let (mut cosigners, cache, session) = round_one(&[seckey(1), seckey(2)], &msg, None);
    let partials = sign_all(&mut cosigners, &cache, &session);

    for (cosigner, partial) in cosigners.iter().zip(&partials) {
        assert!(partial_sig_verify(
            partial,
            &cosigner.pubnonce,
            &cosigner.keypair.x_only_public_key(),
            &cache,
            &session,
        ));
    }

    let sig = partial_sig_agg(&session, &partials);
    let agg_pk = cache.agg_pk();
    assert!(schnorr::verify(&sig, &msg, &agg_pk));
    assert!(libsecp_verify(&sig, &msg, &agg_pk));
}

#[test]
fn three_of_three_with_tweak_verifies_under_tweaked_key() {
    let msg = [0u8; 32];
    let mut tweak = [0u8; 32];
    tweak[31] = 0x0a;

    // The tweaked aggregate must match what libsecp computes from the
    // untweaked aggregate; the signature must verify under it and only it.
    let untweaked = KeyAggCache::aggregate(
        &[seckey(1), seckey(2), seckey(3)]
            .iter()
            .map(|sk| Keypair::from_seckey_bytes(sk).unwrap().x_only_public_key())
            .collect::<Vec<_>>(),
    )
    .unwrap()
    .agg_pk();

    let (mut cosigners, cache, session) =
        round_one(&[seckey(1), seckey(2), seckey(3)], &msg, Some(tweak));
    let partials = sign_all(&mut cosigners, &cache, &session);
    let sig = partial_sig_agg(&session, &partials);

    let agg_pk = cache.agg_pk();
    assert!(schnorr::verify(&sig, &msg, &agg_pk));
    assert!(libsecp_verify(&sig, &msg, &agg_pk));
    assert!(!schnorr::verify(&sig, &msg, &untweaked));

    let secp = Secp256k1::new();
    let expected = secp256k1::XOnlyPublicKey::from_slice(&untweaked.serialize())
        .unwrap()
        .add_tweak(&secp, &secp256k1::Scalar::from_be_bytes(tweak).unwrap())
        .unwrap()
        .0
        .serialize();
    assert_eq!(agg_pk.serialize(), expected);
}

#[test]
fn faulty_signer_is_identified_and_poisons_aggregate() {
    let msg = [0u8; 32];
    let (mut cosigners, cache, session) = round_one(&[seckey(1), seckey(2)], &msg, None);
    let partials = sign_all(&mut cosigners, &cache, &session);

    // Corrupt signer 2's share, starting from the last byte and moving up
    // if the flip happens to push the scalar out of range.
    let tampered = (0..32)
        .rev()
        .find_map(|i| {
            let mut bytes = partials[1].serialize();
            bytes[i] ^= 0xff;
            PartialSig::from_bytes(&bytes).ok()
        })
        .unwrap();

    assert!(partial_sig_verify(
        &partials[0],
        &cosigners[0].pubnonce,
        &cosigners[0].keypair.x_only_public_key(),
        &cache,
        &session,
    ));
    assert!(!partial_sig_verify(
        &tampered,
        &cosigners[1].pubnonce,
        &cosigners[1].keypair.x_only_public_key(),
        &cache,
        &session,
    ));

    // Aggregation still produces a 64-byte blob, but it cannot verify.
    let sig = partial_sig_agg(&session, &[partials[0], tampered]);
    let agg_pk = cache.agg_pk();
    assert!(!schnorr::verify(&sig, &msg, &agg_pk));
    assert!(!libsecp_verify(&sig, &msg, &agg_pk));
}

#[test]
fn keyagg_is_order_dependent() {
    let keys: Vec<XOnlyPublicKey> = [seckey(1), seckey(2)]
        .iter()
        .map(|sk| Keypair::from_seckey_bytes(sk).unwrap().x_only_public_key())
        .collect();

    let forward = KeyAggCache::aggregate(&keys).unwrap().agg_pk();
    let reversed = KeyAggCache::aggregate(&[keys[1], keys[0]]).unwrap().agg_pk();
    assert_ne!(forward, reversed);
}

#[test]
fn nonce_aggregation_is_order_independent() {
    let msg = [0x5au8; 32];
    let (cosigners, _, _) = round_one(&[seckey(1), seckey(2), seckey(3)], &msg, None);
    let nonces: Vec<PubNonce> = cosigners.iter().map(|c| c.pubnonce).collect();

    let forward = AggNonce::sum(&nonces).unwrap();
    let rotated = AggNonce::sum(&[nonces[2], nonces[0], nonces[1]]).unwrap();
    assert_eq!(forward.serialize(), rotated.serialize());
}

#[test]
fn wire_parsers_reject_out_of_range_scalars() {
    let order: [u8; 32] =
        hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
            .unwrap()
            .try_into()
            .unwrap();
    assert!(PartialSig::from_bytes(&order).is_err());

    let mut below = order;
    below[31] -= 1;
    let sig = PartialSig::from_bytes(&below).unwrap();
    assert_eq!(sig.serialize(), below);
}

#[test]
fn random_cosigner_sets_sign_successfully() {
    for m in 1..=4 {
        let msg = [m as u8; 32];
        let seckeys: Vec<[u8; 32]> = (0..m)
            .map(|_| loop {
                let mut sk = [0u8; 32];
                rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut sk);
                if Keypair::from_seckey_bytes(&sk).is_ok() {
                    break sk;
                }
            })
            .collect();

        let (mut cosigners, cache, session) = round_one(&seckeys, &msg, None);
        let partials = sign_all(&mut cosigners, &cache, &session);
        let sig = partial_sig_agg(&session, &partials);
        let agg_pk = cache.agg_pk();
        assert!(schnorr::verify(&sig, &msg, &agg_pk), "{m} signers");
        assert!(libsecp_verify(&sig, &msg, &agg_pk), "{m} signers");
    }
}
