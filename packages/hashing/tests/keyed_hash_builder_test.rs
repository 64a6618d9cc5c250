//! Async builder API over the PRF

use hex_literal::hex;
use keystretch_hashing::{Hash, HashError, prf};

#[tokio::test]
async fn keyed_compute_matches_prf() {
    let tag = Hash::sha256()
        .with_key(b"Jefe".to_vec())
        .compute(b"what do ya want for nothing?".to_vec())
        .await
        .expect("HMAC computation should succeed");

    assert_eq!(tag.len(), 32);
    assert_eq!(tag.as_bytes(), prf(b"Jefe", b"what do ya want for nothing?"));
}

#[test]
fn compute_outside_a_tokio_runtime() {
    assert!(tokio::runtime::Handle::try_current().is_err());

    let pending = Hash::sha256()
        .with_key(b"key".to_vec())
        .compute(b"The quick brown fox jumps over the lazy dog".to_vec());
    let tag = futures::executor::block_on(pending).expect("HMAC computation should succeed");

    assert_eq!(
        tag.as_bytes(),
        hex!("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
    );
}

#[tokio::test]
async fn plain_compute_is_sha256() {
    let digest = Hash::sha256()
        .compute(b"abc".to_vec())
        .await
        .expect("SHA-256 computation should succeed");

    assert_eq!(
        digest.as_bytes(),
        hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
}

#[tokio::test]
async fn on_result_handler_receives_tag() {
    let encoded = Hash::sha256()
        .with_key(b"key".to_vec())
        .compute(b"data".to_vec())
        .on_result(|result: Result<_, HashError>| match result {
            Ok(tag) => tag.to_hex(),
            Err(e) => format!("error: {e}"),
        })
        .await;

    assert_eq!(encoded, hex::encode(prf(b"key", b"data")));
}
