//! End-to-end behavior of the derivation service

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hex_literal::hex;
use keystretch::{DerivationError, DerivationRequest, DerivationService, EncodedKey, ServiceConfig};
use keystretch_common::LoggingTransformer;
use std::sync::{Arc, mpsc};
use std::time::Duration;

const SALT_B64: &str = "c2FsdA=="; // "salt"

fn service(workers: usize, queue_capacity: usize) -> DerivationService {
    LoggingTransformer::init_test();
    DerivationService::start(ServiceConfig {
        workers,
        queue_capacity,
        ..ServiceConfig::default()
    })
    .expect("service should start")
}

fn decode(key: &EncodedKey) -> Vec<u8> {
    STANDARD.decode(key.expose()).expect("service emits base64")
}

#[tokio::test]
async fn one_iteration_matches_published_vector() {
    let service = service(2, 8);
    let key = service
        .request_derivation("password", SALT_B64, 1, 256)
        .await
        .expect("derivation succeeds");

    assert_eq!(
        decode(&key),
        hex!("120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b")
    );
}

#[tokio::test]
async fn many_iterations_match_published_vector() {
    let service = service(1, 4);
    let key = service
        .request_derivation("password", SALT_B64, 4096, 256)
        .await
        .expect("derivation succeeds");

    assert_eq!(
        decode(&key),
        hex!("c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a")
    );
}

#[tokio::test]
async fn key_of_512_bits_extends_the_256_bit_key() {
    let service = service(2, 8);
    let short = service.request_derivation("password", SALT_B64, 2, 256);
    let long = service.request_derivation("password", SALT_B64, 2, 512);

    let short = decode(&short.await.expect("256-bit key"));
    let long = decode(&long.await.expect("512-bit key"));

    assert_eq!(short.len(), 32);
    assert_eq!(long.len(), 64);
    assert_eq!(&long[..32], short.as_slice());
}

#[tokio::test]
async fn derivation_is_deterministic() {
    let service = service(2, 8);
    let first = service
        .request_derivation("correct horse", "AAECAwQFBgcICQoLDA0ODw==", 100, 512)
        .await
        .expect("first");
    let second = service
        .request_derivation("correct horse", "AAECAwQFBgcICQoLDA0ODw==", 100, 512)
        .await
        .expect("second");
    assert_eq!(first, second);
}

#[tokio::test]
async fn unsupported_key_sizes_are_rejected() {
    let service = service(2, 8);
    for bits in [128, 384, 0, -256, 257, 1024] {
        let result = service.request_derivation("password", SALT_B64, 1, bits).await;
        assert_eq!(
            result.err(),
            Some(DerivationError::UnsupportedKeySize { bits }),
            "bits = {bits}"
        );
    }
}

#[tokio::test]
async fn zero_and_negative_iterations_are_rejected() {
    let service = service(2, 8);
    for iterations in [0, -1, i64::MIN] {
        let result = service
            .request_derivation("password", SALT_B64, iterations, 256)
            .await;
        assert!(
            matches!(
                result,
                Err(DerivationError::InvalidIterationCount { iterations: got, .. }) if got == iterations
            ),
            "iterations = {iterations}"
        );
    }
}

#[tokio::test]
async fn iterations_above_configured_maximum_are_rejected() {
    LoggingTransformer::init_test();
    let service = DerivationService::start(ServiceConfig {
        workers: 1,
        max_iterations: 10,
        default_iterations: 5,
        ..ServiceConfig::default()
    })
    .expect("service should start");

    let result = service.request_derivation("password", SALT_B64, 11, 256).await;
    assert_eq!(
        result.err(),
        Some(DerivationError::InvalidIterationCount {
            iterations: 11,
            max: 10
        })
    );
    assert!(service.request_derivation("password", SALT_B64, 10, 256).await.is_ok());
}

#[tokio::test]
async fn malformed_salt_is_rejected() {
    let service = service(2, 8);
    for salt in ["not base64!", "c2FsdA", "c2F=sdA=", "-_-_"] {
        let result = service.request_derivation("password", salt, 1, 256).await;
        assert!(
            matches!(result, Err(DerivationError::MalformedSalt(_))),
            "salt = {salt:?}"
        );
    }
}

#[tokio::test]
async fn validation_order_is_key_size_then_iterations_then_salt() {
    let service = service(1, 4);

    let all_bad = service.request_derivation("pw", "!!", 0, 128).await;
    assert_eq!(all_bad.err().map(|e| e.code()), Some("UNSUPPORTED_KEY_SIZE"));

    let iterations_and_salt_bad = service.request_derivation("pw", "!!", 0, 256).await;
    assert_eq!(
        iterations_and_salt_bad.err().map(|e| e.code()),
        Some("INVALID_ITERATION_COUNT")
    );

    let salt_bad = service.request_derivation("pw", "!!", 1, 256).await;
    assert_eq!(salt_bad.err().map(|e| e.code()), Some("MALFORMED_SALT"));
}

#[test]
fn concurrent_requests_each_get_one_matching_callback() {
    let service = service(4, 8);
    let (tx, rx) = mpsc::channel();
    let requests = 64usize;

    for i in 0..requests {
        let tx = tx.clone();
        let passphrase = format!("passphrase-{i}");
        service.request_derivation_with(&passphrase, SALT_B64, 50, 256, move |result| {
            let _ = tx.send((i, result));
        });
    }
    drop(tx);

    let mut seen = vec![0usize; requests];
    for (i, result) in rx.iter() {
        seen[i] += 1;

        let expected = DerivationRequest::new(format!("passphrase-{i}"), SALT_B64, 50, 256)
            .derive(u32::MAX)
            .expect("single-threaded derivation");
        assert_eq!(result.expect("derivation succeeds"), expected);
    }

    assert!(seen.iter().all(|&count| count == 1), "callback counts: {seen:?}");
}

#[test]
fn validation_failures_still_call_back_once() {
    let service = service(1, 4);
    let (tx, rx) = mpsc::channel();

    service.request_derivation_with("pw", SALT_B64, 0, 256, move |result| {
        let _ = tx.send(result);
    });

    let result = rx.recv().expect("callback ran");
    assert_eq!(result.err().map(|e| e.code()), Some("INVALID_ITERATION_COUNT"));
    assert!(rx.recv().is_err(), "callback must run only once");
}

#[tokio::test]
async fn requests_after_shutdown_fail_with_internal_failure() {
    let service = service(2, 8);
    service.shutdown();
    assert!(!service.is_running());

    let result = service.request_derivation("password", SALT_B64, 1, 256).await;
    assert_eq!(result.err().map(|e| e.code()), Some("INTERNAL_FAILURE"));

    let (tx, rx) = mpsc::channel();
    service.request_derivation_with("password", SALT_B64, 1, 256, move |result| {
        let _ = tx.send(result);
    });
    let result = rx.recv().expect("callback ran");
    assert_eq!(result.err().map(|e| e.code()), Some("INTERNAL_FAILURE"));
}

#[test]
fn shutdown_finishes_queued_requests() {
    let service = service(1, 16);
    let (tx, rx) = mpsc::channel();

    for _ in 0..8 {
        let tx = tx.clone();
        service.request_derivation_with("password", SALT_B64, 200, 256, move |result| {
            let _ = tx.send(result.is_ok());
        });
    }
    drop(tx);
    service.shutdown();

    let outcomes: Vec<bool> = rx.iter().collect();
    assert_eq!(outcomes, vec![true; 8]);
}

#[tokio::test]
async fn try_request_reports_full_queue_as_internal_failure() {
    let service = service(1, 1);

    // Occupy the worker and the single queue slot with slow derivations.
    let busy = service.request_derivation("password", SALT_B64, 500_000, 256);
    let queued = service.request_derivation("password", SALT_B64, 500_000, 256);

    let mut rejected = None;
    for _ in 0..16 {
        let attempt = service.try_request_derivation("password", SALT_B64, 1, 256);
        match attempt.with_timeout(Duration::from_millis(1)).await {
            Err(DerivationError::InternalFailure(msg)) if msg.contains("full") => {
                rejected = Some(msg);
                break;
            }
            _ => continue,
        }
    }
    assert!(rejected.is_some(), "a non-blocking request should hit the full queue");

    drop(busy);
    drop(queued);
}

#[tokio::test]
async fn timeout_abandons_slow_derivation() {
    let service = service(1, 4);
    let result = service
        .request_derivation("password", SALT_B64, 500_000, 256)
        .with_timeout(Duration::from_millis(5))
        .await;
    assert_eq!(result.err().map(|e| e.code()), Some("INTERNAL_FAILURE"));
}

#[tokio::test]
async fn metrics_count_requests() {
    let service = service(2, 8);
    for _ in 0..3 {
        service
            .request_derivation("password", SALT_B64, 1, 256)
            .await
            .expect("derivation succeeds");
    }
    service.shutdown();

    let metrics = service.metrics();
    assert_eq!(metrics.tasks_submitted, 3);
    assert_eq!(metrics.tasks_executed, 3);
    assert_eq!(metrics.tasks_panicked, 0);
}

#[test]
fn requests_chained_from_a_callback_do_not_stall_the_worker() {
    let service = Arc::new(service(1, 1));
    let (tx, rx) = mpsc::channel();

    let chained = Arc::clone(&service);
    service.request_derivation_with("password", SALT_B64, 1, 256, move |first| {
        assert!(first.is_ok());
        for _ in 0..2 {
            let tx = tx.clone();
            chained.request_derivation_with("password", SALT_B64, 1, 256, move |result| {
                let _ = tx.send(result.map_err(|e| e.code()));
            });
        }
    });

    let mut outcomes = vec![
        rx.recv_timeout(Duration::from_secs(5)).expect("first chained callback"),
        rx.recv_timeout(Duration::from_secs(5)).expect("second chained callback"),
    ];
    outcomes.sort_by_key(Result::is_err);

    assert!(outcomes[0].is_ok());
    assert_eq!(outcomes[1].as_ref().err(), Some(&"INTERNAL_FAILURE"));
}
