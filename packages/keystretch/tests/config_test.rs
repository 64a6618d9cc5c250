//! Service configuration loading and validation

use keystretch::{ConfigError, DerivationService, ServiceConfig, StartError};
use std::collections::HashMap;
use std::io::Write;

#[test]
fn defaults_are_sane() {
    let config = ServiceConfig::default();
    assert!((1..=8).contains(&config.workers));
    assert_eq!(config.queue_capacity, 64);
    assert_eq!(config.max_iterations, 10_000_000);
    assert_eq!(config.default_iterations, 50_000);
    assert_eq!(config.thread_name, "keystretch-worker");
    assert!(config.enable_metrics);
    assert!(config.validate().is_ok());
}

#[test]
fn json_file_fills_missing_fields_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"workers": 3, "max_iterations": 1000}}"#).expect("write config");

    let config = ServiceConfig::from_json_file(file.path()).expect("config loads");
    assert_eq!(config.workers, 3);
    assert_eq!(config.max_iterations, 1000);
    assert_eq!(config.queue_capacity, 64);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ServiceConfig::from_json_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let err = ServiceConfig::from_json_str(r#"{"workers": "many"}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn overrides_replace_values() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("KEYSTRETCH_WORKERS", "2"),
        ("KEYSTRETCH_QUEUE_CAPACITY", " 16 "),
        ("KEYSTRETCH_MAX_ITERATIONS", "100000"),
    ]);

    let config = ServiceConfig::default()
        .with_overrides_from(|var| vars.get(var).map(|v| (*v).to_string()))
        .expect("overrides parse");

    assert_eq!(config.workers, 2);
    assert_eq!(config.queue_capacity, 16);
    assert_eq!(config.max_iterations, 100_000);
}

#[test]
fn non_numeric_override_is_rejected() {
    let err = ServiceConfig::default()
        .with_overrides_from(|var| (var == "KEYSTRETCH_WORKERS").then(|| "lots".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidEnv {
            var: "KEYSTRETCH_WORKERS",
            ..
        }
    ));
}

#[test]
fn zero_values_are_rejected() {
    let zero_workers = ServiceConfig {
        workers: 0,
        ..ServiceConfig::default()
    };
    assert!(matches!(zero_workers.validate(), Err(ConfigError::Invalid(_))));

    let zero_capacity = ServiceConfig {
        queue_capacity: 0,
        ..ServiceConfig::default()
    };
    assert!(matches!(zero_capacity.validate(), Err(ConfigError::Invalid(_))));

    let zero_max = ServiceConfig {
        max_iterations: 0,
        ..ServiceConfig::default()
    };
    assert!(matches!(zero_max.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn service_refuses_invalid_config() {
    let result = DerivationService::start(ServiceConfig {
        workers: 0,
        ..ServiceConfig::default()
    });
    assert!(matches!(result, Err(StartError::Config(ConfigError::Invalid(_)))));
}

#[test]
fn workers_use_configured_thread_name() {
    let service = DerivationService::start(ServiceConfig {
        workers: 1,
        thread_name: "kdf".to_string(),
        ..ServiceConfig::default()
    })
    .expect("service should start");
    assert_eq!(service.config().thread_name, "kdf");
}
