//! Host bridge routing and response format

use keystretch::{BridgeResponse, DerivationService, PluginBridge, ServiceConfig};
use std::sync::Arc;
use std::sync::mpsc;

fn bridge() -> PluginBridge {
    let service = DerivationService::start(ServiceConfig {
        workers: 2,
        queue_capacity: 8,
        ..ServiceConfig::default()
    })
    .expect("service should start");
    PluginBridge::new(Arc::new(service))
}

fn call(bridge: &PluginBridge, action: &str, args: &str) -> Option<BridgeResponse> {
    let (tx, rx) = mpsc::channel();
    let handled = bridge.execute(action, args, move |response| {
        let _ = tx.send(response);
    });
    if !handled {
        assert!(rx.recv().is_err(), "unknown actions must not call back");
        return None;
    }
    let response = rx.recv().expect("callback ran");
    assert!(rx.recv().is_err(), "callback must run only once");
    Some(response)
}

#[test]
fn gen_key_returns_base64_key() {
    let bridge = bridge();
    let response = call(&bridge, "genKey", r#"["password", "c2FsdA==", 1, 256]"#)
        .expect("genKey is routed");

    assert_eq!(
        response,
        BridgeResponse::Ok {
            key: "Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=".to_string()
        }
    );
    assert_eq!(
        response.to_json(),
        r#"{"status":"ok","key":"Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs="}"#
    );
}

#[test]
fn gen_key_errors_carry_code_and_message() {
    let bridge = bridge();
    let response =
        call(&bridge, "genKey", r#"["password", "c2FsdA==", 1, 384]"#).expect("genKey is routed");

    match &response {
        BridgeResponse::Error { code, message } => {
            assert_eq!(code, "UNSUPPORTED_KEY_SIZE");
            assert!(message.contains("384"));
        }
        other => panic!("expected error, got {other:?}"),
    }

    let json: serde_json::Value =
        serde_json::from_str(&response.to_json()).expect("response is JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "UNSUPPORTED_KEY_SIZE");
}

#[test]
fn malformed_arguments_are_reported() {
    let bridge = bridge();
    for args in [
        r#"["password", "c2FsdA==", 1]"#,
        r#"["password", "c2FsdA==", "1", 256]"#,
        r#"{"passphrase": "password"}"#,
        "not json",
    ] {
        let response = call(&bridge, "genKey", args).expect("genKey is routed");
        assert!(
            matches!(&response, BridgeResponse::Error { code, .. } if code == "INVALID_ARGUMENTS"),
            "args = {args}: {response:?}"
        );
    }
}

#[test]
fn unknown_actions_are_not_handled() {
    let bridge = bridge();
    assert!(call(&bridge, "openUrl", "[]").is_none());
    assert!(call(&bridge, "genkey", r#"["password", "c2FsdA==", 1, 256]"#).is_none());
}

#[test]
fn debug_output_hides_the_key() {
    let bridge = bridge();
    let response = call(&bridge, "genKey", r#"["password", "c2FsdA==", 1, 256]"#)
        .expect("genKey is routed");
    assert!(!format!("{response:?}").contains("Eg+2z"));
}
