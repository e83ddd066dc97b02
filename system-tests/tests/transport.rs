// system-tests/tests/transport.rs
// ============================================================================
// Module: Call Transport Tests
// Description: Synchronous call behavior against the stub binder.
// Purpose: Validate reply normalization, timeouts, and transcripts.
// Dependencies: afb-conform-core, afb-conform-harness, system-tests
// ============================================================================

//! ## Overview
//! Exercises [`afb_conform_harness::BinderSession::call_sync`]: binding
//! lookup, semantic-failure statuses, timeout classification, session
//! survival after a timeout, and transcript capture.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod helpers;

use std::time::Duration;

use afb_conform_core::BindingName;
use afb_conform_core::CallArgument;
use afb_conform_harness::CallError;
use afb_conform_harness::start_binder;
use helpers::fixtures::attach_config;
use helpers::fixtures::attach_config_with_call_timeout;
use system_tests::stub::STATUS_UNKNOWN_VERB;
use system_tests::stub::SlowVerb;
use system_tests::stub::StubOptions;
use system_tests::stub::spawn_stub;

/// Tests a plain verb round trip with a text argument.
#[test]
fn set_ssid_round_trip_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let session = start_binder(&attach_config(stub.base_url()))?;
    let wifi = BindingName::new("wifiAp");

    let result = session.invoke_with(&wifi, "setSsid", &CallArgument::Text("testAP".to_string()))?;
    assert_eq!(result.status, 0);
    assert!(result.is_success());
    assert_eq!(result.info.as_deref(), Some("SSID set successfully"));
    Ok(())
}

/// Tests that an unknown verb is a semantic failure, not a harness error.
#[test]
fn unknown_verb_is_a_semantic_failure() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let session = start_binder(&attach_config(stub.base_url()))?;
    let wifi = BindingName::new("wifiAp");

    let result = session.invoke(&wifi, "noSuchVerb")?;
    assert_eq!(result.status, STATUS_UNKNOWN_VERB);
    assert!(!result.is_success());

    // The session is untouched: a real verb still works afterwards.
    let result = session.invoke(&wifi, "getAPclientsNumber")?;
    assert_eq!(result.status, 0);
    Ok(())
}

/// Tests that an unregistered binding is rejected before any I/O.
#[test]
fn unknown_binding_is_a_call_error() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let session = start_binder(&attach_config(stub.base_url()))?;

    match session.invoke(&BindingName::new("bluetooth"), "startScan") {
        Err(CallError::UnknownBinding(name)) => {
            assert_eq!(name, "bluetooth");
            Ok(())
        }
        other => panic!("expected UnknownBinding, got {other:?}"),
    }
}

/// Tests timeout classification and that the session stays usable afterwards.
#[test]
fn timeout_does_not_poison_the_session() -> Result<(), Box<dyn std::error::Error>> {
    let options = StubOptions {
        bindings: vec!["wifiAp".to_string()],
        slow_verb: Some(SlowVerb {
            verb: "start".to_string(),
            delay: Duration::from_secs(2),
        }),
    };
    let stub = spawn_stub(&options)?;
    let config = attach_config_with_call_timeout(stub.base_url(), Duration::from_millis(150));
    let session = start_binder(&config)?;
    let wifi = BindingName::new("wifiAp");

    // Make start reachable so the slow path is the only difference.
    let result = session.invoke_with(&wifi, "setSsid", &CallArgument::Text("testAP".to_string()))?;
    assert_eq!(result.status, 0);

    match session.invoke(&wifi, "start") {
        Err(CallError::Timeout {
            verb, ..
        }) => assert_eq!(verb, "start"),
        other => panic!("expected Timeout, got {other:?}"),
    }

    // Subsequent calls on the same session are attempted and succeed.
    let result = session.invoke(&wifi, "getAPclientsNumber")?;
    assert_eq!(result.status, 0);
    Ok(())
}

/// Tests that no-argument calls behave identically across both arities.
#[test]
fn invoke_and_explicit_absence_are_equivalent() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let session = start_binder(&attach_config(stub.base_url()))?;
    let wifi = BindingName::new("wifiAp");

    let via_invoke = session.invoke(&wifi, "getAPclientsNumber")?;
    let via_none = session.call_sync(&wifi, "getAPclientsNumber", None)?;
    assert_eq!(via_invoke, via_none);
    assert_eq!(via_invoke.status, 0);
    assert_eq!(via_invoke.payload, Some(serde_json::json!(0)));
    Ok(())
}

/// Tests that the transcript records every round trip in order.
#[test]
fn transcript_records_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let session = start_binder(&attach_config(stub.base_url()))?;
    let wifi = BindingName::new("wifiAp");

    session.invoke_with(&wifi, "setSsid", &CallArgument::Text("testAP".to_string()))?;
    session.invoke_with(&wifi, "setChannel", &CallArgument::Integer(1))?;
    let _ = session.invoke(&BindingName::new("bluetooth"), "startScan");

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 3);
    let sequences: Vec<u64> = transcript.iter().map(|entry| entry.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(transcript[0].verb, "setSsid");
    assert_eq!(transcript[0].status, Some(0));
    assert_eq!(transcript[0].argument, Some(serde_json::json!("testAP")));
    assert!(transcript[2].error.is_some());
    assert_eq!(transcript[2].status, None);
    Ok(())
}
