// system-tests/tests/lifecycle.rs
// ============================================================================
// Module: Binder Lifecycle Tests
// Description: Spawn/attach startup, readiness, and idempotent stop tests.
// Purpose: Ensure the harness owns binder startup and teardown deterministically.
// Dependencies: afb-conform-harness, system-tests, tempfile
// ============================================================================

//! ## Overview
//! Exercises [`afb_conform_harness::start_binder`] across both launch modes,
//! including startup failures, readiness timeouts, and stop idempotence.

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

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use afb_conform_core::BindingName;
use afb_conform_harness::StartupError;
use afb_conform_harness::start_binder;
use helpers::fixtures::attach_config_with_call_timeout;
use helpers::fixtures::spawn_config;
use system_tests::stub::StubOptions;
use system_tests::stub::spawn_stub;
use tempfile::TempDir;

/// Path of the stub-binder binary built alongside these tests.
fn stub_binder_command() -> &'static Path {
    Path::new(env!("CARGO_BIN_EXE_stub-binder"))
}

/// Tests the full spawn-mode lifecycle: start, call, stop, stop again.
#[test]
fn spawn_mode_lifecycle_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let config = spawn_config(stub_binder_command(), temp.path())?;
    let mut session = start_binder(&config)?;

    let bindings = session.bindings();
    assert_eq!(bindings, vec![BindingName::new("wifiAp")]);

    let result = session.invoke_with(
        &BindingName::new("wifiAp"),
        "setSsid",
        &afb_conform_core::CallArgument::Text("testAP".to_string()),
    )?;
    assert_eq!(result.status, 0);

    session.stop();
    // Stopping an already-stopped session is a no-op.
    session.stop();
    Ok(())
}

/// Tests that attach-mode sessions never own a process and stop idempotently.
#[test]
fn attach_mode_stop_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let config = attach_config_with_call_timeout(stub.base_url(), Duration::from_secs(5));
    let mut session = start_binder(&config)?;
    session.stop();
    session.stop();

    // The stub outlives the session: attach-mode stop releases nothing remote.
    let config = attach_config_with_call_timeout(stub.base_url(), Duration::from_secs(5));
    let session = start_binder(&config)?;
    let result = session.invoke(&BindingName::new("wifiAp"), "getAPclientsNumber")?;
    assert_eq!(result.status, 0);
    Ok(())
}

/// Tests that a missing binder executable fails startup with a spawn error.
#[test]
fn missing_binder_command_fails_spawn() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut config = spawn_config(stub_binder_command(), temp.path())?;
    config.binder.command = Some(PathBuf::from("/no/such/afb-binder"));
    match start_binder(&config) {
        Err(StartupError::Spawn {
            ..
        }) => Ok(()),
        Err(other) => panic!("expected Spawn error, got {other}"),
        Ok(_) => panic!("expected Spawn error, got a session"),
    }
}

/// Tests that an unreachable binder fails readiness within the timeout.
#[test]
fn unreachable_binder_fails_readiness() {
    let mut config =
        attach_config_with_call_timeout("http://127.0.0.1:9", Duration::from_millis(200));
    config.binder.ready_timeout_ms = 300;
    match start_binder(&config) {
        Err(StartupError::Readiness {
            attempts, ..
        }) => assert!(attempts >= 1),
        Err(other) => panic!("expected Readiness error, got {other}"),
        Ok(_) => panic!("expected Readiness error, got a session"),
    }
}

/// Tests that readiness requires every registered binding to be exposed.
#[test]
fn readiness_requires_all_registered_bindings() -> Result<(), Box<dyn std::error::Error>> {
    let stub = spawn_stub(&StubOptions::wifiap())?;
    let mut config = attach_config_with_call_timeout(stub.base_url(), Duration::from_secs(1));
    config.binder.ready_timeout_ms = 300;
    config.bindings.insert("bluetooth".to_string(), PathBuf::from("bluetooth-binding.so"));
    match start_binder(&config) {
        Err(StartupError::Readiness {
            last_error, ..
        }) => {
            assert!(last_error.contains("bluetooth"), "unexpected error: {last_error}");
            Ok(())
        }
        Err(other) => panic!("expected Readiness error, got {other}"),
        Ok(_) => panic!("expected Readiness error, got a session"),
    }
}

/// Tests that the spawned binder writes its stderr to the configured log.
#[test]
fn spawn_mode_creates_stderr_log() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let config = spawn_config(stub_binder_command(), temp.path())?;
    let mut session = start_binder(&config)?;
    session.stop();
    assert!(temp.path().join("binder-stderr.log").exists());
    Ok(())
}
