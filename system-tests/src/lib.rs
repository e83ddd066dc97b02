// system-tests/src/lib.rs
// ============================================================================
// Module: AFB Conform System Tests Library
// Description: Shared stub binder used by system-test suites and binaries.
// Purpose: Provide a wifiAp binder emulation for end-to-end harness tests.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! This crate hosts the stub binder shared by the system-test suites in
//! `system-tests/tests` and the `stub-binder` binary used for spawn-mode
//! lifecycle tests. The stub speaks the binder wire dialect the harness
//! expects and emulates the wifiAp binding's verb surface and argument
//! contracts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod stub;
