// crates/afb-conform-harness/src/lib.rs
// ============================================================================
// Module: AFB Conform Harness Library
// Description: Binder lifecycle, synchronous call client, suites, and runner.
// Purpose: Drive an RPC-exposed binding through declarative scenario suites.
// Dependencies: afb-conform-core, reqwest, serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! The harness owns the binder host lifecycle (spawn or attach, readiness
//! probe, idempotent stop), exposes the blocking [`BinderSession::call_sync`]
//! primitive with a per-call timeout, loads declarative TOML suites, and runs
//! them sequentially with per-case error isolation.
//! Invariants:
//! - Exactly one [`BinderSession`] is active per run; the harness exclusively
//!   owns its startup and shutdown.
//! - A nonzero binding status is a successful round trip, never a harness
//!   error; timeouts and transport failures are [`client::CallError`]s.
//! - A timed-out call leaves the session usable for subsequent calls.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod binder;
pub mod client;
pub mod config;
pub mod report;
pub mod runner;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use binder::BinderSession;
pub use binder::StartupError;
pub use binder::start_binder;
pub use client::CallError;
pub use client::TranscriptEntry;
pub use config::BinderConfig;
pub use config::BinderMode;
pub use config::BindingRegistration;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use runner::run_suite;
pub use suite::ResolvedSuite;
pub use suite::Suite;
pub use suite::SuiteError;
