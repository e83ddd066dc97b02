// crates/afb-conform-core/src/lib.rs
// ============================================================================
// Module: AFB Conform Core Library
// Description: Canonical data model for binding conformance runs.
// Purpose: Provide identifiers, call arguments, call results, and outcomes.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! AFB Conform Core defines the data model shared by the harness and the CLI:
//! binding and verb identifiers, the call argument marshaling rules, the
//! normalized call result, and per-case outcome accounting.
//! Invariants:
//! - Argument marshaling is lossless for scalar arguments (bool, integer,
//!   text): decoding a marshaled value yields the original argument.
//! - A [`CallResult`] is immutable once constructed; `status == 0` is the sole
//!   success signal by convention of the bound system.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod argument;
pub mod call;
pub mod identifiers;
pub mod outcome;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use argument::CallArgument;
pub use argument::MarshalError;
pub use call::CallResult;
pub use identifiers::BindingName;
pub use identifiers::VerbName;
pub use outcome::CaseOutcome;
pub use outcome::CaseReport;
pub use outcome::RunSummary;
