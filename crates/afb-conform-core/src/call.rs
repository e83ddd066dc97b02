// crates/afb-conform-core/src/call.rs
// ============================================================================
// Module: Call Results
// Description: Normalized result of a synchronous verb invocation.
// Purpose: Carry the binding-reported status, info text, and payload.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CallResult`] is the normalized outcome of one successful RPC round
//! trip. `status == 0` denotes success by convention of the bound system; any
//! nonzero status is a binding-reported failure carried in a *successful*
//! round trip; transport failures and timeouts never produce a `CallResult`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Result Type
// ============================================================================

/// Normalized reply of a verb invocation.
///
/// # Invariants
/// - Immutable once returned by the call client.
/// - Payload semantics belong to the binding; the harness never interprets
///   them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    /// Binding-reported status code; `0` is success.
    pub status: i32,
    /// Optional human-readable info string from the binding.
    pub info: Option<String>,
    /// Optional reply payload.
    pub payload: Option<Value>,
}

impl CallResult {
    /// Returns true when the binding reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 0
    }
}
