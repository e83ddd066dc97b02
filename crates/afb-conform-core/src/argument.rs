// crates/afb-conform-core/src/argument.rs
// ============================================================================
// Module: Call Argument Marshaling
// Description: Verb argument model and wire encoding rules.
// Purpose: Pass scalar arguments natively, with a raw passthrough mode.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`CallArgument`] carries the single optional argument of a verb call.
//! Scalars (bool, integer, text) marshal to their native JSON values: a text
//! argument becomes a single-encoded JSON string, never a quoted JSON literal
//! wrapped in another string. [`CallArgument::Raw`] bypasses JSON encoding
//! entirely and ships the bare bytes for bindings that expect an unquoted
//! scalar on the wire.
//! Invariants:
//! - `from_json(marshal(x)) == x` for `Bool`, `Integer`, and `Text`.
//! - `Raw` is never produced by [`CallArgument::from_json`]; it is an explicit
//!   caller choice.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Content Types
// ============================================================================

/// Wire content type for JSON-encoded arguments.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Wire content type for raw passthrough arguments.
pub const CONTENT_TYPE_RAW: &str = "text/plain";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to encode an argument for the wire.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// JSON serialization of the argument value failed.
    #[error("argument json encoding failed: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Argument Model
// ============================================================================

/// Single optional argument of a verb call.
///
/// # Invariants
/// - Scalar variants round-trip losslessly through [`CallArgument::marshal`]
///   and [`CallArgument::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallArgument {
    /// Boolean argument, sent as a JSON boolean.
    Bool(bool),
    /// Integer argument, sent as a JSON number.
    Integer(i64),
    /// Text argument, sent as a single-encoded JSON string.
    Text(String),
    /// Structured argument, sent as-is.
    Json(Value),
    /// Raw passthrough: the bare bytes of the string, outside any JSON framing.
    Raw(String),
}

impl CallArgument {
    /// Decodes a JSON value into the closest-fitting argument variant.
    ///
    /// Scalars map to their dedicated variants; everything else (including
    /// non-`i64` numbers) stays structured.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => {
                number.as_i64().map_or_else(|| Self::Json(Value::Number(number)), Self::Integer)
            }
            Value::String(text) => Self::Text(text),
            other => Self::Json(other),
        }
    }

    /// Returns the argument's native JSON value.
    ///
    /// `Raw` renders as a JSON string here for transcripts and reports; its
    /// wire form is produced by [`CallArgument::to_wire_bytes`] instead.
    #[must_use]
    pub fn marshal(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Integer(number) => Value::from(*number),
            Self::Text(text) | Self::Raw(text) => Value::String(text.clone()),
            Self::Json(value) => value.clone(),
        }
    }

    /// Encodes the argument into its wire body.
    ///
    /// # Errors
    /// Returns [`MarshalError::Json`] when JSON serialization fails.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, MarshalError> {
        match self {
            Self::Raw(text) => Ok(text.clone().into_bytes()),
            other => serde_json::to_vec(&other.marshal())
                .map_err(|err| MarshalError::Json(err.to_string())),
        }
    }

    /// Returns the wire content type for the argument.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Raw(_) => CONTENT_TYPE_RAW,
            _ => CONTENT_TYPE_JSON,
        }
    }

    /// Returns true when the argument uses raw passthrough encoding.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}
