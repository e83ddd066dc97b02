// crates/afb-conform-core/tests/argument.rs
// ============================================================================
// Module: Call Argument Tests
// Description: Marshaling round-trip and raw passthrough tests.
// Purpose: Guard the native-value and bare-string wire contracts.
// Dependencies: afb-conform-core, proptest, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`afb_conform_core::CallArgument`] marshaling invariants.

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

use afb_conform_core::CallArgument;
use afb_conform_core::argument::CONTENT_TYPE_JSON;
use afb_conform_core::argument::CONTENT_TYPE_RAW;
use proptest::prelude::proptest;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Round-Trip Tests
// ============================================================================

/// Tests that scalar arguments survive a marshal/decode round trip.
#[test]
fn scalar_arguments_round_trip_through_marshal() {
    let cases = vec![
        CallArgument::Bool(true),
        CallArgument::Bool(false),
        CallArgument::Integer(0),
        CallArgument::Integer(-42),
        CallArgument::Text("testAP".to_string()),
        CallArgument::Text(String::new()),
    ];
    for argument in cases {
        let decoded = CallArgument::from_json(argument.marshal());
        assert_eq!(decoded, argument);
    }
}

/// Tests that structured values stay structured through the round trip.
#[test]
fn structured_argument_round_trips_as_json() {
    let argument = CallArgument::from_json(json!({"ip_ap": "192.168.2.1"}));
    assert_eq!(argument, CallArgument::Json(json!({"ip_ap": "192.168.2.1"})));
    assert_eq!(CallArgument::from_json(argument.marshal()), argument);
}

/// Tests that non-i64 numbers are kept as structured JSON.
#[test]
fn fractional_number_stays_structured() {
    let argument = CallArgument::from_json(json!(2.5));
    assert!(matches!(argument, CallArgument::Json(_)));
}

proptest! {
    /// Property: text arguments round-trip for arbitrary strings.
    #[test]
    fn text_round_trip_holds_for_arbitrary_strings(text in ".*") {
        let argument = CallArgument::Text(text);
        let decoded = CallArgument::from_json(argument.marshal());
        assert_eq!(decoded, argument);
    }

    /// Property: integer arguments round-trip across the full i64 range.
    #[test]
    fn integer_round_trip_holds_for_arbitrary_integers(number in proptest::num::i64::ANY) {
        let argument = CallArgument::Integer(number);
        let decoded = CallArgument::from_json(argument.marshal());
        assert_eq!(decoded, argument);
    }
}

// ============================================================================
// SECTION: Wire Encoding Tests
// ============================================================================

/// Tests that a text argument is single-encoded JSON on the wire.
#[test]
fn text_argument_is_single_encoded_on_the_wire() {
    let argument = CallArgument::Text("WPA2".to_string());
    let bytes = argument.to_wire_bytes().expect("encode");
    assert_eq!(bytes, b"\"WPA2\"");
    // The defective double-encoded form would be "\"WPA2\"" quoted again.
    let decoded: Value = serde_json::from_slice(&bytes).expect("decode");
    assert_eq!(decoded, Value::String("WPA2".to_string()));
}

/// Tests that raw passthrough ships the bare bytes with text/plain.
#[test]
fn raw_argument_ships_bare_bytes() {
    let argument = CallArgument::Raw("WPA2".to_string());
    let bytes = argument.to_wire_bytes().expect("encode");
    assert_eq!(bytes, b"WPA2");
    assert_eq!(argument.content_type(), CONTENT_TYPE_RAW);
    assert!(argument.is_raw());
}

/// Tests wire bodies and content types for the JSON-mode variants.
#[test]
fn json_mode_variants_use_json_content_type() {
    let cases: Vec<(CallArgument, &[u8])> = vec![
        (CallArgument::Bool(true), b"true"),
        (CallArgument::Integer(1), b"1"),
        (CallArgument::Json(json!([1, 2])), b"[1,2]"),
    ];
    for (argument, expected) in cases {
        assert_eq!(argument.to_wire_bytes().expect("encode"), expected);
        assert_eq!(argument.content_type(), CONTENT_TYPE_JSON);
        assert!(!argument.is_raw());
    }
}

/// Tests that decoding never produces the raw variant.
#[test]
fn from_json_never_produces_raw() {
    let decoded = CallArgument::from_json(Value::String("WPA2".to_string()));
    assert_eq!(decoded, CallArgument::Text("WPA2".to_string()));
}
