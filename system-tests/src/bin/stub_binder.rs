// system-tests/src/bin/stub_binder.rs
// ============================================================================
// Module: Stub Binder Binary
// Description: Standalone binder host emulation for spawn-mode tests.
// Purpose: Accept the harness launch arguments and serve the stub binder.
// Dependencies: system-tests
// ============================================================================

//! ## Overview
//! The harness launches this binary in spawn mode with
//! `--port N --binding name:path ...`. Module paths are accepted but not
//! loaded; the stub emulates the wifiAp binding in-process. The process
//! serves until it is killed by the harness teardown.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::io::Write;
use std::process::ExitCode;

use system_tests::stub::StubOptions;
use system_tests::stub::serve_blocking;

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

/// Parsed launch arguments.
struct LaunchArgs {
    /// Port to serve on.
    port: u16,
    /// Binding names to expose.
    bindings: Vec<String>,
}

/// Parses `--port N` and repeated `--binding name:path` arguments.
fn parse_args(args: &[String]) -> Result<LaunchArgs, String> {
    let mut port = None;
    let mut bindings = Vec::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--port" => {
                let value = iter.next().ok_or("missing value for --port")?;
                let parsed = value.parse::<u16>().map_err(|_| "invalid --port value")?;
                port = Some(parsed);
            }
            "--binding" => {
                let value = iter.next().ok_or("missing value for --binding")?;
                let name = value.split(':').next().unwrap_or_default();
                if name.is_empty() {
                    return Err("empty binding name in --binding".to_string());
                }
                bindings.push(name.to_string());
            }
            other => return Err(format!("unknown argument {other}")),
        }
    }
    let port = port.ok_or("missing --port")?;
    if bindings.is_empty() {
        return Err("at least one --binding is required".to_string());
    }
    Ok(LaunchArgs {
        port,
        bindings,
    })
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Binary entry point.
fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let launch = match parse_args(&args) {
        Ok(launch) => launch,
        Err(message) => return emit_error(&message),
    };
    let options = StubOptions {
        bindings: launch.bindings,
        slow_verb: None,
    };
    match serve_blocking(&options, launch.port) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => emit_error(&message),
    }
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
