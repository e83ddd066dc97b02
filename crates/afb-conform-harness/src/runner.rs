// crates/afb-conform-harness/src/runner.rs
// ============================================================================
// Module: Suite Runner
// Description: Sequential case execution with per-case error isolation.
// Purpose: Drive resolved suites against a binder session and collect outcomes.
// Dependencies: afb-conform-core
// ============================================================================

//! ## Overview
//! Cases run sequentially on the calling thread; each step blocks until its
//! reply or timeout. A failed status assertion or a call error stops the
//! current case and records its outcome, then the run continues with the next
//! case; one failing verb never blocks unrelated cases. A step's settle
//! pause is honored only after the step passes; the runner inserts no other
//! delays.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;
use std::time::Instant;

use afb_conform_core::CaseOutcome;
use afb_conform_core::CaseReport;
use afb_conform_core::RunSummary;

use crate::binder::BinderSession;
use crate::suite::ResolvedCase;
use crate::suite::ResolvedSuite;

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs every case of a resolved suite against the session.
///
/// The session and its loaded bindings are shared, read/write, across all
/// cases: side effects of one case (an SSID set, an access point started)
/// persist into the next.
#[must_use]
pub fn run_suite(session: &BinderSession, suite: &ResolvedSuite) -> RunSummary {
    let mut summary = RunSummary::default();
    for case in &suite.cases {
        summary.record(run_case(session, case));
    }
    summary
}

/// Runs one case and reports its outcome.
fn run_case(session: &BinderSession, case: &ResolvedCase) -> CaseReport {
    let started = Instant::now();
    let outcome = execute_steps(session, case);
    CaseReport {
        name: case.name.clone(),
        outcome,
        duration_ms: duration_ms(started.elapsed()),
    }
}

/// Executes a case's steps until one fails or errors.
fn execute_steps(session: &BinderSession, case: &ResolvedCase) -> CaseOutcome {
    for (index, step) in case.steps.iter().enumerate() {
        let result = match session.call_sync(&step.binding, step.verb.as_str(), step.argument.as_ref()) {
            Ok(result) => result,
            Err(err) => {
                return CaseOutcome::Errored {
                    step: index,
                    message: err.to_string(),
                };
            }
        };
        if result.status != step.expect_status {
            return CaseOutcome::Failed {
                step: index,
                expected: step.expect_status,
                actual: result.status,
                info: result.info,
            };
        }
        if !step.settle.is_zero() {
            thread::sleep(step.settle);
        }
    }
    CaseOutcome::Passed
}

/// Converts a duration to whole milliseconds without truncation surprises.
fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
