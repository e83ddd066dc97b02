// crates/afb-conform-core/src/outcome.rs
// ============================================================================
// Module: Case Outcomes
// Description: Per-case verdicts and run-level accounting.
// Purpose: Give test cases a uniform way to report and aggregate outcomes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each executed case yields a [`CaseOutcome`]: passed, failed (a reply
//! arrived but the status assertion did not hold), or errored (the call
//! itself failed, e.g. a timeout or an unknown binding). A [`RunSummary`]
//! aggregates the reports of one run; overall success requires every case to
//! pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Outcome Types
// ============================================================================

/// Verdict of a single executed case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Every step returned its expected status.
    Passed,
    /// A step's reply arrived but its status did not match the expectation.
    Failed {
        /// Zero-based index of the failing step.
        step: usize,
        /// Expected binding status.
        expected: i32,
        /// Actual binding status.
        actual: i32,
        /// Info string from the reply, when present.
        info: Option<String>,
    },
    /// A step's call did not complete (timeout, transport, unknown binding).
    Errored {
        /// Zero-based index of the erroring step.
        step: usize,
        /// Rendered call error.
        message: String,
    },
}

impl CaseOutcome {
    /// Returns true for a passing outcome.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Report of one executed case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Case name from the suite.
    pub name: String,
    /// Case verdict.
    pub outcome: CaseOutcome,
    /// Wall-clock duration of the case in milliseconds.
    pub duration_ms: u64,
}

/// Aggregated outcome of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Per-case reports in execution order.
    pub cases: Vec<CaseReport>,
}

impl RunSummary {
    /// Appends a case report.
    pub fn record(&mut self, report: CaseReport) {
        self.cases.push(report);
    }

    /// Merges another summary into this one, preserving order.
    pub fn absorb(&mut self, other: Self) {
        self.cases.extend(other.cases);
    }

    /// Number of passed cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.outcome.is_pass()).count()
    }

    /// Number of failed cases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.cases
            .iter()
            .filter(|case| matches!(case.outcome, CaseOutcome::Failed { .. }))
            .count()
    }

    /// Number of errored cases.
    #[must_use]
    pub fn errored(&self) -> usize {
        self.cases
            .iter()
            .filter(|case| matches!(case.outcome, CaseOutcome::Errored { .. }))
            .count()
    }

    /// Total number of executed cases.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Returns true when every case passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.cases.iter().all(|case| case.outcome.is_pass())
    }
}
