// crates/afb-conform-harness/src/report.rs
// ============================================================================
// Module: Run Reporting
// Description: Summary rendering and JSON report artifacts.
// Purpose: Surface per-case verdicts and persist machine-readable reports.
// Dependencies: afb-conform-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Rendering produces one line per case plus a totals line; artifacts are a
//! JSON summary and, when requested, the session call transcript. Payload
//! semantics are never interpreted here, only statuses and verdicts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use afb_conform_core::CaseOutcome;
use afb_conform_core::RunSummary;
use serde::Serialize;

use crate::client::TranscriptEntry;

// ============================================================================
// SECTION: Artifact Model
// ============================================================================

/// Serialized run report.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    /// Name of the executed suite (or combined run).
    name: &'a str,
    /// Passed case count.
    passed: usize,
    /// Failed case count.
    failed: usize,
    /// Errored case count.
    errored: usize,
    /// Per-case reports.
    summary: &'a RunSummary,
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the human-readable run summary.
#[must_use]
pub fn render_summary(name: &str, summary: &RunSummary) -> String {
    let mut out = String::new();
    for case in &summary.cases {
        let line = match &case.outcome {
            CaseOutcome::Passed => format!("PASS {} ({} ms)", case.name, case.duration_ms),
            CaseOutcome::Failed {
                step,
                expected,
                actual,
                info,
            } => {
                let info = info.as_deref().unwrap_or("no info");
                format!(
                    "FAIL {} step {}: expected status {expected}, got {actual} ({info})",
                    case.name, step
                )
            }
            CaseOutcome::Errored {
                step,
                message,
            } => format!("ERROR {} step {}: {message}", case.name, step),
        };
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(
        out,
        "{name}: {} passed, {} failed, {} errored ({} total)",
        summary.passed(),
        summary.failed(),
        summary.errored(),
        summary.total()
    );
    out
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Writes the JSON run report into the report directory.
///
/// # Errors
/// Returns an I/O error when the directory or file cannot be written.
pub fn write_report(dir: &Path, name: &str, summary: &RunSummary) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let report = RunReport {
        name,
        passed: summary.passed(),
        failed: summary.failed(),
        errored: summary.errored(),
        summary,
    };
    let bytes = serde_json::to_vec_pretty(&report).map_err(io::Error::other)?;
    let path = dir.join(format!("{name}-summary.json"));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Writes the session call transcript into the report directory.
///
/// # Errors
/// Returns an I/O error when the directory or file cannot be written.
pub fn write_transcript(
    dir: &Path,
    name: &str,
    transcript: &[TranscriptEntry],
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let bytes = serde_json::to_vec_pretty(transcript).map_err(io::Error::other)?;
    let path = dir.join(format!("{name}-transcript.json"));
    fs::write(&path, bytes)?;
    Ok(path)
}
