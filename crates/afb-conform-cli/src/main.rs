// crates/afb-conform-cli/src/main.rs
// ============================================================================
// Module: AFB Conform CLI Entry Point
// Description: Command dispatcher for conformance runs and ad-hoc calls.
// Purpose: Configure, execute, and report binding conformance suites.
// Dependencies: afb-conform-core, afb-conform-harness, clap, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The afb-conform CLI wires the harness into a conventional test-runner
//! surface: `run` executes suites against a binder and exits nonzero when any
//! case fails, `validate` checks configuration and suites without starting a
//! binder, and `call` issues a single ad-hoc verb invocation. Configuration
//! and startup errors abort before any case runs; per-case failures are
//! reported in the summary and only affect the exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use afb_conform_core::BindingName;
use afb_conform_core::CallArgument;
use afb_conform_core::RunSummary;
use afb_conform_harness::BinderSession;
use afb_conform_harness::HarnessConfig;
use afb_conform_harness::ResolvedSuite;
use afb_conform_harness::Suite;
use afb_conform_harness::report;
use afb_conform_harness::run_suite;
use afb_conform_harness::start_binder;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "afb-conform", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run conformance suites against a binder.
    Run(RunCommand),
    /// Validate configuration and suites without starting a binder.
    Validate(ValidateCommand),
    /// Issue a single ad-hoc verb invocation.
    Call(CallCommand),
}

/// Arguments of the `run` subcommand.
#[derive(Args, Debug)]
struct RunCommand {
    /// Harness configuration file.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Suite files to execute, in order.
    #[arg(value_name = "SUITE", required = true)]
    suites: Vec<PathBuf>,
    /// Directory receiving JSON report artifacts.
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
    /// Per-call timeout override in milliseconds.
    #[arg(long, value_name = "MS")]
    call_timeout_ms: Option<u64>,
}

/// Arguments of the `validate` subcommand.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Harness configuration file.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Suite files to validate against the configuration.
    #[arg(value_name = "SUITE")]
    suites: Vec<PathBuf>,
}

/// Arguments of the `call` subcommand.
#[derive(Args, Debug)]
struct CallCommand {
    /// Harness configuration file.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Binding to invoke.
    #[arg(value_name = "BINDING")]
    binding: String,
    /// Verb to invoke.
    #[arg(value_name = "VERB")]
    verb: String,
    /// JSON-encoded argument value.
    #[arg(long, value_name = "JSON", conflicts_with = "raw")]
    arg: Option<String>,
    /// Raw passthrough argument: ship the bare bytes instead of JSON.
    #[arg(long, value_name = "TEXT")]
    raw: Option<String>,
}

// ============================================================================
// SECTION: Error Type
// ============================================================================

/// Terminal CLI error with a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(&command),
        Commands::Validate(command) => command_validate(&command),
        Commands::Call(command) => command_call(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Loads and validates the configuration, applying CLI overrides.
fn load_config(path: &Path, call_timeout_ms: Option<u64>) -> CliResult<HarnessConfig> {
    let mut config = HarnessConfig::load(path).map_err(|err| CliError::new(err.to_string()))?;
    if let Some(timeout) = call_timeout_ms {
        config.binder.call_timeout_ms = timeout;
        config.validate().map_err(|err| CliError::new(err.to_string()))?;
    }
    Ok(config)
}

/// Loads and resolves every suite before the binder starts.
fn resolve_suites(
    paths: &[PathBuf],
    config: &HarnessConfig,
) -> CliResult<Vec<ResolvedSuite>> {
    let mut resolved = Vec::with_capacity(paths.len());
    for path in paths {
        let suite = Suite::load(path).map_err(|err| CliError::new(err.to_string()))?;
        resolved.push(suite.resolve(config).map_err(|err| CliError::new(err.to_string()))?);
    }
    Ok(resolved)
}

/// Executes the `run` subcommand.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config, command.call_timeout_ms)?;
    let suites = resolve_suites(&command.suites, &config)?;
    let mut session = start_binder(&config).map_err(|err| CliError::new(err.to_string()))?;

    let mut all_passed = true;
    for suite in &suites {
        let summary = run_suite(&session, suite);
        all_passed = all_passed && summary.success();
        write_stdout(&report::render_summary(&suite.name, &summary))?;
        if let Some(dir) = &command.report_dir {
            write_artifacts(dir, suite, &summary, &session)?;
        }
    }

    session.stop();
    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Writes the report artifacts for one executed suite.
fn write_artifacts(
    dir: &Path,
    suite: &ResolvedSuite,
    summary: &RunSummary,
    session: &BinderSession,
) -> CliResult<()> {
    report::write_report(dir, &suite.name, summary)
        .map_err(|err| CliError::new(format!("failed to write report: {err}")))?;
    report::write_transcript(dir, &suite.name, &session.transcript())
        .map_err(|err| CliError::new(format!("failed to write transcript: {err}")))?;
    Ok(())
}

/// Executes the `validate` subcommand.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config, None)?;
    let suites = resolve_suites(&command.suites, &config)?;
    let bindings = config.registrations().len();
    write_stdout_line(&format!(
        "configuration ok: {bindings} binding(s), {} suite(s)",
        suites.len()
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `call` subcommand.
fn command_call(command: &CallCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config, None)?;
    if !config.is_registered(&command.binding) {
        return Err(CliError::new(format!("binding {} is not registered", command.binding)));
    }
    let argument = parse_call_argument(command.arg.as_deref(), command.raw.as_deref())?;

    let mut session = start_binder(&config).map_err(|err| CliError::new(err.to_string()))?;
    let binding = BindingName::new(command.binding.as_str());
    let outcome = session.call_sync(&binding, &command.verb, argument.as_ref());
    session.stop();

    let result = outcome.map_err(|err| CliError::new(err.to_string()))?;
    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| CliError::new(format!("failed to render result: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Parses the ad-hoc call argument from `--arg` / `--raw`.
fn parse_call_argument(
    arg: Option<&str>,
    raw: Option<&str>,
) -> CliResult<Option<CallArgument>> {
    if let Some(text) = raw {
        return Ok(Some(CallArgument::Raw(text.to_string())));
    }
    match arg {
        None => Ok(None),
        Some(json) => {
            let value: serde_json::Value = serde_json::from_str(json)
                .map_err(|err| CliError::new(format!("invalid --arg json: {err}")))?;
            Ok(Some(CallArgument::from_json(value)))
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes text to stdout without an extra newline.
fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
