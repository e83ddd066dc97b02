// crates/afb-conform-harness/src/suite.rs
// ============================================================================
// Module: Scenario Suites
// Description: Declarative TOML scenario model and resolution.
// Purpose: Turn suite files into validated, binding-resolved case lists.
// Dependencies: afb-conform-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A suite file declares cases, each a sequence of steps: a verb, an optional
//! argument, an expected status (0 by default), an optional raw passthrough
//! flag, and an optional settle pause honored after a passing step.
//! [`Suite::resolve`] validates the suite against the harness configuration
//! (every step must resolve to a registered binding, raw steps must carry a
//! text argument) and produces the [`ResolvedSuite`] the runner consumes.
//! Resolution happens before the binder starts, so suite errors surface with
//! configuration errors rather than mid-run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use afb_conform_core::BindingName;
use afb_conform_core::CallArgument;
use afb_conform_core::VerbName;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Suite loading and resolution failures; fatal before any case runs.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Suite file could not be read.
    #[error("failed to read suite {}: {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Suite file could not be parsed as TOML.
    #[error("failed to parse suite: {0}")]
    Parse(String),
    /// The suite declares no cases.
    #[error("suite {0} declares no cases")]
    NoCases(String),
    /// Two cases share a name.
    #[error("duplicate case name {0}")]
    DuplicateCase(String),
    /// A case declares no steps.
    #[error("case {0} declares no steps")]
    NoSteps(String),
    /// A step verb is empty.
    #[error("case {0}: step {1} has an empty verb")]
    EmptyVerb(String, usize),
    /// A step resolves to no binding at any level.
    #[error("case {0}: step {1} names no binding (set it on the step, case, or suite)")]
    UnboundStep(String, usize),
    /// A step references an unregistered binding.
    #[error("case {case}: binding {binding} is not registered")]
    UnknownBinding {
        /// Case name.
        case: String,
        /// Unregistered binding name.
        binding: String,
    },
    /// A raw step carries a non-text argument.
    #[error("case {0}: step {1} sets raw = true but its argument is not a string")]
    RawRequiresText(String, usize),
    /// A step argument uses a TOML type with no wire form.
    #[error("case {case}: step {step} argument type {kind} is not supported")]
    UnsupportedArgument {
        /// Case name.
        case: String,
        /// Zero-based step index.
        step: usize,
        /// Offending TOML value kind.
        kind: &'static str,
    },
}

// ============================================================================
// SECTION: Suite File Model
// ============================================================================

/// Suite header.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteMeta {
    /// Suite name, used in reports.
    pub name: String,
    /// Default binding for every case in the suite.
    #[serde(default)]
    pub binding: Option<String>,
}

/// One declared case.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    /// Case name, unique within the suite.
    pub name: String,
    /// Default binding for the case's steps.
    #[serde(default)]
    pub binding: Option<String>,
    /// Steps executed in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<StepSpec>,
}

/// One declared step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Verb to invoke.
    pub verb: String,
    /// Binding override for this step.
    #[serde(default)]
    pub binding: Option<String>,
    /// Optional argument value.
    #[serde(default)]
    pub argument: Option<toml::Value>,
    /// Raw passthrough: ship the argument's bare bytes instead of JSON.
    #[serde(default)]
    pub raw: bool,
    /// Expected binding status; 0 by default.
    #[serde(default)]
    pub expect_status: i32,
    /// Pause after a passing step, in milliseconds.
    #[serde(default)]
    pub settle_ms: u64,
}

/// Parsed suite file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    /// Suite header.
    pub suite: SuiteMeta,
    /// Declared cases.
    #[serde(default, rename = "case")]
    pub cases: Vec<CaseSpec>,
}

// ============================================================================
// SECTION: Resolved Model
// ============================================================================

/// A step resolved against the harness configuration.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    /// Registered binding to invoke.
    pub binding: BindingName,
    /// Verb to invoke.
    pub verb: VerbName,
    /// Optional argument.
    pub argument: Option<CallArgument>,
    /// Expected binding status.
    pub expect_status: i32,
    /// Pause after a passing step.
    pub settle: Duration,
}

/// A case with every step resolved.
#[derive(Debug, Clone)]
pub struct ResolvedCase {
    /// Case name.
    pub name: String,
    /// Resolved steps in execution order.
    pub steps: Vec<ResolvedStep>,
}

/// A suite ready for execution.
#[derive(Debug, Clone)]
pub struct ResolvedSuite {
    /// Suite name.
    pub name: String,
    /// Resolved cases in declaration order.
    pub cases: Vec<ResolvedCase>,
}

// ============================================================================
// SECTION: Loading & Resolution
// ============================================================================

impl Suite {
    /// Loads a suite file.
    ///
    /// # Errors
    /// Returns [`SuiteError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let contents = fs::read_to_string(path).map_err(|source| SuiteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a suite from TOML text.
    ///
    /// # Errors
    /// Returns [`SuiteError::Parse`] when parsing fails.
    pub fn from_toml_str(contents: &str) -> Result<Self, SuiteError> {
        toml::from_str(contents).map_err(|err| SuiteError::Parse(err.to_string()))
    }

    /// Validates the suite against the configuration and resolves it.
    ///
    /// # Errors
    /// Returns the first [`SuiteError`] encountered.
    pub fn resolve(&self, config: &HarnessConfig) -> Result<ResolvedSuite, SuiteError> {
        if self.cases.is_empty() {
            return Err(SuiteError::NoCases(self.suite.name.clone()));
        }
        let mut seen = Vec::new();
        let mut cases = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            if seen.contains(&case.name) {
                return Err(SuiteError::DuplicateCase(case.name.clone()));
            }
            seen.push(case.name.clone());
            cases.push(resolve_case(self, case, config)?);
        }
        Ok(ResolvedSuite {
            name: self.suite.name.clone(),
            cases,
        })
    }
}

/// Resolves one case against the suite defaults and configuration.
fn resolve_case(
    suite: &Suite,
    case: &CaseSpec,
    config: &HarnessConfig,
) -> Result<ResolvedCase, SuiteError> {
    if case.steps.is_empty() {
        return Err(SuiteError::NoSteps(case.name.clone()));
    }
    let mut steps = Vec::with_capacity(case.steps.len());
    for (index, step) in case.steps.iter().enumerate() {
        steps.push(resolve_step(suite, case, step, index, config)?);
    }
    Ok(ResolvedCase {
        name: case.name.clone(),
        steps,
    })
}

/// Resolves one step: binding lookup, argument conversion, raw handling.
fn resolve_step(
    suite: &Suite,
    case: &CaseSpec,
    step: &StepSpec,
    index: usize,
    config: &HarnessConfig,
) -> Result<ResolvedStep, SuiteError> {
    if step.verb.is_empty() {
        return Err(SuiteError::EmptyVerb(case.name.clone(), index));
    }
    let binding = step
        .binding
        .as_deref()
        .or(case.binding.as_deref())
        .or(suite.suite.binding.as_deref())
        .ok_or_else(|| SuiteError::UnboundStep(case.name.clone(), index))?;
    if !config.is_registered(binding) {
        return Err(SuiteError::UnknownBinding {
            case: case.name.clone(),
            binding: binding.to_string(),
        });
    }
    let argument = match &step.argument {
        None => None,
        Some(value) if step.raw => match value {
            toml::Value::String(text) => Some(CallArgument::Raw(text.clone())),
            _ => return Err(SuiteError::RawRequiresText(case.name.clone(), index)),
        },
        Some(value) => {
            let json = toml_value_to_json(value).map_err(|kind| SuiteError::UnsupportedArgument {
                case: case.name.clone(),
                step: index,
                kind,
            })?;
            Some(CallArgument::from_json(json))
        }
    };
    Ok(ResolvedStep {
        binding: BindingName::new(binding),
        verb: VerbName::new(step.verb.as_str()),
        argument,
        expect_status: step.expect_status,
        settle: Duration::from_millis(step.settle_ms),
    })
}

/// Converts a TOML value into its JSON equivalent.
///
/// Datetimes and non-finite floats have no wire form and are rejected.
fn toml_value_to_json(value: &toml::Value) -> Result<Value, &'static str> {
    match value {
        toml::Value::String(text) => Ok(Value::String(text.clone())),
        toml::Value::Integer(number) => Ok(Value::from(*number)),
        toml::Value::Float(number) => {
            serde_json::Number::from_f64(*number).map(Value::Number).ok_or("non-finite float")
        }
        toml::Value::Boolean(flag) => Ok(Value::Bool(*flag)),
        toml::Value::Datetime(_) => Err("datetime"),
        toml::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(toml_value_to_json(item)?);
            }
            Ok(Value::Array(out))
        }
        toml::Value::Table(table) => {
            let mut out = serde_json::Map::with_capacity(table.len());
            for (key, item) in table {
                out.insert(key.clone(), toml_value_to_json(item)?);
            }
            Ok(Value::Object(out))
        }
    }
}
