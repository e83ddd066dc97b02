// crates/afb-conform-harness/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: TOML configuration model and validation for conformance runs.
// Purpose: Register binding modules and describe how to reach the binder host.
// Dependencies: afb-conform-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A [`HarnessConfig`] names the binder launch mode and the binding table
//! (`name -> module path`). Binding names are unique by construction since
//! the table is a map; validation rejects the reachable failure modes: an
//! empty table, an empty name, a missing module file in spawn mode, a
//! missing command or URL for
//! the selected mode, and zero timeouts. Validation runs before any binder
//! process is started, so configuration errors surface before the first case.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use afb_conform_core::BindingName;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default per-call timeout in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;
/// Default binder readiness timeout in milliseconds.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

/// Returns the default per-call timeout for serde.
const fn default_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

/// Returns the default readiness timeout for serde.
const fn default_ready_timeout_ms() -> u64 {
    DEFAULT_READY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration problems surfaced before any binder starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Configuration file could not be parsed as TOML.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// The binding table is empty.
    #[error("no bindings registered")]
    NoBindings,
    /// A binding was registered under an empty name.
    #[error("binding name must not be empty")]
    EmptyBindingName,
    /// A binding module path does not exist on disk.
    #[error("binding {name}: module {} not found", path.display())]
    MissingModule {
        /// Binding name.
        name: String,
        /// Module path that was not found.
        path: PathBuf,
    },
    /// Spawn mode requires a binder command.
    #[error("binder mode is spawn but no command is configured")]
    MissingCommand,
    /// Attach mode requires a binder URL.
    #[error("binder mode is attach but no url is configured")]
    MissingUrl,
    /// A timeout was configured as zero.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Offending configuration field.
        field: &'static str,
    },
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// How the harness obtains a running binder host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinderMode {
    /// Launch the configured binder command and own the process.
    #[default]
    Spawn,
    /// Attach to an already-running binder at the configured URL.
    Attach,
}

/// Binder host settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinderConfig {
    /// Launch mode; spawn by default.
    #[serde(default)]
    pub mode: BinderMode,
    /// Binder executable to launch (spawn mode).
    #[serde(default)]
    pub command: Option<PathBuf>,
    /// Base URL of a running binder (attach mode).
    #[serde(default)]
    pub url: Option<String>,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Readiness probe timeout in milliseconds.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    /// Optional file capturing the spawned binder's stderr.
    #[serde(default)]
    pub stderr_log: Option<PathBuf>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            mode: BinderMode::Spawn,
            command: None,
            url: None,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            stderr_log: None,
        }
    }
}

/// One validated binding registration.
///
/// # Invariants
/// - Name is unique within a run and non-empty; the module path existed at
///   validation time. Immutable after configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRegistration {
    /// Registered binding name.
    pub name: BindingName,
    /// Path of the pre-compiled binding module.
    pub module_path: PathBuf,
}

/// Harness configuration for one conformance run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Binder host settings.
    #[serde(default)]
    pub binder: BinderConfig,
    /// Binding table: name to module path. Keys are unique by construction.
    pub bindings: BTreeMap<String, PathBuf>,
}

impl HarnessConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration without side effects.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bindings.is_empty() {
            return Err(ConfigError::NoBindings);
        }
        for (name, path) in &self.bindings {
            if name.is_empty() {
                return Err(ConfigError::EmptyBindingName);
            }
            if self.binder.mode == BinderMode::Spawn && !path.exists() {
                return Err(ConfigError::MissingModule {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
        }
        match self.binder.mode {
            BinderMode::Spawn if self.binder.command.is_none() => {
                return Err(ConfigError::MissingCommand);
            }
            BinderMode::Attach if self.binder.url.is_none() => {
                return Err(ConfigError::MissingUrl);
            }
            BinderMode::Spawn | BinderMode::Attach => {}
        }
        if self.binder.call_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "binder.call_timeout_ms",
            });
        }
        if self.binder.ready_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "binder.ready_timeout_ms",
            });
        }
        Ok(())
    }

    /// Returns the validated binding registrations in name order.
    #[must_use]
    pub fn registrations(&self) -> Vec<BindingRegistration> {
        self.bindings
            .iter()
            .map(|(name, path)| BindingRegistration {
                name: BindingName::new(name.as_str()),
                module_path: path.clone(),
            })
            .collect()
    }

    /// Returns true when the named binding is registered.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.binder.call_timeout_ms)
    }

    /// Returns the readiness probe timeout.
    #[must_use]
    pub const fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.binder.ready_timeout_ms)
    }
}
