// crates/afb-conform-harness/src/binder.rs
// ============================================================================
// Module: Binder Lifecycle
// Description: Spawn or attach to a binder host and manage its lifetime.
// Purpose: Provide deterministic binder startup, readiness, and teardown.
// Dependencies: afb-conform-core, reqwest, thiserror, url
// ============================================================================

//! ## Overview
//! [`start_binder`] stands the binder host up before the first case runs: in
//! spawn mode it launches the configured command on an allocated loopback
//! port with one `--binding name:path` argument per registration, then polls
//! the binder's api listing until every registered binding is exposed (no
//! arbitrary sleeps). Attach mode probes an already-running binder the same
//! way. The returned [`BinderSession`] owns the child process when one was
//! spawned; [`BinderSession::stop`] is idempotent and `Drop` kills a child
//! that is still running.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use afb_conform_core::BindingName;
use thiserror::Error;
use url::Url;

use crate::client::TranscriptEntry;
use crate::client::fetch_api_listing;
use crate::config::BinderMode;
use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delay between readiness probe attempts.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Binder startup failures; fatal to the whole run.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No free loopback port could be allocated.
    #[error("failed to allocate loopback port: {0}")]
    PortAllocation(io::Error),
    /// The stderr log file could not be created.
    #[error("failed to create stderr log {}: {source}", path.display())]
    StderrLog {
        /// Log path that failed to create.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The binder command failed to spawn.
    #[error("failed to spawn binder {}: {source}", command.display())]
    Spawn {
        /// Command that failed to spawn.
        command: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The binder base URL is invalid.
    #[error("invalid binder url {url}: {detail}")]
    InvalidUrl {
        /// Offending URL text.
        url: String,
        /// Parse failure detail.
        detail: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    /// The binder did not expose every registered binding in time.
    #[error("binder readiness timeout after {attempts} attempts: {last_error}")]
    Readiness {
        /// Number of probe attempts made.
        attempts: u32,
        /// Last probe failure observed.
        last_error: String,
    },
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Handle for a running binder host and its loaded bindings.
///
/// # Invariants
/// - At most one session is active per run; the harness exclusively owns its
///   startup and shutdown.
/// - The route table is resolved once at startup; calls are a lookup plus an
///   HTTP request.
pub struct BinderSession {
    /// Binder base URL.
    base_url: Url,
    /// Capability table: registered binding to its api base route.
    pub(crate) routes: BTreeMap<BindingName, Url>,
    /// Blocking HTTP client with the per-call timeout applied.
    pub(crate) http: reqwest::blocking::Client,
    /// Per-call timeout, for error reporting.
    pub(crate) call_timeout: Duration,
    /// Spawned binder process, when the session owns one.
    child: Option<Child>,
    /// Recorded call transcript.
    pub(crate) transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl BinderSession {
    /// Returns the binder base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the registered binding names in route-table order.
    #[must_use]
    pub fn bindings(&self) -> Vec<BindingName> {
        self.routes.keys().cloned().collect()
    }

    /// Gracefully shuts down an owned binder process.
    ///
    /// Idempotent: stopping an already-stopped session (or one that never
    /// owned a process) is a no-op.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for BinderSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// SECTION: Startup
// ============================================================================

/// Returns a free loopback port for a spawned binder.
fn allocate_port() -> Result<u16, StartupError> {
    let listener =
        TcpListener::bind("127.0.0.1:0").map_err(StartupError::PortAllocation)?;
    let addr = listener.local_addr().map_err(StartupError::PortAllocation)?;
    drop(listener);
    Ok(addr.port())
}

/// Parses a base URL, ensuring a trailing slash so route joins stay rooted.
fn parse_base_url(raw: &str) -> Result<Url, StartupError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|err| StartupError::InvalidUrl {
        url: raw.to_string(),
        detail: err.to_string(),
    })
}

/// Builds the per-binding route table from the base URL.
fn build_routes(
    base: &Url,
    config: &HarnessConfig,
) -> Result<BTreeMap<BindingName, Url>, StartupError> {
    let mut routes = BTreeMap::new();
    for registration in config.registrations() {
        let route = base.join(&format!("api/{}/", registration.name)).map_err(|err| {
            StartupError::InvalidUrl {
                url: base.to_string(),
                detail: err.to_string(),
            }
        })?;
        routes.insert(registration.name, route);
    }
    Ok(routes)
}

/// Launches the configured binder command and returns the child process.
fn spawn_binder_process(config: &HarnessConfig, port: u16) -> Result<Child, StartupError> {
    let command_path = config.binder.command.clone().ok_or_else(|| StartupError::Spawn {
        command: PathBuf::new(),
        source: io::Error::new(io::ErrorKind::NotFound, "binder command not configured"),
    })?;
    let stderr = match &config.binder.stderr_log {
        Some(path) => {
            let file = File::create(path).map_err(|source| StartupError::StderrLog {
                path: path.clone(),
                source,
            })?;
            Stdio::from(file)
        }
        None => Stdio::null(),
    };
    let mut command = Command::new(&command_path);
    command
        .arg("--port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(stderr);
    for registration in config.registrations() {
        command
            .arg("--binding")
            .arg(format!("{}:{}", registration.name, registration.module_path.display()));
    }
    command.spawn().map_err(|source| StartupError::Spawn {
        command: command_path,
        source,
    })
}

/// Polls the binder api listing until every registered binding is exposed.
fn wait_for_binder_ready(
    http: &reqwest::blocking::Client,
    base: &Url,
    config: &HarnessConfig,
) -> Result<(), StartupError> {
    let deadline = Instant::now() + config.ready_timeout();
    let expected = config.registrations();
    let mut attempts = 0u32;
    let mut last_error;
    loop {
        attempts = attempts.saturating_add(1);
        match fetch_api_listing(http, base) {
            Ok(apis) => {
                let missing = expected
                    .iter()
                    .find(|registration| !apis.iter().any(|api| api == registration.name.as_str()));
                match missing {
                    None => return Ok(()),
                    Some(registration) => {
                        last_error = format!("binding {} not yet exposed", registration.name);
                    }
                }
            }
            Err(err) => last_error = err,
        }
        if Instant::now() >= deadline {
            return Err(StartupError::Readiness {
                attempts,
                last_error,
            });
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

/// Starts the binder host described by the configuration.
///
/// The configuration must already be validated; spawn mode launches the
/// binder command, attach mode probes the configured URL. Either way the
/// session is returned only once every registered binding is exposed.
///
/// # Errors
/// Returns [`StartupError`] when spawning, URL parsing, client construction,
/// or the readiness probe fails. A spawned child is killed before a
/// readiness failure is returned.
pub fn start_binder(config: &HarnessConfig) -> Result<BinderSession, StartupError> {
    let (base_url, child) = match config.binder.mode {
        BinderMode::Spawn => {
            let port = allocate_port()?;
            let child = spawn_binder_process(config, port)?;
            let base = parse_base_url(&format!("http://127.0.0.1:{port}"))?;
            (base, Some(child))
        }
        BinderMode::Attach => {
            let raw = config.binder.url.clone().unwrap_or_default();
            (parse_base_url(&raw)?, None)
        }
    };

    let http = reqwest::blocking::Client::builder()
        .timeout(config.call_timeout())
        .build()
        .map_err(|err| StartupError::HttpClient(err.to_string()))?;

    let routes = build_routes(&base_url, config)?;
    let mut session = BinderSession {
        base_url,
        routes,
        http,
        call_timeout: config.call_timeout(),
        child,
        transcript: Arc::new(Mutex::new(Vec::new())),
    };

    if let Err(err) = wait_for_binder_ready(&session.http, &session.base_url, config) {
        session.stop();
        return Err(err);
    }
    Ok(session)
}
