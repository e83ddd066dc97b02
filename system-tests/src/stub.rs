// system-tests/src/stub.rs
// ============================================================================
// Module: Stub Binder
// Description: Minimal binder host emulating the wifiAp binding.
// Purpose: Exercise harness lifecycle and call flows without real hardware.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! The stub speaks the binder wire dialect: `GET /api` lists the loaded
//! bindings and `POST /api/{binding}/{verb}` replies with an afb-reply
//! envelope. The wifiAp emulation enforces the original binding's argument
//! contracts (SSID length, passphrase length, channel range, bare-string
//! security protocol) so conformance suites can exercise both success and
//! binding-reported failure paths. An optional slow verb delays its reply to
//! drive timeout scenarios.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::sleep;

// ============================================================================
// SECTION: Status Codes
// ============================================================================

/// Success status.
pub const STATUS_OK: i32 = 0;
/// Unknown binding (api) status.
pub const STATUS_UNKNOWN_API: i32 = -1;
/// Unknown verb status.
pub const STATUS_UNKNOWN_VERB: i32 = -2;
/// Invalid state status (e.g. starting an already-started access point).
pub const STATUS_INVALID_STATE: i32 = -3;
/// Bad argument status.
pub const STATUS_BAD_ARGUMENT: i32 = -4;

// ============================================================================
// SECTION: Options & State
// ============================================================================

/// A verb that delays its reply, for timeout scenarios.
#[derive(Debug, Clone)]
pub struct SlowVerb {
    /// Verb name to slow down.
    pub verb: String,
    /// Delay applied before replying.
    pub delay: Duration,
}

/// Stub binder options.
#[derive(Debug, Clone, Default)]
pub struct StubOptions {
    /// Binding names the stub exposes.
    pub bindings: Vec<String>,
    /// Optional verb that delays its reply.
    pub slow_verb: Option<SlowVerb>,
}

impl StubOptions {
    /// Returns options exposing a single `wifiAp` binding.
    #[must_use]
    pub fn wifiap() -> Self {
        Self {
            bindings: vec!["wifiAp".to_string()],
            slow_verb: None,
        }
    }
}

/// Emulated wifiAp state shared across calls.
#[derive(Debug, Clone)]
struct WifiApState {
    /// Configured SSID; empty until set.
    ssid: String,
    /// Configured passphrase.
    passphrase: String,
    /// Configured channel.
    channel: i64,
    /// Configured security protocol.
    security: String,
    /// Whether the access point announces its presence.
    discoverable: bool,
    /// Configured IEEE standard mask.
    ieee_mask: i64,
    /// Configured country code.
    country: String,
    /// Maximum simultaneous clients.
    max_clients: i64,
    /// Whether the access point is running.
    started: bool,
    /// Connected client count.
    clients: i64,
}

impl Default for WifiApState {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            passphrase: String::new(),
            channel: 6,
            security: "WPA2".to_string(),
            discoverable: true,
            ieee_mask: 0,
            country: "FR".to_string(),
            max_clients: 10,
            started: false,
            clients: 0,
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
struct StubState {
    /// Exposed binding names.
    bindings: Arc<Vec<String>>,
    /// Emulated wifiAp state.
    wifi: Arc<Mutex<WifiApState>>,
    /// Optional slow verb.
    slow_verb: Option<SlowVerb>,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the stub binder router.
fn router(options: &StubOptions) -> Router {
    let state = StubState {
        bindings: Arc::new(options.bindings.clone()),
        wifi: Arc::new(Mutex::new(WifiApState::default())),
        slow_verb: options.slow_verb.clone(),
    };
    Router::new()
        .route("/api", get(handle_listing))
        .route("/api/{binding}/{verb}", post(handle_verb))
        .with_state(state)
}

/// Builds an afb-reply envelope.
fn reply(status: i32, info: Option<&str>, payload: Option<Value>) -> Value {
    json!({
        "jtype": "afb-reply",
        "request": {
            "status": status,
            "info": info,
        },
        "response": payload,
    })
}

/// Serves the binder api listing.
#[allow(clippy::unused_async, reason = "Axum handlers require an async signature.")]
async fn handle_listing(State(state): State<StubState>) -> Json<Value> {
    Json(json!({
        "jtype": "afb-apis",
        "apis": state.bindings.as_ref(),
    }))
}

/// Dispatches a verb invocation to the wifiAp emulation.
async fn handle_verb(
    State(state): State<StubState>,
    Path((binding, verb)): Path<(String, String)>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(slow) = &state.slow_verb
        && slow.verb == verb
    {
        sleep(slow.delay).await;
    }
    if !state.bindings.iter().any(|name| name == &binding) {
        return (
            StatusCode::NOT_FOUND,
            Json(reply(STATUS_UNKNOWN_API, Some("unknown-api"), None)),
        );
    }
    let Ok(mut wifi) = state.wifi.lock() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(reply(STATUS_INVALID_STATE, Some("state lock poisoned"), None)),
        );
    };
    let (status, info, payload) = dispatch_wifiap(&mut wifi, &verb, body.as_ref());
    let http_status = if status == STATUS_UNKNOWN_VERB {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (http_status, Json(reply(status, info.as_deref(), payload)))
}

// ============================================================================
// SECTION: WifiAp Emulation
// ============================================================================

/// Executes one wifiAp verb against the emulated state.
#[allow(clippy::too_many_lines, reason = "Single verb dispatcher keeps stub logic easy to audit.")]
fn dispatch_wifiap(
    wifi: &mut WifiApState,
    verb: &str,
    body: &[u8],
) -> (i32, Option<String>, Option<Value>) {
    match verb {
        "start" => {
            if wifi.ssid.is_empty() {
                return fail("No valid SSID provided");
            }
            if wifi.started {
                return (
                    STATUS_INVALID_STATE,
                    Some("Access point already started".to_string()),
                    None,
                );
            }
            wifi.started = true;
            ok("Access point started successfully")
        }
        "stop" => {
            wifi.started = false;
            wifi.clients = 0;
            ok("Access Point was stopped successfully")
        }
        "restart" => {
            if wifi.ssid.is_empty() {
                return fail("No valid SSID provided");
            }
            wifi.started = true;
            ok("Access point restarted successfully")
        }
        "setSsid" => match body_string(body) {
            Some(ssid) if !ssid.is_empty() && ssid.len() <= 32 => {
                wifi.ssid = ssid;
                ok("SSID set successfully")
            }
            _ => fail("No valid SSID provided"),
        },
        "setPassPhrase" => match body_string(body) {
            Some(passphrase) if (8..=63).contains(&passphrase.len()) => {
                wifi.passphrase = passphrase;
                ok("Passphrase set successfully")
            }
            _ => fail("Invalid passphrase length"),
        },
        "setPreSharedKey" => match body_string(body) {
            Some(key) if !key.is_empty() && key.len() <= 64 => {
                wifi.passphrase = key;
                ok("Pre-shared key set successfully")
            }
            _ => fail("Invalid pre-shared key"),
        },
        "setChannel" => match body_i64(body) {
            Some(channel) if (1..=14).contains(&channel) => {
                wifi.channel = channel;
                ok("Channel set successfully")
            }
            _ => fail("No valid channel number provided"),
        },
        "setDiscoverable" => match body_bool(body) {
            Some(flag) => {
                wifi.discoverable = flag;
                ok("Discoverability set successfully")
            }
            None => fail("Invalid discoverable flag"),
        },
        "setIeeeStandard" => match body_i64(body) {
            Some(mask) if mask >= 0 => {
                wifi.ieee_mask = mask;
                ok("IEEE standard set successfully")
            }
            _ => fail("Invalid IEEE standard mask"),
        },
        "getIeeeStandard" => {
            (STATUS_OK, None, Some(json!({ "stdMask": wifi.ieee_mask })))
        }
        "setSecurityProtocol" => set_security_protocol(wifi, body),
        "setCountryCode" => match body_string(body) {
            Some(code) if code.len() == 2 && code.chars().all(|ch| ch.is_ascii_alphabetic()) => {
                wifi.country = code;
                ok("Country code set successfully")
            }
            _ => fail("Invalid country code"),
        },
        "SetMaxNumberClients" => match body_i64(body) {
            Some(count) if (1..=10).contains(&count) => {
                wifi.max_clients = count;
                ok("Max number of clients set successfully")
            }
            _ => fail("Invalid max number of clients"),
        },
        "setIpRange" => match body_object(body) {
            Some(range) if ip_range_is_complete(&range) => {
                ok("IP range set successfully")
            }
            _ => fail("Invalid IP range"),
        },
        "getAPclientsNumber" => (STATUS_OK, None, Some(json!(wifi.clients))),
        "getWifiApStatus" => (
            STATUS_OK,
            None,
            Some(json!({
                "ssid": wifi.ssid,
                "channel": wifi.channel,
                "security": wifi.security,
                "discoverable": wifi.discoverable,
                "country": wifi.country,
                "max_clients": wifi.max_clients,
                "passphrase_set": !wifi.passphrase.is_empty(),
                "started": wifi.started,
                "clients": wifi.clients,
            })),
        ),
        _ => (STATUS_UNKNOWN_VERB, Some("unknown-verb".to_string()), None),
    }
}

/// Applies the bare-string security protocol contract.
///
/// The original binding reads the raw parameter text, so a JSON-quoted string
/// (the double-encoding defect) is rejected with a dedicated message.
fn set_security_protocol(wifi: &mut WifiApState, body: &[u8]) -> (i32, Option<String>, Option<Value>) {
    let Ok(text) = std::str::from_utf8(body) else {
        return fail("Invalid security protocol");
    };
    let trimmed = text.trim();
    if trimmed == "WPA2" || trimmed == "none" {
        wifi.security = trimmed.to_string();
        return ok("Security protocol set successfully");
    }
    if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(trimmed)
        && (inner == "WPA2" || inner == "none")
    {
        return fail("security protocol must be a bare string");
    }
    fail("Invalid security protocol")
}

/// Success reply with an info string.
fn ok(info: &str) -> (i32, Option<String>, Option<Value>) {
    (STATUS_OK, Some(info.to_string()), None)
}

/// Bad-argument reply with an info string.
fn fail(info: &str) -> (i32, Option<String>, Option<Value>) {
    (STATUS_BAD_ARGUMENT, Some(info.to_string()), None)
}

/// Decodes a JSON string body.
fn body_string(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::String(text)) => Some(text),
        _ => None,
    }
}

/// Decodes a JSON integer body.
fn body_i64(body: &[u8]) -> Option<i64> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Number(number)) => number.as_i64(),
        _ => None,
    }
}

/// Decodes a JSON boolean body.
fn body_bool(body: &[u8]) -> Option<bool> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Bool(flag)) => Some(flag),
        _ => None,
    }
}

/// Decodes a JSON object body.
fn body_object(body: &[u8]) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Returns true when every IP range field is a non-empty string.
fn ip_range_is_complete(range: &serde_json::Map<String, Value>) -> bool {
    ["ip_ap", "ip_start", "ip_stop", "ip_netmask"].iter().all(|key| {
        range.get(*key).and_then(Value::as_str).is_some_and(|text| !text.is_empty())
    })
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Handle for a spawned stub binder.
pub struct StubHandle {
    /// Base URL of the stub.
    base_url: String,
    /// Graceful shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread handle.
    join: Option<thread::JoinHandle<()>>,
}

impl StubHandle {
    /// Returns the stub base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for StubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a stub binder on a free loopback port.
///
/// # Errors
/// Returns a message when binding the listener or starting the runtime fails.
pub fn spawn_stub(options: &StubOptions) -> Result<StubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("stub listener nonblocking failed: {err}"))?;
    let addr = listener.local_addr().map_err(|err| format!("stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let app = router(options);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(StubHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}

/// Serves the stub binder on the given port until the process is killed.
///
/// Used by the `stub-binder` binary that spawn-mode lifecycle tests launch.
///
/// # Errors
/// Returns a message when binding the listener or starting the runtime fails.
pub fn serve_blocking(options: &StubOptions, port: u16) -> Result<(), String> {
    let listener = StdTcpListener::bind(("127.0.0.1", port))
        .map_err(|err| format!("stub bind failed on port {port}: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("stub listener nonblocking failed: {err}"))?;
    let app = router(options);
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("stub runtime failed: {err}"))?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::from_std(listener)
            .map_err(|err| format!("stub listener conversion failed: {err}"))?;
        axum::serve(listener, app).await.map_err(|err| format!("stub serve failed: {err}"))
    })
}
