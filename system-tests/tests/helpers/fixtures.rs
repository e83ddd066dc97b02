// system-tests/tests/helpers/fixtures.rs
// ============================================================================
// Module: Harness Fixtures
// Description: Configuration builders for system-test scenarios.
// Purpose: Provide deterministic, reusable harness configurations.
// Dependencies: afb-conform-harness, system-tests, tempfile
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use afb_conform_harness::BinderConfig;
use afb_conform_harness::BinderMode;
use afb_conform_harness::HarnessConfig;

use super::timeouts::resolve_timeout;

/// Default per-call timeout requested by the suites.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
/// Default readiness timeout requested by the suites.
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Converts a duration to whole milliseconds for the config model.
fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builds an attach-mode configuration registering `wifiAp` at the stub URL.
pub fn attach_config(base_url: &str) -> HarnessConfig {
    attach_config_with_call_timeout(base_url, resolve_timeout(DEFAULT_CALL_TIMEOUT))
}

/// Builds an attach-mode configuration with an explicit per-call timeout.
pub fn attach_config_with_call_timeout(base_url: &str, call_timeout: Duration) -> HarnessConfig {
    let mut bindings = BTreeMap::new();
    bindings.insert("wifiAp".to_string(), PathBuf::from("wifiap-binding.so"));
    HarnessConfig {
        binder: BinderConfig {
            mode: BinderMode::Attach,
            command: None,
            url: Some(base_url.to_string()),
            call_timeout_ms: as_millis(call_timeout),
            ready_timeout_ms: as_millis(resolve_timeout(DEFAULT_READY_TIMEOUT)),
            stderr_log: None,
        },
        bindings,
    }
}

/// Builds a spawn-mode configuration launching the stub-binder binary.
///
/// Creates a scratch module file so spawn-mode validation passes.
pub fn spawn_config(
    binder_command: &Path,
    scratch: &Path,
) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    let module = scratch.join("wifiap-binding.so");
    fs::write(&module, b"\x7fELF")?;
    let mut bindings = BTreeMap::new();
    bindings.insert("wifiAp".to_string(), module);
    let config = HarnessConfig {
        binder: BinderConfig {
            mode: BinderMode::Spawn,
            command: Some(binder_command.to_path_buf()),
            url: None,
            call_timeout_ms: as_millis(resolve_timeout(DEFAULT_CALL_TIMEOUT)),
            ready_timeout_ms: as_millis(resolve_timeout(DEFAULT_READY_TIMEOUT)),
            stderr_log: Some(scratch.join("binder-stderr.log")),
        },
        bindings,
    };
    config.validate()?;
    Ok(config)
}
