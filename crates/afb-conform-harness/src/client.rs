// crates/afb-conform-harness/src/client.rs
// ============================================================================
// Module: Synchronous Call Client
// Description: Blocking verb invocation against a loaded binding.
// Purpose: Normalize binder replies into call results with transcripts.
// Dependencies: afb-conform-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`BinderSession::call_sync`] performs one blocking verb invocation:
//! capability-table lookup, HTTP POST of the natively-marshaled argument,
//! and decoding of the binder's afb-reply envelope into a
//! [`CallResult`]. The envelope is decoded regardless of HTTP status so that
//! binder-reported failures (unknown verb, invalid argument) surface as a
//! nonzero status on a successful round trip, never as a harness error.
//! A timeout maps to [`CallError::Timeout`] and leaves the session usable.
//! Every round trip is appended to an in-memory transcript.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use afb_conform_core::BindingName;
use afb_conform_core::CallArgument;
use afb_conform_core::CallResult;
use afb_conform_core::MarshalError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::binder::BinderSession;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Expected `jtype` marker of a verb reply envelope.
const REPLY_JTYPE: &str = "afb-reply";

/// Status block of a reply envelope.
#[derive(Debug, Deserialize)]
struct ReplyStatus {
    /// Binding-reported status code.
    status: i32,
    /// Optional info string.
    #[serde(default)]
    info: Option<String>,
}

/// Verb reply envelope as produced by the binder host.
#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    /// Envelope type marker; must be `afb-reply`.
    jtype: String,
    /// Request status block.
    request: ReplyStatus,
    /// Optional reply payload.
    #[serde(default)]
    response: Option<Value>,
}

/// Binder api listing returned by `GET {base}/api`.
#[derive(Debug, Deserialize)]
struct ApiListing {
    /// Envelope type marker; must be `afb-apis`.
    jtype: String,
    /// Names of the exposed bindings.
    apis: Vec<String>,
}

/// Expected `jtype` marker of an api listing.
const LISTING_JTYPE: &str = "afb-apis";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Per-call failures; reported against the specific case, not fatal to a run.
#[derive(Debug, Error)]
pub enum CallError {
    /// The binding name is not registered with the session.
    #[error("binding {0} is not registered")]
    UnknownBinding(String),
    /// No reply arrived within the configured timeout.
    #[error("call {verb} timed out after {timeout_ms} ms")]
    Timeout {
        /// Invoked verb.
        verb: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
    /// The HTTP round trip failed below the reply layer.
    #[error("call {verb} transport failure: {detail}")]
    Transport {
        /// Invoked verb.
        verb: String,
        /// Transport failure detail.
        detail: String,
    },
    /// The reply body was not a valid afb-reply envelope.
    #[error("call {verb} returned an invalid reply: {detail}")]
    InvalidReply {
        /// Invoked verb.
        verb: String,
        /// Decoding failure detail.
        detail: String,
    },
    /// The argument could not be encoded for the wire.
    #[error("call {verb} argument encoding failed: {source}")]
    Marshal {
        /// Invoked verb.
        verb: String,
        /// Underlying marshal error.
        source: MarshalError,
    },
}

// ============================================================================
// SECTION: Transcript
// ============================================================================

/// One recorded call round trip.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    /// 1-based sequence number within the session.
    pub sequence: u64,
    /// Invoked binding.
    pub binding: String,
    /// Invoked verb.
    pub verb: String,
    /// Marshaled argument, when one was passed.
    pub argument: Option<Value>,
    /// Binding-reported status, when a reply arrived.
    pub status: Option<i32>,
    /// Call error rendering, when the call failed.
    pub error: Option<String>,
}

/// Appends a transcript entry, deriving the next sequence number.
fn record_transcript(
    transcript: &Arc<Mutex<Vec<TranscriptEntry>>>,
    binding: &BindingName,
    verb: &str,
    argument: Option<&CallArgument>,
    status: Option<i32>,
    error: Option<String>,
) {
    let Ok(mut guard) = transcript.lock() else {
        return;
    };
    let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
    guard.push(TranscriptEntry {
        sequence,
        binding: binding.to_string(),
        verb: verb.to_string(),
        argument: argument.map(CallArgument::marshal),
        status,
        error,
    });
}

// ============================================================================
// SECTION: Call Primitive
// ============================================================================

impl BinderSession {
    /// Performs one blocking verb invocation.
    ///
    /// Blocks the calling thread until the binder replies or the configured
    /// per-call timeout elapses. A nonzero status in the returned
    /// [`CallResult`] is a successful round trip carrying a binding-reported
    /// failure, not an error of this call.
    ///
    /// # Errors
    /// Returns [`CallError`] on unknown binding, timeout, transport failure,
    /// invalid reply envelope, or argument encoding failure. The session
    /// stays usable after any of these.
    pub fn call_sync(
        &self,
        binding: &BindingName,
        verb: &str,
        argument: Option<&CallArgument>,
    ) -> Result<CallResult, CallError> {
        let outcome = self.dispatch(binding, verb, argument);
        match &outcome {
            Ok(result) => {
                record_transcript(
                    &self.transcript,
                    binding,
                    verb,
                    argument,
                    Some(result.status),
                    None,
                );
            }
            Err(err) => {
                record_transcript(
                    &self.transcript,
                    binding,
                    verb,
                    argument,
                    None,
                    Some(err.to_string()),
                );
            }
        }
        outcome
    }

    /// Invokes a verb that takes no argument.
    ///
    /// # Errors
    /// Same failure modes as [`BinderSession::call_sync`].
    pub fn invoke(&self, binding: &BindingName, verb: &str) -> Result<CallResult, CallError> {
        self.call_sync(binding, verb, None)
    }

    /// Invokes a verb with an argument.
    ///
    /// # Errors
    /// Same failure modes as [`BinderSession::call_sync`].
    pub fn invoke_with(
        &self,
        binding: &BindingName,
        verb: &str,
        argument: &CallArgument,
    ) -> Result<CallResult, CallError> {
        self.call_sync(binding, verb, Some(argument))
    }

    /// Returns a snapshot of the recorded transcript.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Builds the request, sends it, and decodes the reply envelope.
    fn dispatch(
        &self,
        binding: &BindingName,
        verb: &str,
        argument: Option<&CallArgument>,
    ) -> Result<CallResult, CallError> {
        let route = self
            .routes
            .get(binding)
            .ok_or_else(|| CallError::UnknownBinding(binding.to_string()))?;
        let verb_url = route.join(verb).map_err(|err| CallError::Transport {
            verb: verb.to_string(),
            detail: format!("invalid verb route: {err}"),
        })?;

        let mut request = self.http.post(verb_url);
        if let Some(argument) = argument {
            let body = argument.to_wire_bytes().map_err(|source| CallError::Marshal {
                verb: verb.to_string(),
                source,
            })?;
            request = request.header("content-type", argument.content_type()).body(body);
        }

        let response = request.send().map_err(|err| classify_send_error(verb, &err, self.call_timeout))?;
        let bytes = response.bytes().map_err(|err| CallError::Transport {
            verb: verb.to_string(),
            detail: err.to_string(),
        })?;
        decode_reply(verb, bytes.as_ref())
    }
}

/// Maps a reqwest send failure to a timeout or transport error.
fn classify_send_error(verb: &str, err: &reqwest::Error, timeout: Duration) -> CallError {
    if err.is_timeout() {
        CallError::Timeout {
            verb: verb.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        CallError::Transport {
            verb: verb.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Decodes a reply body into a call result.
fn decode_reply(verb: &str, bytes: &[u8]) -> Result<CallResult, CallError> {
    let envelope: ReplyEnvelope =
        serde_json::from_slice(bytes).map_err(|err| CallError::InvalidReply {
            verb: verb.to_string(),
            detail: err.to_string(),
        })?;
    if envelope.jtype != REPLY_JTYPE {
        return Err(CallError::InvalidReply {
            verb: verb.to_string(),
            detail: format!("unexpected jtype {}", envelope.jtype),
        });
    }
    Ok(CallResult {
        status: envelope.request.status,
        info: envelope.request.info,
        payload: envelope.response,
    })
}

// ============================================================================
// SECTION: Readiness Support
// ============================================================================

/// Fetches the binder api listing used by the readiness probe.
pub(crate) fn fetch_api_listing(
    http: &reqwest::blocking::Client,
    base: &Url,
) -> Result<Vec<String>, String> {
    let url = base.join("api").map_err(|err| format!("invalid api route: {err}"))?;
    let response = http.get(url).send().map_err(|err| format!("api listing failed: {err}"))?;
    let listing: ApiListing =
        response.json().map_err(|err| format!("invalid api listing: {err}"))?;
    if listing.jtype != LISTING_JTYPE {
        return Err(format!("unexpected listing jtype {}", listing.jtype));
    }
    Ok(listing.apis)
}
