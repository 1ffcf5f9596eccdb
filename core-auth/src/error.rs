//! Error types for the OAuth client.
//!
//! The error kinds form a closed set deliberately kept small enough to map
//! 1:1 onto an ABI-friendly error code at an outer boundary (see
//! [`AuthError::code`]). `AUTHORIZATION_PENDING` and `SLOW_DOWN` are internal
//! to the device poll loop and are never returned to a caller.

use std::cell::RefCell;

use thiserror::Error;

/// OAuth client error types.
///
/// Every variant carries a human-readable message. Sensitive material
/// (tokens, `code_verifier`, client secrets) must never be embedded in a
/// message.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A caller-supplied parameter was missing, empty, or malformed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The token store backend failed to read, write, or delete a record.
    #[error("storage error: {0}")]
    Storage(String),

    /// The HTTP transport reported a non-transport-level failure (e.g. an
    /// unexpected status code that no other variant already accounts for).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The authorization server, or the user, denied the request
    /// (`error=access_denied`).
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// An access token has expired and no refresh was available or attempted.
    #[error("token expired")]
    TokenExpired,

    /// A refresh was requested but no refresh token is available.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The callback `state` did not match the session `state`.
    #[error("state mismatch")]
    InvalidState,

    /// The device code expired before the user completed authorization.
    #[error("device code expired")]
    DeviceCodeExpired,

    /// A JSON payload could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(String),

    /// A local I/O operation failed (e.g. binding the callback listener).
    #[error("I/O error: {0}")]
    Io(String),

    /// The authorization server returned an `error` not otherwise mapped.
    #[error("server error: {0}")]
    Server(String),

    /// The loopback callback server failed (bad request, wrong method,
    /// wrong path) before it could deliver a result.
    #[error("callback server error: {0}")]
    CallbackServer(String),

    /// A required capability or configuration value was missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The token store reported lock contention it could not resolve
    /// internally.
    #[error("lock contention: {0}")]
    Lock(String),

    /// A requested operation or method is not supported by this client or
    /// script.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The transport could not reach the remote host at all.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A blocking operation exceeded its deadline or was cancelled.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Internal to the device poll loop: the user has not yet completed
    /// authorization. Never surfaced to a caller.
    #[error("authorization pending")]
    AuthorizationPending,

    /// Internal to the device poll loop: the server asked for a longer
    /// polling interval. Never surfaced to a caller.
    #[error("slow down")]
    SlowDown,

    /// Anything that doesn't fit an existing kind.
    #[error("unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// The closed-set string code for this error kind, stable across
    /// releases and suitable for exposing at an ABI or wire boundary.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidParameter(_) => "INVALID_PARAMETER",
            AuthError::Storage(_) => "STORAGE",
            AuthError::Http(_) => "HTTP",
            AuthError::AuthorizationDenied(_) => "AUTHORIZATION_DENIED",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::NoRefreshToken => "NO_REFRESH_TOKEN",
            AuthError::InvalidState => "INVALID_STATE",
            AuthError::DeviceCodeExpired => "DEVICE_CODE_EXPIRED",
            AuthError::Json(_) => "JSON",
            AuthError::Io(_) => "IO",
            AuthError::Server(_) => "SERVER",
            AuthError::CallbackServer(_) => "CALLBACK_SERVER",
            AuthError::Configuration(_) => "CONFIGURATION",
            AuthError::Lock(_) => "LOCK",
            AuthError::Unsupported(_) => "UNSUPPORTED",
            AuthError::ConnectionFailed(_) => "CONNECTION_FAILED",
            AuthError::Timeout(_) => "TIMEOUT",
            AuthError::AuthorizationPending => "AUTHORIZATION_PENDING",
            AuthError::SlowDown => "SLOW_DOWN",
            AuthError::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Json(e.to_string())
    }
}

impl From<bridge_traits::error::BridgeError> for AuthError {
    fn from(e: bridge_traits::error::BridgeError) -> Self {
        match e {
            bridge_traits::error::BridgeError::NotAvailable(msg) => {
                AuthError::Configuration(msg)
            }
            bridge_traits::error::BridgeError::OperationFailed(msg) => AuthError::Http(msg),
            bridge_traits::error::BridgeError::DatabaseError(msg) => AuthError::Storage(msg),
            bridge_traits::error::BridgeError::Io(e) => AuthError::Io(e.to_string()),
        }
    }
}

impl From<core_runtime::error::Error> for AuthError {
    fn from(e: core_runtime::error::Error) -> Self {
        match e {
            core_runtime::error::Error::Config(msg) => AuthError::Configuration(msg),
            core_runtime::error::Error::CapabilityMissing { capability, message } => {
                AuthError::Configuration(format!("{capability}: {message}"))
            }
            core_runtime::error::Error::Internal(msg) => AuthError::Unknown(msg),
        }
    }
}

/// One entry of the per-thread last-error channel: the most recent
/// failure observed on this thread, intended for an ABI edge where the
/// primary return channel is a pointer-or-null and an explicit error
/// object can't travel with it.
#[derive(Debug, Clone)]
pub struct LastError {
    pub code: &'static str,
    pub message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

/// Records `err` as the last error observed on this thread. Call sites at
/// an ABI boundary should invoke this just before returning a null/sentinel
/// value to the caller.
pub fn set_last_error(err: &AuthError) {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(LastError {
            code: err.code(),
            message: err.to_string(),
        });
    });
}

/// Returns a clone of the last error recorded on this thread, if any.
pub fn last_error() -> Option<LastError> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Clears the per-thread last-error slot.
pub fn clear_last_error() {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = None;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::InvalidState.code(), "INVALID_STATE");
        assert_eq!(AuthError::DeviceCodeExpired.code(), "DEVICE_CODE_EXPIRED");
        assert_eq!(AuthError::AuthorizationPending.code(), "AUTHORIZATION_PENDING");
        assert_eq!(AuthError::SlowDown.code(), "SLOW_DOWN");
    }

    #[test]
    fn last_error_slot_round_trips_and_clears() {
        clear_last_error();
        assert!(last_error().is_none());

        set_last_error(&AuthError::TokenExpired);
        let recorded = last_error().expect("an error was just set");
        assert_eq!(recorded.code, "TOKEN_EXPIRED");
        assert_eq!(recorded.message, "token expired");

        clear_last_error();
        assert!(last_error().is_none());
    }

    #[test]
    fn json_error_conversion_maps_to_json_kind() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: AuthError = parse_err.into();
        assert_eq!(err.code(), "JSON");
    }

    #[test]
    fn bridge_error_conversion_maps_kinds() {
        let err: AuthError = bridge_traits::error::BridgeError::NotAvailable("x".into()).into();
        assert_eq!(err.code(), "CONFIGURATION");

        let err: AuthError = bridge_traits::error::BridgeError::DatabaseError("x".into()).into();
        assert_eq!(err.code(), "STORAGE");
    }
}
