//! Error types for Graph API operations.
//!
//! Every failure that crosses the transport boundary is normalized into a
//! [`GraphError`] carrying a human-readable message, a remedial action, and a
//! recoverability flag, with proper classification for retry logic.

use serde::Deserialize;
use thiserror::Error;

/// Structured error body returned by the Graph API.
///
/// The platform wraps failures in `{"error": {...}}` with a numeric code, a
/// type string, and an optional trace id for support escalations.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorBody {
    /// Raw error message from the platform.
    pub message: String,

    /// Error category string (e.g. "OAuthException").
    #[serde(rename = "type", default)]
    pub error_type: String,

    /// Numeric error code, the key into the normalization policy table.
    pub code: i64,

    /// Optional finer-grained subcode.
    #[serde(default)]
    pub error_subcode: Option<i64>,

    /// Trace id to quote when contacting platform support.
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// Wire envelope wrapping [`UpstreamErrorBody`].
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorEnvelope {
    pub error: UpstreamErrorBody,
}

/// Normalized error produced by every SDK operation.
///
/// Callers never see a raw transport failure: upstream error bodies are run
/// through a fixed policy table, network failures become [`Network`]
/// (always recoverable), and malformed caller input surfaces as
/// [`Validation`] before any request is issued.
///
/// [`Network`]: GraphError::Network
/// [`Validation`]: GraphError::Validation
#[derive(Debug, Error)]
pub enum GraphError {
    /// Structured error response from the Graph API, classified via the
    /// policy table.
    #[error("{message}")]
    Upstream {
        message: String,
        code: i64,
        error_type: String,
        status: u16,
        action: String,
        recoverable: bool,
        trace_id: Option<String>,
    },

    /// HTTP error response without a structured Graph error body.
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// No response was received (timeout, connection reset, DNS failure).
    #[error("Network error: {message}")]
    Network { message: String },

    /// Failed to parse a JSON response body.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed caller input, raised before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Token storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No token is stored for the requested user.
    #[error("No stored token for user {user_id}")]
    TokenNotFound { user_id: String },

    /// Client-side configuration problem (bad header value, client build
    /// failure).
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl GraphError {
    /// Build a normalized error from a structured upstream error body.
    ///
    /// Known numeric codes map to a curated message, remedial action, and
    /// recoverability flag; unknown codes pass the original message through
    /// verbatim with a generic action and `recoverable = false`. This mapping
    /// is pure and total — it never fails, whatever the input.
    pub fn from_upstream(status: u16, body: UpstreamErrorBody) -> Self {
        let (message, action, recoverable) = normalize_code(body.code, &body.message);
        Self::Upstream {
            message,
            code: body.code,
            error_type: body.error_type,
            status,
            action,
            recoverable,
            trace_id: body.fbtrace_id,
        }
    }

    /// Build a normalized error from a request that produced no response.
    pub(crate) fn from_request(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else {
            error.to_string()
        };
        Self::Network { message }
    }

    /// Check if this error represents a transient condition that may succeed
    /// if retried.
    ///
    /// Transient conditions:
    /// - network failures (timeout, reset — no response received)
    /// - rate limiting (HTTP 429)
    /// - server errors (any 5xx)
    ///
    /// Everything else — client errors, validation failures, storage and
    /// configuration problems — is not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { status, .. } | Self::Http { status, .. } => {
                *status >= 500 || *status == 429
            }
            Self::Network { .. } => true,
            Self::Json(_) => false,
            Self::Validation(_) => false,
            Self::Storage(_) => false,
            Self::TokenNotFound { .. } => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Whether the caller may safely retry or re-authenticate rather than
    /// treat the failure as permanent.
    ///
    /// Distinct from [`is_transient`]: an expired token (code 190, HTTP 401)
    /// is not transiently retryable, but it is recoverable by
    /// re-authenticating.
    ///
    /// [`is_transient`]: GraphError::is_transient
    pub fn recoverable(&self) -> bool {
        match self {
            Self::Upstream { recoverable, .. } => *recoverable,
            Self::Network { .. } => true,
            _ => false,
        }
    }

    /// Remedial action the caller should take.
    pub fn action(&self) -> &str {
        match self {
            Self::Upstream { action, .. } => action,
            Self::Http { .. } | Self::Json(_) => ACTION_UNMAPPED,
            Self::Network { .. } => ACTION_NETWORK,
            Self::Validation(_) => "Fix the request parameters and try again",
            Self::Storage(_) => "Inspect the token storage backend",
            Self::TokenNotFound { .. } => "Store a token for this user before requesting one",
            Self::Configuration { .. } => "Review the client configuration",
        }
    }

    /// Numeric upstream error code, when one was present.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Upstream { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Trace id from the upstream response, when one was present.
    pub fn trace_id(&self) -> Option<&str> {
        match self {
            Self::Upstream { trace_id, .. } => trace_id.as_deref(),
            _ => None,
        }
    }
}

const ACTION_UNMAPPED: &str = "Check Meta API documentation";
const ACTION_NETWORK: &str = "Check your internet connection";

/// Fixed policy table mapping upstream error codes to a curated message,
/// remedial action, and recoverability flag.
fn normalize_code(code: i64, original_message: &str) -> (String, String, bool) {
    let entry: Option<(&str, &str, bool)> = match code {
        190 => Some(("Access token expired", "Please re-authenticate", true)),
        10 => Some((
            "Permission not granted",
            "Request permission in App Review",
            false,
        )),
        100 => Some((
            "Invalid parameter",
            "Check API documentation for correct parameters",
            false,
        )),
        200 => Some((
            "Permission denied",
            "User needs to grant this permission",
            true,
        )),
        368 => Some(("Temporarily blocked", "Wait before retrying", true)),
        _ => None,
    };

    match entry {
        Some((message, action, recoverable)) => {
            (message.to_string(), action.to_string(), recoverable)
        }
        None => (
            original_message.to_string(),
            ACTION_UNMAPPED.to_string(),
            false,
        ),
    }
}

/// Input validation errors.
///
/// These errors occur when validating caller input or configuration data,
/// always before any network call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing.
    #[error("Required field missing: {field}")]
    Required { field: String },

    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    /// A field value is out of the acceptable range.
    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },

    /// A webhook signature header is missing or malformed.
    #[error("Invalid signature format: {message}")]
    InvalidSignatureFormat { message: String },
}

/// Errors from token storage backends.
///
/// Storage errors are generally non-fatal for the token lifecycle: a failed
/// read is treated like a missing token and triggers re-authentication.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A storage operation failed for a backend-specific reason.
    #[error("Storage operation failed: {message}")]
    OperationFailed { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
