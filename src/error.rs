/// Error Handling Module
///
/// Every fallible operation of the client resolves to one of these types:
/// 1. Transport and HTTP failures seen by callers (`ApiError`)
/// 2. Reasons a token refresh could not complete (`RefreshError`)
/// 3. Durable token storage failures (`StorageError`)
/// 4. Client-side input validation failures (`ValidationError`)

use reqwest::StatusCode;
use thiserror::Error;

/// ============================================================================
/// 1. CALLER-FACING ERRORS
/// ============================================================================

/// Error returned by every request sent through the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed before any response arrived.
    #[error("network failure: {0}")]
    NetworkFailure(#[source] reqwest::Error),

    /// The server answered with a non-success status. 401 only lands here for
    /// requests that opted out of the refresh protocol.
    #[error("server returned {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    /// A 401 received after the single refresh-and-retry cycle.
    #[error("authentication rejected after token refresh: {0}")]
    AuthExpired(String),

    /// The refresh protocol ran and failed; the session has been cleared.
    #[error("session expired: {0}")]
    SessionExpired(#[source] RefreshError),

    /// The request could not be built (non-relative path, bad multipart mime).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A success response whose body was not the expected JSON.
    #[error("invalid response body: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            ApiError::AuthExpired(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::NetworkFailure(e) => e.status(),
            _ => None,
        }
    }

    /// True when the caller must treat the user as logged out.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }

    /// True for any authentication failure the caller cannot recover from by
    /// simply retrying.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthExpired(_) | ApiError::SessionExpired(_))
            || self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Human readable message from the server's `{"detail": ...}` or
    /// `{"error": ...}` body, when there is one.
    pub fn detail(&self) -> Option<String> {
        let body = match self {
            ApiError::HttpError { body, .. } => body,
            ApiError::AuthExpired(body) => body,
            _ => return None,
        };
        extract_detail(body)
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"].iter().find_map(|key| {
        match value.get(*key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            // FastAPI validation failures put a list of objects under `detail`
            other => Some(other.to_string()),
        }
    })
}

/// ============================================================================
/// 2. REFRESH FAILURES
/// ============================================================================

/// Why the refresh step of the interceptor failed.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token stored")]
    NoRefreshToken,

    #[error("refresh endpoint returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("refresh request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("refresh response was not a token pair: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("could not persist refreshed tokens: {0}")]
    Storage(#[source] StorageError),
}

/// ============================================================================
/// 3. STORAGE FAILURES
/// ============================================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage I/O failed at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token storage file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("token storage lock poisoned")]
    Poisoned,
}

/// ============================================================================
/// 4. VALIDATION FAILURES
/// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
    #[error("password must contain at least one digit, one lowercase letter, and one uppercase letter")]
    WeakPassword,
}
