/// Session State
///
/// Owns the token pair (through `TokenStorage`), the default headers attached
/// to every outbound request, and the broadcast channel the presentation
/// layer listens on for login / logout / expiry.

use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::StorageError;
use crate::session::storage::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Token pair returned by login, register and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: None,
            expires_in: None,
        }
    }
}

/// Authentication state transitions, broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    /// The refresh protocol failed and the session was torn down; the
    /// presentation layer should show its login surface.
    Expired,
    LoggedOut,
}

pub struct Session {
    storage: Arc<dyn TokenStorage>,
    default_headers: RwLock<HeaderMap>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Builds the session from whatever the storage already holds, so a
    /// stored access token is attached from the first request on.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let session = Self {
            storage,
            default_headers: RwLock::new(HeaderMap::new()),
            events,
        };

        if let Some(token) = session.access_token() {
            session.set_authorization(Some(&token));
            tracing::debug!("Restored stored access token into default headers");
        }

        session
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_key(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_key(REFRESH_TOKEN_KEY)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token().is_some()
    }

    /// Persists a new pair and points the default authorization header at
    /// the new access token.
    pub fn update(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        self.set_authorization(Some(&tokens.access_token));
        Ok(())
    }

    /// Removes both tokens and the default authorization header. Storage
    /// failures are logged; the in-memory header is dropped regardless.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::error!(key = key, error = %e, "Failed to remove token from storage");
            }
        }
        self.set_authorization(None);
    }

    /// Snapshot of the headers every request starts from.
    pub fn default_headers(&self) -> HeaderMap {
        match self.default_headers.read() {
            Ok(headers) => headers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn authorization_header(&self) -> Option<HeaderValue> {
        self.default_headers().get(AUTHORIZATION).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key = key, error = %e, "Failed to read token from storage");
                None
            }
        }
    }

    fn set_authorization(&self, token: Option<&str>) {
        let mut headers = match self.default_headers.write() {
            Ok(headers) => headers,
            Err(poisoned) => poisoned.into_inner(),
        };

        match token.map(bearer_value) {
            Some(Some(value)) => {
                headers.insert(AUTHORIZATION, value);
            }
            Some(None) => {
                tracing::warn!("Access token is not a valid header value; not attaching it");
                headers.remove(AUTHORIZATION);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
    }
}

/// `Bearer <token>` as a sensitive header value.
pub fn bearer_value(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).ok()?;
    value.set_sensitive(true);
    Some(value)
}
