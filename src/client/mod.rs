/// Authenticated HTTP Client
///
/// Every call to the remote API goes through `ApiClient::send`. The client
/// attaches the stored bearer token, and on a 401 runs the refresh protocol
/// once per request: refresh the pair, retry with the new token, or tear the
/// session down and report `SessionExpired`.

mod request;

pub use request::{MultipartField, MultipartValue, PendingRequest, RequestBody};

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::configuration::ApiSettings;
use crate::error::{ApiError, RefreshError};
use crate::session::{bearer_value, Session, SessionEvent, TokenPair};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Successful response: status plus the raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(ApiError::InvalidResponse)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Cheap to clone; clones share the session and the refresh lock.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: String,
    session: Arc<Session>,
    // Held for the whole refresh round trip so concurrent 401s share one refresh
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: Arc<Session>) -> Result<Self, ApiError> {
        let mut builder = ClientBuilder::new().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::NetworkFailure)?;
        Ok(Self::with_http_client(http, &settings.base_url, session))
    }

    pub fn with_http_client(http: Client, base_url: &str, session: Arc<Session>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                session,
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    /// Sends the request, running the refresh-and-retry protocol on a 401.
    pub async fn send(&self, request: PendingRequest) -> Result<ApiResponse, ApiError> {
        request.validate_path()?;
        let request_id = Uuid::new_v4();
        let mut request = request;

        loop {
            let (status, body, sent_token) = self.dispatch(&request, &request_id).await?;

            if status.is_success() {
                return Ok(ApiResponse { status, body });
            }

            let body = String::from_utf8_lossy(&body).into_owned();

            if status != StatusCode::UNAUTHORIZED || !request.refreshes_on_unauthorized() {
                return Err(ApiError::HttpError { status, body });
            }

            if request.is_retried() {
                tracing::warn!(
                    request_id = %request_id,
                    path = %request.path(),
                    "Request rejected again after token refresh"
                );
                return Err(ApiError::AuthExpired(body));
            }

            request.mark_retried();
            self.recover_from_unauthorized(sent_token.as_deref(), &request_id)
                .await?;
        }
    }

    /// `send`, then decode the body as JSON.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Exchanges the stored refresh token for a new pair right away. On
    /// failure the session is cleared and `SessionExpired` returned.
    pub async fn refresh_tokens(&self) -> Result<TokenPair, ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;
        let request_id = Uuid::new_v4();
        self.refresh_or_expire(&request_id).await
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        request_id: &Uuid,
    ) -> Result<(StatusCode, Vec<u8>, Option<String>), ApiError> {
        let url = format!("{}{}", self.inner.base_url, request.path());
        let session = &self.inner.session;

        let mut headers = session.default_headers();
        headers.extend(request.headers().clone());

        let token = session.access_token();
        match token.as_deref().and_then(bearer_value) {
            Some(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }

        let builder = self
            .inner
            .http
            .request(request.method().clone(), &url)
            .headers(headers);
        let builder = request.apply_body(builder)?;

        let started = Instant::now();
        tracing::debug!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
            retry = request.is_retried(),
            "Sending API request"
        );

        let response = builder.send().await.map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                path = %request.path(),
                error = %e,
                "API request failed before a response arrived"
            );
            ApiError::NetworkFailure(e)
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(ApiError::NetworkFailure)?
            .to_vec();

        tracing::info!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API request completed"
        );

        Ok((status, body, token))
    }

    /// Refresh step of the interceptor. `rejected` is the access token the
    /// failing request carried.
    async fn recover_from_unauthorized(
        &self,
        rejected: Option<&str>,
        request_id: &Uuid,
    ) -> Result<(), ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;

        // Another request may have rotated the pair while this one waited
        let current = self.inner.session.access_token();
        if current.is_some() && current.as_deref() != rejected {
            tracing::debug!(
                request_id = %request_id,
                "Access token already refreshed by a concurrent request"
            );
            return Ok(());
        }

        self.refresh_or_expire(request_id).await.map(|_| ())
    }

    /// Caller must hold `refresh_lock`.
    async fn refresh_or_expire(&self, request_id: &Uuid) -> Result<TokenPair, ApiError> {
        match self.exchange_refresh_token(request_id).await {
            Ok(tokens) => {
                tracing::info!(request_id = %request_id, "Access token refreshed");
                self.inner.session.notify(SessionEvent::Refreshed);
                Ok(tokens)
            }
            Err(reason) => {
                tracing::warn!(
                    request_id = %request_id,
                    reason = %reason,
                    "Token refresh failed; clearing session"
                );
                self.inner.session.clear();
                self.inner.session.notify(SessionEvent::Expired);
                Err(ApiError::SessionExpired(reason))
            }
        }
    }

    async fn exchange_refresh_token(&self, request_id: &Uuid) -> Result<TokenPair, RefreshError> {
        let session = &self.inner.session;
        let refresh_token = session.refresh_token().ok_or(RefreshError::NoRefreshToken)?;

        tracing::debug!(request_id = %request_id, "Calling refresh endpoint");
        let response = self
            .inner
            .http
            .post(format!("{}{}", self.inner.base_url, REFRESH_PATH))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(RefreshError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(RefreshError::Transport)?;

        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let tokens: TokenPair =
            serde_json::from_slice(&body).map_err(RefreshError::InvalidResponse)?;
        session.update(&tokens).map_err(RefreshError::Storage)?;
        Ok(tokens)
    }
}
