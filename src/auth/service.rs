/// Authentication Service
///
/// Login, registration, logout, explicit refresh and the one-shot session
/// bootstrap. Holds the current-user state the presentation layer reads.

use std::sync::RwLock;

use tokio::sync::OnceCell;

use crate::auth::models::{LoginRequest, RegisterRequest, User};
use crate::client::{ApiClient, PendingRequest};
use crate::error::ApiError;
use crate::session::{SessionEvent, TokenPair};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";

pub struct AuthService {
    client: ApiClient,
    current_user: RwLock<Option<User>>,
    bootstrap: OnceCell<Option<User>>,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            current_user: RwLock::new(None),
            bootstrap: OnceCell::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Restores the user from a stored access token. Runs at most once per
    /// service; later calls return the first outcome without touching the
    /// network.
    pub async fn bootstrap(&self) -> Option<User> {
        self.bootstrap
            .get_or_init(|| async {
                if !self.client.session().has_access_token() {
                    tracing::info!("No stored session; starting unauthenticated");
                    return None;
                }

                match self.me().await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.user_id, "Restored stored session");
                        self.set_current_user(Some(user.clone()));
                        Some(user)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stored session is no longer valid; clearing tokens");
                        self.client.session().clear();
                        self.set_current_user(None);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// POST /auth/login
    ///
    /// # Errors
    /// - `Validation`: email is malformed (nothing is sent)
    /// - `HttpError` 401: invalid email or password
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = is_valid_email(email)?;
        if password.is_empty() {
            return Err(crate::error::ValidationError::EmptyField("password").into());
        }

        let request = PendingRequest::post(LOGIN_PATH)
            .json(&LoginRequest {
                email: &email,
                password,
            })?
            .without_refresh();

        self.establish_session(request).await
    }

    /// POST /auth/register
    ///
    /// Name, email and password strength are checked locally first.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let name = is_valid_name(name)?;
        let email = is_valid_email(email)?;
        is_valid_password(password)?;

        let request = PendingRequest::post(REGISTER_PATH)
            .json(&RegisterRequest {
                name: &name,
                email: &email,
                password,
            })?
            .without_refresh();

        self.establish_session(request).await
    }

    /// GET /auth/me
    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.send_json(PendingRequest::get(ME_PATH)).await
    }

    /// Best-effort POST /auth/logout, then drop the local session whatever
    /// the server said.
    pub async fn logout(&self) {
        if self.client.session().has_access_token() {
            let request = PendingRequest::post(LOGOUT_PATH).without_refresh();
            if let Err(e) = self.client.send(request).await {
                tracing::warn!(error = %e, "Logout request failed; clearing session anyway");
            }
        }

        self.client.session().clear();
        self.set_current_user(None);
        self.client.session().notify(SessionEvent::LoggedOut);
        tracing::info!("Logged out");
    }

    /// Exchanges the refresh token now. A failed refresh logs the user out.
    pub async fn refresh_session(&self) -> Result<(), ApiError> {
        match self.client.refresh_tokens().await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.logout().await;
                Err(e)
            }
        }
    }

    /// The signed-in user, as long as the session still holds an access
    /// token.
    pub fn current_user(&self) -> Option<User> {
        if !self.client.session().has_access_token() {
            return None;
        }
        match self.current_user.read() {
            Ok(user) => user.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    async fn establish_session(&self, request: PendingRequest) -> Result<User, ApiError> {
        let path = request.path().to_string();
        let tokens: TokenPair = self.client.send_json(request).await?;

        self.client.session().update(&tokens)?;
        self.client.session().notify(SessionEvent::LoggedIn);

        let user = self.me().await?;
        tracing::info!(user_id = %user.user_id, path = %path, "Session established");
        self.set_current_user(Some(user.clone()));
        Ok(user)
    }

    fn set_current_user(&self, user: Option<User>) {
        match self.current_user.write() {
            Ok(mut current) => *current = user,
            Err(poisoned) => *poisoned.into_inner() = user,
        }
    }
}
