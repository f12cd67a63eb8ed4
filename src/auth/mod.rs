/// Authentication module
///
/// Handles login, registration, logout and session bootstrap on top of the
/// authenticated client.

mod models;
mod service;

pub use models::LoginRequest;
pub use models::RegisterRequest;
pub use models::User;
pub use service::AuthService;
pub use service::LOGIN_PATH;
pub use service::LOGOUT_PATH;
pub use service::ME_PATH;
pub use service::REGISTER_PATH;
