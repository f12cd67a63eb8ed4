use serde::{Deserialize, Serialize};

use crate::api::product::Product;
use crate::client::{ApiClient, PendingRequest};
use crate::error::{ApiError, ValidationError};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub include_search: bool,
    pub use_personalization: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// `null` when the server ran no product search
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    #[serde(default)]
    pub personalized: bool,
}

/// Conversation id in the `user-<unix millis>` form the chat service expects.
pub fn new_session_id() -> String {
    format!("user-{}", chrono::Utc::now().timestamp_millis())
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            include_search: true,
            use_personalization: true,
        }
    }
}

/// POST /chat/message
pub async fn send_message(client: &ApiClient, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ValidationError::EmptyField("message").into());
    }

    client
        .send_json(PendingRequest::post("/chat/message").json(request)?)
        .await
}
