use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, PendingRequest};
use crate::error::ApiError;

/// Style preferences used for personalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub style: Vec<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub budget: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub profile: Profile,
}

fn profile_path(user_id: &str) -> String {
    format!("/users/{}/profile", user_id)
}

/// GET /users/{id}/profile; a user without a saved profile gets empty
/// preferences.
pub async fn get_profile(client: &ApiClient, user_id: &str) -> Result<Profile, ApiError> {
    let response: ProfileResponse = client
        .send_json(PendingRequest::get(profile_path(user_id)))
        .await?;
    Ok(response.profile)
}

/// PUT /users/{id}/profile
pub async fn update_profile(
    client: &ApiClient,
    user_id: &str,
    profile: &Profile,
) -> Result<Profile, ApiError> {
    let response: ProfileResponse = client
        .send_json(PendingRequest::put(profile_path(user_id)).json(profile)?)
        .await?;
    Ok(response.profile)
}
