/// Favorites endpoints under `/users/{id}/favorites`.

use serde::{Deserialize, Serialize};

use crate::api::product::Product;
use crate::client::{ApiClient, PendingRequest};
use crate::error::ApiError;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub product_id: i64,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub added_at: Option<String>,
}

impl From<&Product> for Favorite {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            category: product
                .category
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            color: product.color.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            image_url: product.image_url.clone(),
            added_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFavoriteResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub favorite: Favorite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveFavoriteResponse {
    pub status: String,
    pub product_id: serde_json::Value,
}

fn favorites_path(user_id: &str) -> String {
    format!("/users/{}/favorites", user_id)
}

/// GET /users/{id}/favorites
pub async fn list_favorites(client: &ApiClient, user_id: &str) -> Result<FavoritesResponse, ApiError> {
    client
        .send_json(PendingRequest::get(favorites_path(user_id)))
        .await
}

/// POST /users/{id}/favorites. Adding an existing favorite is not an error.
pub async fn add_favorite(
    client: &ApiClient,
    user_id: &str,
    favorite: &Favorite,
) -> Result<AddFavoriteResponse, ApiError> {
    client
        .send_json(PendingRequest::post(favorites_path(user_id)).json(favorite)?)
        .await
}

/// DELETE /users/{id}/favorites/{product_id}
pub async fn remove_favorite(
    client: &ApiClient,
    user_id: &str,
    product_id: i64,
) -> Result<RemoveFavoriteResponse, ApiError> {
    let path = format!("{}/{}", favorites_path(user_id), product_id);
    client.send_json(PendingRequest::delete(path)).await
}
