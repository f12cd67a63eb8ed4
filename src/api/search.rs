/// Search endpoints
///
/// Text search is url-encoded; image and multimodal search upload the image
/// as multipart. Ranking happens server-side.

use serde::{Deserialize, Serialize};

use crate::api::product::Product;
use crate::client::{ApiClient, MultipartField, PendingRequest};
use crate::error::ApiError;

pub const DEFAULT_RESULT_COUNT: u32 = 20;
pub const DEFAULT_ALPHA: f32 = 0.7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Product>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub results_count: Option<usize>,
    #[serde(default)]
    pub personalized: Option<bool>,
}

/// An image held in memory so the upload can be replayed after a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn field(&self) -> MultipartField {
        MultipartField::file(
            "image",
            self.file_name.clone(),
            self.content_type.clone(),
            self.bytes.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TextSearch {
    pub query: String,
    pub k: u32,
    pub personalized: bool,
}

impl TextSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            k: DEFAULT_RESULT_COUNT,
            personalized: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageSearch {
    pub image: ImageUpload,
    pub k: u32,
    pub personalized: bool,
}

impl ImageSearch {
    pub fn new(image: ImageUpload) -> Self {
        Self {
            image,
            k: DEFAULT_RESULT_COUNT,
            personalized: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultimodalSearch {
    pub query: String,
    pub image: ImageUpload,
    pub k: u32,
    /// Weight of the text embedding against the image embedding
    pub alpha: f32,
    pub personalized: bool,
}

impl MultimodalSearch {
    pub fn new(query: impl Into<String>, image: ImageUpload) -> Self {
        Self {
            query: query.into(),
            image,
            k: DEFAULT_RESULT_COUNT,
            alpha: DEFAULT_ALPHA,
            personalized: true,
        }
    }
}

/// POST /search/text
pub async fn text_search(client: &ApiClient, search: &TextSearch) -> Result<SearchResponse, ApiError> {
    if search.query.trim().is_empty() {
        return Err(crate::error::ValidationError::EmptyField("query").into());
    }

    let request = PendingRequest::post("/search/text").form([
        ("query", search.query.clone()),
        ("k", search.k.to_string()),
        ("personalized", search.personalized.to_string()),
    ]);
    client.send_json(request).await
}

/// POST /search/image
pub async fn image_search(client: &ApiClient, search: &ImageSearch) -> Result<SearchResponse, ApiError> {
    let request = PendingRequest::post("/search/image").multipart(vec![
        search.image.field(),
        MultipartField::text("k", search.k.to_string()),
        MultipartField::text("personalized", search.personalized.to_string()),
    ]);
    client.send_json(request).await
}

/// POST /search/multimodal
pub async fn multimodal_search(
    client: &ApiClient,
    search: &MultimodalSearch,
) -> Result<SearchResponse, ApiError> {
    if search.query.trim().is_empty() {
        return Err(crate::error::ValidationError::EmptyField("query").into());
    }

    let request = PendingRequest::post("/search/multimodal").multipart(vec![
        MultipartField::text("query", search.query.clone()),
        search.image.field(),
        MultipartField::text("k", search.k.to_string()),
        MultipartField::text("alpha", search.alpha.to_string()),
        MultipartField::text("personalized", search.personalized.to_string()),
    ]);
    client.send_json(request).await
}
