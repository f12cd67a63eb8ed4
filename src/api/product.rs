use serde::{Deserialize, Serialize};

/// A catalogue item as returned by search and chat. Fields the client does
/// not interpret are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub personalized_score: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    pub fn image_path(&self) -> Option<String> {
        self.image_url.as_deref().and_then(image_path)
    }
}

/// Resolves a product image reference to something the API host serves:
/// absolute URLs and `/images/...` paths pass through, bare file names are
/// placed under `/images/`.
pub fn image_path(image_url: &str) -> Option<String> {
    if image_url.is_empty() {
        return None;
    }
    if image_url.starts_with("http") || image_url.starts_with("/images/") {
        return Some(image_url.to_string());
    }
    Some(format!("/images/{}", image_url))
}
