/// Typed wrappers for the product endpoints. Every call goes through
/// `ApiClient`, so credentials and refresh are handled there.

pub mod chat;
pub mod favorites;
pub mod product;
pub mod profile;
pub mod search;

pub use chat::{new_session_id, send_message, ChatRequest, ChatResponse};
pub use favorites::{add_favorite, list_favorites, remove_favorite, Favorite, FavoritesResponse};
pub use product::{image_path, Product};
pub use profile::{get_profile, update_profile, Profile};
pub use search::{
    image_search, multimodal_search, text_search, ImageSearch, ImageUpload, MultimodalSearch,
    SearchResponse, TextSearch,
};
