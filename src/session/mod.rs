/// Session module
///
/// The explicit session object and the durable storage behind it.

mod state;
mod storage;

pub use state::bearer_value;
pub use state::Session;
pub use state::SessionEvent;
pub use state::TokenPair;
pub use storage::FileStorage;
pub use storage::MemoryStorage;
pub use storage::TokenStorage;
pub use storage::ACCESS_TOKEN_KEY;
pub use storage::REFRESH_TOKEN_KEY;
