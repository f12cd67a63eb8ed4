use std::sync::Arc;

use fashion_client::auth::AuthService;
use fashion_client::client::ApiClient;
use fashion_client::configuration::get_configuration;
use fashion_client::session::{FileStorage, Session};
use fashion_client::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 설정 로드
    let configuration = get_configuration()?;

    // 구조화된 로깅 초기화
    init_telemetry(&configuration.log);
    tracing::info!(base_url = %configuration.api.base_url, "Configuration loaded");

    let token_file = configuration.storage.token_file();
    tracing::info!(path = %token_file.display(), "Using token storage");

    let session = Arc::new(Session::new(Arc::new(FileStorage::new(token_file))));
    let client = ApiClient::new(&configuration.api, session)?;
    let auth = AuthService::new(client);

    match auth.bootstrap().await {
        Some(user) => {
            tracing::info!(user_id = %user.user_id, "Authenticated");
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        None => {
            tracing::info!("Not authenticated");
            println!("Not signed in");
        }
    }

    Ok(())
}
