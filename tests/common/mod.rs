// In-process fake of the fashion API for integration tests.
//
// Access tokens are short JWTs, refresh tokens are random strings that
// rotate on every use. Every request is recorded with the Authorization
// header it carried.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::Service;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fashion_client::auth::AuthService;
use fashion_client::client::ApiClient;
use fashion_client::session::{MemoryStorage, Session, TokenPair, TokenStorage};
use fashion_client::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

const JWT_SECRET: &str = "test-secret-key-at-least-32-characters-long";
const ISSUER: &str = "fake-fashion-api";
const ACCESS_TOKEN_TTL: i64 = 900;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    exp: i64,
    iat: i64,
    iss: String,
    jti: String,
}

#[derive(Clone)]
struct FakeUser {
    user_id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeApi {
    users: Mutex<HashMap<String, FakeUser>>,
    refresh_tokens: Mutex<HashMap<String, String>>,
    revoked_access: Mutex<HashSet<String>>,
    favorites: Mutex<HashMap<String, Vec<Value>>>,
    profiles: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    refresh_calls: AtomicUsize,
    refresh_delay_ms: AtomicU64,
    fail_refresh: AtomicBool,
    fail_logout: AtomicBool,
}

impl FakeApi {
    fn create_user(&self, name: &str, email: &str, password: &str) -> FakeUser {
        let user = FakeUser {
            user_id: format!("usr_{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), user.clone());
        user
    }

    fn issue_pair(&self, user: &FakeUser, access_ttl: i64) -> TokenPair {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            exp: now + access_ttl,
            iat: now,
            iss: ISSUER.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode access token");

        let refresh_token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), user.email.clone());

        TokenPair {
            access_token,
            refresh_token,
            token_type: Some("bearer".to_string()),
            expires_in: Some(access_ttl),
        }
    }

    fn authenticate(&self, req: &HttpRequest) -> Result<FakeUser, HttpResponse> {
        let unauthorized =
            || HttpResponse::Unauthorized().json(json!({"detail": "Could not validate credentials"}));

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        if self.revoked_access.lock().unwrap().contains(token) {
            return Err(unauthorized());
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
            &validation,
        )
        .map_err(|_| unauthorized())?
        .claims;

        self.users
            .lock()
            .unwrap()
            .get(&claims.email)
            .cloned()
            .ok_or_else(unauthorized)
    }

    fn record(&self, req: &actix_web::dev::ServiceRequest) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            authorization: req
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
    }
}

fn user_json(user: &FakeUser) -> Value {
    json!({
        "user_id": user.user_id,
        "name": user.name,
        "email": user.email,
        "created_at": "2026-01-13T10:00:00",
        "is_active": true
    })
}

// --- Handlers ---

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn register(api: web::Data<FakeApi>, body: web::Json<RegisterBody>) -> HttpResponse {
    if api.users.lock().unwrap().contains_key(&body.email) {
        return HttpResponse::BadRequest().json(json!({"detail": "Email already registered"}));
    }
    let user = api.create_user(&body.name, &body.email, &body.password);
    HttpResponse::Created().json(api.issue_pair(&user, ACCESS_TOKEN_TTL))
}

async fn login(api: web::Data<FakeApi>, body: web::Json<LoginBody>) -> HttpResponse {
    let user = api.users.lock().unwrap().get(&body.email).cloned();
    match user {
        Some(user) if user.password == body.password => {
            HttpResponse::Ok().json(api.issue_pair(&user, ACCESS_TOKEN_TTL))
        }
        _ => HttpResponse::Unauthorized().json(json!({"detail": "Invalid email or password"})),
    }
}

async fn refresh(api: web::Data<FakeApi>, body: web::Json<RefreshBody>) -> HttpResponse {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = api.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if api.fail_refresh.load(Ordering::SeqCst) {
        return HttpResponse::Unauthorized().json(json!({"detail": "Invalid refresh token"}));
    }

    // Rotation: a refresh token is accepted exactly once
    let email = api.refresh_tokens.lock().unwrap().remove(&body.refresh_token);
    let user = email.and_then(|email| api.users.lock().unwrap().get(&email).cloned());
    match user {
        Some(user) => HttpResponse::Ok().json(api.issue_pair(&user, ACCESS_TOKEN_TTL)),
        None => HttpResponse::Unauthorized().json(json!({"detail": "Invalid refresh token"})),
    }
}

async fn me(api: web::Data<FakeApi>, req: HttpRequest) -> HttpResponse {
    match api.authenticate(&req) {
        Ok(user) => HttpResponse::Ok().json(user_json(&user)),
        Err(response) => response,
    }
}

async fn logout(api: web::Data<FakeApi>, req: HttpRequest) -> HttpResponse {
    if api.fail_logout.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError().json(json!({"detail": "logout unavailable"}));
    }
    match api.authenticate(&req) {
        Ok(user) => HttpResponse::Ok().json(json!({"message": "Logged out", "user_id": user.user_id})),
        Err(response) => response,
    }
}

async fn list_favorites(
    api: web::Data<FakeApi>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(response) = api.authenticate(&req) {
        return response;
    }
    let favorites = api
        .favorites
        .lock()
        .unwrap()
        .get(path.as_str())
        .cloned()
        .unwrap_or_default();
    let total = favorites.len();
    HttpResponse::Ok().json(json!({"favorites": favorites, "total": total}))
}

async fn add_favorite(
    api: web::Data<FakeApi>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Err(response) = api.authenticate(&req) {
        return response;
    }
    let mut favorite = body.into_inner();
    favorite["user_id"] = json!(path.as_str());
    favorite["added_at"] = json!("2026-01-13T10:00:00");
    api.favorites
        .lock()
        .unwrap()
        .entry(path.into_inner())
        .or_default()
        .push(favorite.clone());
    HttpResponse::Ok().json(json!({"message": "Added to favorites", "favorite": favorite}))
}

async fn remove_favorite(
    api: web::Data<FakeApi>,
    req: HttpRequest,
    path: web::Path<(String, i64)>,
) -> HttpResponse {
    if let Err(response) = api.authenticate(&req) {
        return response;
    }
    let (user_id, product_id) = path.into_inner();
    if let Some(favorites) = api.favorites.lock().unwrap().get_mut(&user_id) {
        favorites.retain(|f| f["product_id"] != json!(product_id));
    }
    HttpResponse::Ok().json(json!({"status": "removed", "product_id": product_id}))
}

async fn get_profile(
    api: web::Data<FakeApi>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(response) = api.authenticate(&req) {
        return response;
    }
    let profile = api
        .profiles
        .lock()
        .unwrap()
        .get(path.as_str())
        .cloned()
        .unwrap_or_else(|| {
            json!({"user_id": path.as_str(), "style": [], "size": "", "colors": [], "budget": ""})
        });
    HttpResponse::Ok().json(json!({"profile": profile}))
}

async fn put_profile(
    api: web::Data<FakeApi>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    if let Err(response) = api.authenticate(&req) {
        return response;
    }
    let mut profile = body.into_inner();
    profile["user_id"] = json!(path.as_str());
    profile["updated_at"] = json!("2026-01-13T10:00:00");
    api.profiles
        .lock()
        .unwrap()
        .insert(path.into_inner(), profile.clone());
    HttpResponse::Ok().json(json!({"message": "Profile updated successfully", "profile": profile}))
}

#[derive(Deserialize)]
struct TextSearchForm {
    query: String,
    k: usize,
    personalized: bool,
}

fn fake_results(query: &str, k: usize) -> Vec<Value> {
    (0..k.min(3))
        .map(|i| {
            json!({
                "product_id": 1000 + i as i64,
                "product_name": format!("{} #{}", query, i),
                "category": "Topwear",
                "color": "Navy Blue",
                "image_url": format!("{}.jpg", 1000 + i),
                "score": 0.9 - i as f64 * 0.1
            })
        })
        .collect()
}

async fn search_text(form: web::Form<TextSearchForm>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "query": form.query,
        "results_count": form.k.min(3),
        "personalized": form.personalized,
        "results": fake_results(&form.query, form.k)
    }))
}

async fn search_upload(api: web::Data<FakeApi>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    // Anonymous search is allowed, a stale token is not
    if req.headers().contains_key("Authorization") {
        if let Err(response) = api.authenticate(&req) {
            return response;
        }
    }
    let content_type = req
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&body);
    if !content_type.starts_with("multipart/form-data") || !body.contains("name=\"image\"") {
        return HttpResponse::UnprocessableEntity().json(json!({"detail": "image field required"}));
    }
    let query = if body.contains("name=\"query\"") { "multimodal" } else { "image" };
    HttpResponse::Ok().json(json!({
        "status": "success",
        "results_count": 3,
        "personalized": body.contains("name=\"alpha\""),
        "results": fake_results(query, 3)
    }))
}

async fn chat_message(api: web::Data<FakeApi>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let authenticated = api.authenticate(&req).is_ok();
    let message = body["message"].as_str().unwrap_or_default().to_string();
    let include_search = body["include_search"].as_bool().unwrap_or(true);
    let personalize = body["use_personalization"].as_bool().unwrap_or(false);
    HttpResponse::Ok().json(json!({
        "response": format!("Here are some ideas for '{}'", message),
        "products": if include_search { json!(fake_results(&message, 2)) } else { Value::Null },
        "personalized": authenticated && personalize
    }))
}

async fn always_unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({"detail": "Not allowed"}))
}

async fn server_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({"detail": "index not loaded"}))
}

// --- Harness ---

pub struct TestApp {
    pub address: String,
    pub api: web::Data<FakeApi>,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}/api", port);

    let api = web::Data::new(FakeApi::default());
    let data = api.clone();

    let server = HttpServer::new(move || {
        let recorder = data.clone();
        App::new()
            .app_data(data.clone())
            .wrap_fn(move |req, srv| {
                recorder.record(&req);
                srv.call(req)
            })
            .service(
                web::scope("/api")
                    .route("/auth/register", web::post().to(register))
                    .route("/auth/login", web::post().to(login))
                    .route("/auth/refresh", web::post().to(refresh))
                    .route("/auth/me", web::get().to(me))
                    .route("/auth/logout", web::post().to(logout))
                    .route("/users/{id}/favorites", web::get().to(list_favorites))
                    .route("/users/{id}/favorites", web::post().to(add_favorite))
                    .route("/users/{id}/favorites/{product_id}", web::delete().to(remove_favorite))
                    .route("/users/{id}/profile", web::get().to(get_profile))
                    .route("/users/{id}/profile", web::put().to(put_profile))
                    .route("/search/text", web::post().to(search_text))
                    .route("/search/image", web::post().to(search_upload))
                    .route("/search/multimodal", web::post().to(search_upload))
                    .route("/chat/message", web::post().to(chat_message))
                    .route("/always-401", web::get().to(always_unauthorized))
                    .route("/boom", web::get().to(server_error)),
            )
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();

    let _ = tokio::spawn(server);

    TestApp { address, api }
}

impl TestApp {
    /// Client over a fresh in-memory storage, plus that storage for
    /// assertions.
    pub fn client(&self) -> (ApiClient, Arc<MemoryStorage>) {
        self.client_with_tokens(None)
    }

    /// Client whose storage already holds `tokens`, as after a restart.
    pub fn client_with_tokens(&self, tokens: Option<&TokenPair>) -> (ApiClient, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(tokens) = tokens {
            storage.set(ACCESS_TOKEN_KEY, &tokens.access_token).unwrap();
            storage.set(REFRESH_TOKEN_KEY, &tokens.refresh_token).unwrap();
        }
        let session = Arc::new(Session::new(storage.clone()));
        let client = ApiClient::with_http_client(reqwest::Client::new(), &self.address, session);
        (client, storage)
    }

    pub fn auth(&self) -> (AuthService, Arc<MemoryStorage>) {
        let (client, storage) = self.client();
        (AuthService::new(client), storage)
    }

    /// Creates a user directly in the fake and returns its id.
    pub fn create_user(&self, email: &str, password: &str) -> String {
        self.api.create_user("Test User", email, password).user_id
    }

    /// Issues a pair for an existing user; a negative `access_ttl` yields an
    /// already expired access token.
    pub fn issue_tokens(&self, email: &str, access_ttl: i64) -> TokenPair {
        let user = self
            .api
            .users
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .expect("user exists");
        self.api.issue_pair(&user, access_ttl)
    }

    pub fn revoke_access_token(&self, token: &str) {
        self.api.revoked_access.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_refresh(&self) {
        self.api.fail_refresh.store(true, Ordering::SeqCst);
    }

    pub fn fail_logout(&self) {
        self.api.fail_logout.store(true, Ordering::SeqCst);
    }

    pub fn slow_refresh(&self, delay: Duration) {
        self.api
            .refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.api.refresh_calls.load(Ordering::SeqCst)
    }

    /// Authorization headers seen on `method path`, in arrival order.
    pub fn authorizations(&self, method: &str, path: &str) -> Vec<Option<String>> {
        let full_path = format!("/api{}", path);
        self.api
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == full_path)
            .map(|r| r.authorization.clone())
            .collect()
    }
}

pub fn bearer(token: &str) -> Option<String> {
    Some(format!("Bearer {}", token))
}
