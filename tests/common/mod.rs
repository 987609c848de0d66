use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode as AxumStatus, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use sitebook::auth::session::{self, Claims, SESSION_COOKIE};
use sitebook::config::{Config, GeminiConfig};
use sitebook::models::User;

pub const SESSION_SECRET: &str = "test-session-secret-that-is-long-enough";
pub const GEMINI_KEY: &str = "test-gemini-key";
/// Prompt that makes the stub Gemini API answer with an error.
pub const FAILING_PROMPT: &str = "please fail upstream";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub gemini_hits: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Insert a user the way the sign-in flow would.
    pub async fn create_user(&self, email: &str) -> User {
        sitebook::db::users::create(&self.pool, email, Some("Test User"))
            .await
            .expect("create user failed")
    }

    /// Mint a session token for `email`.
    pub fn session_for(&self, email: &str) -> String {
        session::issue_token(&Claims::new(email), SESSION_SECRET).expect("issue token failed")
    }

    /// Create a user and return (user, session token).
    pub async fn sign_in(&self, email: &str) -> (User, String) {
        let user = self.create_user(email).await;
        let token = self.session_for(email);
        (user, token)
    }

    pub fn gemini_calls(&self) -> usize {
        self.gemini_hits.load(Ordering::SeqCst)
    }

    /// Make a GET request with the session cookie.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make a POST request with the session cookie and a JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create an expense, asserting success, and return its JSON.
    pub async fn create_expense(&self, token: &str, description: &str, amount: Value, date: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/expenses",
                token,
                &json!({
                    "description": description,
                    "amount": amount,
                    "category": "Materials",
                    "date": date,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create expense failed: {body}");
        body
    }

    /// POST a prompt to the Gemini relay without a session.
    pub async fn prompt(&self, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/gemini"))
            .json(body)
            .send()
            .await
            .expect("gemini request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Upload a single file as multipart/form-data under the `file` field.
    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        content_type: &str,
        data: &str,
    ) -> (Value, StatusCode) {
        let boundary = "sitebook-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {data}\r\n\
             --{boundary}--\r\n"
        );
        let resp = self
            .client
            .post(self.url("/api/upload"))
            .header("cookie", format!("{SESSION_COOKIE}={token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .expect("upload request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count query failed")
    }
}

/// Stand-in for the Gemini `generateContent` endpoint. Answers "Hello" unless
/// the prompt is [`FAILING_PROMPT`].
async fn gemini_stub(
    State(hits): State<Arc<AtomicUsize>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);

    if !uri.path().ends_with(":generateContent")
        || headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GEMINI_KEY)
    {
        return (
            AxumStatus::BAD_REQUEST,
            Json(json!({ "error": { "code": 400, "message": "bad stub request" } })),
        );
    }

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    if prompt == FAILING_PROMPT {
        return (
            AxumStatus::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "code": 500, "message": "stub failure" } })),
        );
    }

    (
        AxumStatus::OK,
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello" }] },
                "finishReason": "STOP"
            }]
        })),
    )
}

async fn spawn_gemini_stub() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(gemini_stub).with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });

    (format!("http://{addr}"), hits)
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("sitebook_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let (gemini_url, gemini_hits) = spawn_gemini_stub().await;

    let config = Config {
        database_url: test_url,
        session_secret: SESSION_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_upload_size: 16 * 1024,
        db_max_connections: 10,
        log_level: "warn".to_string(),
        gemini: GeminiConfig {
            api_key: Some(GEMINI_KEY.to_string()),
            base_url: gemini_url,
            model: "gemini-pro".to_string(),
        },
    };

    let app = sitebook::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        gemini_hits,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
