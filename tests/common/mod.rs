use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Query;
use axum::response::IntoResponse;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use ohp_server::config::Config;

/// Audience the test server expects on Google ID tokens.
pub const GOOGLE_CLIENT_ID: &str = "ohp-test.apps.googleusercontent.com";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a local account. The test config has no recaptcha secret,
    /// so any non-empty token passes the human check.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/account/local"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
                "recaptchaToken": "test-token",
            }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn signin(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/account/local/signin"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("signin request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Sign in with a Google ID token against the stubbed tokeninfo server.
    pub async fn google_signin(
        &self,
        id_token: &str,
        register_pseudo: Option<&str>,
    ) -> (Value, StatusCode) {
        let mut body = json!({ "idToken": id_token });
        if let Some(pseudo) = register_pseudo {
            body["registerPseudo"] = json!(pseudo);
        }
        let resp = self
            .client
            .post(self.url("/api/v1/account/google/signin"))
            .json(&body)
            .send()
            .await
            .expect("google signin request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register + signin, returning (bearer token, refresh token, user id).
    pub async fn bootstrap_user(&self, name: &str, email: &str) -> (String, String, String) {
        let (body, status) = self.register(name, email, "password123").await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let user_id = body["userId"].as_str().unwrap().to_string();

        let (body, status) = self.signin(email, "password123").await;
        assert_eq!(status, StatusCode::OK, "signin failed: {body}");
        let bearer = body["bearerToken"].as_str().unwrap().to_string();
        let refresh = body["refreshToken"].as_str().unwrap().to_string();
        (bearer, refresh, user_id)
    }

    pub async fn refresh(&self, refresh_token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/refresh_token"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .expect("refresh request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create an organization, returning its JSON.
    pub async fn create_org(&self, token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/organizations",
                token,
                &json!({ "name": name, "description": "a description" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create org failed: {body}");
        body
    }

    /// Add a member to an organization, returning the member JSON.
    pub async fn add_member(
        &self,
        token: &str,
        org_id: &str,
        user_id: &str,
        roles: &[&str],
    ) -> (Value, StatusCode) {
        self.post_auth(
            &format!("/api/v1/organizations/{org_id}/members"),
            token,
            &json!({ "userId": user_id, "roles": roles }),
        )
        .await
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Stand-in for Google's tokeninfo endpoint. The id_token doubles as the
/// subject id; two magic values exercise the failure paths.
async fn tokeninfo_stub(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
    let token = params.get("id_token").cloned().unwrap_or_default();
    if token.is_empty() || token == "malformed" {
        return (StatusCode::BAD_REQUEST, "invalid id_token").into_response();
    }
    let aud = if token == "foreign-audience" {
        "someone-else.apps.googleusercontent.com"
    } else {
        GOOGLE_CLIENT_ID
    };
    axum::Json(json!({
        "sub": token,
        "aud": aud,
        "email": format!("{token}@gmail.test"),
        "name": "Google User",
        "picture": "https://lh3.test/photo.jpg",
    }))
    .into_response()
}

async fn spawn_tokeninfo_stub() -> SocketAddr {
    let router = axum::Router::new().route("/tokeninfo", axum::routing::get(tokeninfo_stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind tokeninfo stub");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Tokeninfo stub failed");
    });
    addr
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("ohp_test_{}", Uuid::now_v7().to_string().replace('-', ""));

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

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let tokeninfo_addr = spawn_tokeninfo_stub().await;

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to a random port
        log_level: "warn".to_string(),
        recaptcha_secret: None,
        recaptcha_url: "http://localhost:0/siteverify".to_string(),
        google_client_id: Some(GOOGLE_CLIENT_ID.to_string()),
        google_tokeninfo_url: format!("http://{tokeninfo_addr}/tokeninfo"),
    };

    let app = ohp_server::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

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
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
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
