use lab_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::auth::{AuthContext, Role},
    domain::models::order::RelayPayload,
    domain::services::order_service::OrderService,
    domain::ports::{ResultRelay, ResultStore},
    infra::factory::{bootstrap_state_with_relay, connect_sqlite},
    error::AppError,
};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_PASSWORD: &str = "admin123";
pub const STAFF_PASSWORD: &str = "staff123";

#[derive(Default)]
pub struct MockRelay {
    pub calls: Mutex<Vec<RelayPayload>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl MockRelay {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Makes every later relay call record the payload and then fail.
    pub fn fail_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultRelay for MockRelay {
    async fn relay(&self, payload: &RelayPayload) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(payload.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("Relay target unreachable".into()));
        }
        Ok(())
    }
}

/// Result store whose writes always fail, e.g. a full disk.
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl ResultStore for FailingStore {
    async fn save(&self, file_name: &str, _content: &[u8]) -> Result<(), AppError> {
        Err(AppError::Storage(format!("No space left writing {}", file_name)))
    }

    async fn remove(&self, _file_name: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn exists(&self, _file_name: &str) -> bool {
        false
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

impl AuthHeaders {
    pub fn cookie(&self) -> String {
        format!("access_token={}; refresh_token={}", self.access_token, self.refresh_token)
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub db_filename: String,
    pub results_dir: PathBuf,
    pub state: Arc<AppState>,
    pub relay: Arc<MockRelay>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);
        let results_dir = std::env::temp_dir().join(format!("lab_results_{}", Uuid::new_v4()));

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            results_dir: results_dir.clone(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            default_currency: "EGP".to_string(),
            retention_days: 14,
            sweep_interval: Duration::from_secs(3600),
            relay_timeout: Duration::from_secs(1),
            seed_admin_password: ADMIN_PASSWORD.to_string(),
            seed_staff_password: STAFF_PASSWORD.to_string(),
        };

        let relay = Arc::new(MockRelay::default());
        let state = bootstrap_state_with_relay(&config, relay.clone())
            .await
            .expect("Failed to bootstrap test state");
        let state = Arc::new(state);

        let pool = connect_sqlite(&db_url).await.expect("Failed to open test db");
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            results_dir,
            state,
            relay,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthHeaders {
        let payload = json!({
            "username": username,
            "password": password
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookies: Vec<String> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        let access_token = cookie_value(&cookies, "access_token");
        let refresh_token = cookie_value(&cookies, "refresh_token");

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            refresh_token,
            csrf_token,
        }
    }

    pub async fn admin(&self) -> AuthHeaders {
        self.login("admin", ADMIN_PASSWORD).await
    }

    pub async fn staff(&self) -> AuthHeaders {
        self.login("staff", STAFF_PASSWORD).await
    }

    /// Sends a JSON request and returns the status with the parsed body
    /// (`Value::Null` for an empty body).
    pub async fn send(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, auth.cookie())
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }

    pub async fn upload(&self, auth: &AuthHeaders, order_id: &str, file_name: &str, content: &[u8]) -> (StatusCode, Value) {
        let boundary = "lab-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", file_name).as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/orders/{}/result", order_id))
            .header(header::COOKIE, auth.cookie())
            .header("X-CSRF-Token", &auth.csrf_token)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        read_json(response).await
    }

    pub async fn create_order(&self, auth: &AuthHeaders, name: &str, phone: Option<&str>, test: &str, price: i64) -> Value {
        let (status, body) = self.send("POST", "/api/v1/orders", Some(auth), Some(json!({
            "name": name,
            "phone": phone,
            "test": test,
            "price": price
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create order failed: {}", body);
        body
    }

    /// Creates an order, uploads a PDF and publishes it as admin.
    pub async fn published_order(&self, admin: &AuthHeaders, name: &str, phone: &str) -> Value {
        let order = self.create_order(admin, name, Some(phone), "CBC", 150).await;
        let id = order["id"].as_str().unwrap();
        let (status, _) = self.upload(admin, id, "report.pdf", b"%PDF-1.4 result").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = self.send("POST", &format!("/api/v1/orders/{}/approve", id), Some(admin), None).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    pub async fn check(&self, pin: &str, identifier: &str) -> Value {
        let (status, body) = self.send("POST", "/api/v1/public/check", None, Some(json!({
            "pin": pin,
            "identifier": identifier
        }))).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    /// Moves an order's creation time into the past.
    pub async fn backdate_order(&self, order_id: &str, days: i64) {
        sqlx::query("UPDATE orders SET created_at = ? WHERE id = ?")
            .bind(Utc::now() - chrono::Duration::days(days))
            .bind(order_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    pub fn result_path(&self, file_name: &str) -> PathBuf {
        self.results_dir.join(file_name)
    }

    /// Order service over this app's repositories but a different store.
    pub fn order_service_with_store(&self, store: Arc<dyn ResultStore>) -> OrderService {
        OrderService::new(
            self.state.order_repo.clone(),
            self.state.patient_repo.clone(),
            self.state.settings_repo.clone(),
            store,
            self.relay.clone(),
            self.state.config.default_currency.clone(),
        )
    }

    pub async fn patient_count(&self, name: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM patients WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub fn admin_context(&self) -> AuthContext {
        AuthContext {
            user_id: "admin-test".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
        }
    }
}

fn cookie_value(cookies: &[String], name: &str) -> String {
    let prefix = format!("{}=", name);
    let cookie = cookies.iter()
        .find(|c| c.starts_with(&prefix))
        .unwrap_or_else(|| panic!("No {} cookie returned", name));
    let start = prefix.len();
    let end = cookie[start..].find(';').unwrap_or(cookie.len() - start);
    cookie[start..start + end].to_string()
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_dir_all(&self.results_dir);
    }
}
