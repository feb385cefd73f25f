//! Integration test harness for the Shop CRM console.
//!
//! Each test starts two servers on ephemeral ports:
//! - a [`FakeBackend`], an in-memory stand-in for the CRM REST API that
//!   records every call it receives
//! - the real console [`app`](shopcrm_console::app), configured to talk to
//!   the fake
//!
//! ```rust,ignore
//! let ctx = TestContext::start().await;
//! ctx.backend.insert("customers", json!({ "id": "c1", ... }));
//! ctx.login("admin").await;
//! let resp = ctx.get("/api/customers/c1").await;
//! ```
//!
//! Every seeded user logs in with [`PASSWORD`].

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

use shopcrm_console::backend::BackendClient;
use shopcrm_console::config::ConsoleConfig;
use shopcrm_console::state::AppState;

/// Password accepted for every seeded user.
pub const PASSWORD: &str = "secret";

/// OTP code the fake accepts.
pub const VALID_OTP: &str = "123456";

#[derive(Default)]
struct FakeState {
    records: HashMap<String, BTreeMap<String, Value>>,
    users: HashMap<String, Value>,
    calls: Vec<String>,
    next_id: u64,
    fail_shop_updates: bool,
    missing_settings_status: Option<StatusCode>,
}

impl FakeState {
    fn collection(&mut self, resource: &str) -> &mut BTreeMap<String, Value> {
        self.records.entry(resource.to_string()).or_default()
    }

    fn mint_id(&mut self, resource: &str) -> String {
        self.next_id += 1;
        format!("{resource}-{}", self.next_id)
    }

    fn missing_status(&self, resource: &str) -> StatusCode {
        match resource {
            "settings" | "settings-center" => self
                .missing_settings_status
                .unwrap_or(StatusCode::NOT_FOUND),
            _ => StatusCode::NOT_FOUND,
        }
    }
}

/// In-memory CRM backend.
///
/// Records are JSON objects keyed by resource name (`"customers"`,
/// `"promotion-histories"`, ...) and `id`. Generic handlers cover list, get,
/// create, patch, put and delete; login, OTP and points have their own.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user that can log in as `username`.
    pub fn add_user(&self, username: &str, user: Value) {
        self.lock().users.insert(username.to_string(), user);
    }

    /// Seed a record. Its `id` field is the key.
    pub fn insert(&self, resource: &str, record: Value) {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.lock().collection(resource).insert(id, record);
    }

    /// Current copy of a record.
    #[must_use]
    pub fn record(&self, resource: &str, id: &str) -> Option<Value> {
        self.lock()
            .records
            .get(resource)
            .and_then(|records| records.get(id))
            .cloned()
    }

    /// All records of a resource.
    #[must_use]
    pub fn records(&self, resource: &str) -> Vec<Value> {
        self.lock()
            .records
            .get(resource)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Calls received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Make every `PATCH /shops/{id}` answer 500.
    pub fn fail_shop_updates(&self, fail: bool) {
        self.lock().fail_shop_updates = fail;
    }

    /// Status returned for settings rows that do not exist (default 404).
    pub fn missing_settings_status(&self, status: StatusCode) {
        self.lock().missing_settings_status = Some(status);
    }

    /// Router serving the fake API.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/auth/login", post(login))
            .route("/auth/otp/request", post(request_otp))
            .route("/auth/otp/verify", post(verify_otp))
            .route("/points", get(list_points).post(create_points))
            .route(
                "/settings-center",
                get(get_settings_center).put(put_settings_center),
            )
            .route("/{resource}", get(list_records).post(create_record))
            .route(
                "/{resource}/{id}",
                get(get_record)
                    .patch(patch_record)
                    .put(put_record)
                    .delete(delete_record),
            )
            .layer(from_fn_with_state(self.clone(), record_call))
            .with_state(self.clone())
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn merge(target: &mut Value, patch: Map<String, Value>) {
    if let Some(object) = target.as_object_mut() {
        object.extend(patch);
    }
}

fn field_as_string(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn record_call(State(fake): State<FakeBackend>, request: Request, next: Next) -> Response {
    let call = format!("{} {}", request.method(), request.uri().path());
    fake.lock().calls.push(call);
    next.run(request).await
}

async fn login(State(fake): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let username = body.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

    let user = fake.lock().users.get(username).cloned();
    match user {
        Some(user) if password == PASSWORD => {
            let id = field_as_string(&user, "id").unwrap_or_default();
            Json(json!({ "data": { "token": format!("token-{id}"), "user": user } }))
                .into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn request_otp() -> Json<Value> {
    Json(json!({ "ref_code": "REF1" }))
}

async fn verify_otp(Json(body): Json<Value>) -> Json<Value> {
    let verified = body.get("otp").and_then(Value::as_str) == Some(VALID_OTP);
    Json(json!({ "verified": verified }))
}

async fn list_records(
    State(fake): State<FakeBackend>,
    Path(resource): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
) -> Json<Value> {
    let records: Vec<Value> = fake
        .records(&resource)
        .into_iter()
        .filter(|record| {
            filters.iter().all(|(field, wanted)| {
                field_as_string(record, field).is_none_or(|value| &value == wanted)
            })
        })
        .collect();
    Json(Value::Array(records))
}

async fn get_record(
    State(fake): State<FakeBackend>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    match fake.record(&resource, &id) {
        Some(record) => Json(record).into_response(),
        None => {
            let status = fake.lock().missing_status(&resource);
            error(status, &format!("{resource} {id} not found"))
        }
    }
}

async fn create_record(
    State(fake): State<FakeBackend>,
    Path(resource): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let mut state = fake.lock();
    let id = state.mint_id(&resource);
    let mut record = json!({ "id": id, "created_at": Utc::now() });
    merge(&mut record, body);
    state.collection(&resource).insert(id, record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn patch_record(
    State(fake): State<FakeBackend>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let mut state = fake.lock();
    if resource == "shops" && state.fail_shop_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "shop update failed");
    }
    match state.collection(&resource).get_mut(&id) {
        Some(record) => {
            merge(record, body);
            Json(record.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, &format!("{resource} {id} not found")),
    }
}

async fn put_record(
    State(fake): State<FakeBackend>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let mut state = fake.lock();
    let exists = state.collection(&resource).contains_key(&id);
    if !exists {
        let row_id = state.mint_id(&resource);
        let mut record = json!({ "id": row_id });
        if resource == "settings" {
            merge(&mut record, Map::from_iter([("shop_id".to_string(), json!(id))]));
        }
        state.collection(&resource).insert(id.clone(), record);
    }

    let collection = state.collection(&resource);
    match collection.get_mut(&id) {
        Some(record) => {
            merge(record, body);
            Json(record.clone()).into_response()
        }
        None => error(StatusCode::INTERNAL_SERVER_ERROR, "record vanished"),
    }
}

async fn delete_record(
    State(fake): State<FakeBackend>,
    Path((resource, id)): Path<(String, String)>,
) -> StatusCode {
    match fake.lock().collection(&resource).remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn list_points(
    state: State<FakeBackend>,
    query: Query<HashMap<String, String>>,
) -> Json<Value> {
    list_records(state, Path("points".to_string()), query).await
}

/// Points entries also move the customer's balance, as the real backend does.
async fn create_points(
    State(fake): State<FakeBackend>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let customer_id = body
        .get("customer_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let delta = body.get("points").and_then(Value::as_i64).unwrap_or_default();

    {
        let mut state = fake.lock();
        let Some(customer) = state.collection("customers").get_mut(&customer_id) else {
            return error(StatusCode::NOT_FOUND, "customer not found");
        };
        let balance = customer.get("points").and_then(Value::as_i64).unwrap_or_default();
        merge(
            customer,
            Map::from_iter([("points".to_string(), json!(balance + delta))]),
        );
    }

    create_record(State(fake), Path("points".to_string()), Json(body)).await
}

async fn get_settings_center(State(fake): State<FakeBackend>) -> Response {
    get_record(
        State(fake),
        Path(("settings-center".to_string(), "global".to_string())),
    )
    .await
}

async fn put_settings_center(
    State(fake): State<FakeBackend>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    put_record(
        State(fake),
        Path(("settings-center".to_string(), "global".to_string())),
        Json(body),
    )
    .await
}

/// Serve `router` on an ephemeral local port.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A console wired to a fresh fake backend, plus a cookie-keeping client.
pub struct TestContext {
    pub backend: FakeBackend,
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestContext {
    /// Start both servers.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot start.
    pub async fn start() -> Self {
        let backend = FakeBackend::new();
        let backend_addr = serve(backend.router()).await;
        let backend_url = format!("http://{backend_addr}/");

        let config = ConsoleConfig::from_lookup(|key| match key {
            "CRM_BACKEND_URL" => Some(backend_url.clone()),
            "CRM_BASE_URL" => Some("http://127.0.0.1".to_string()),
            _ => None,
        })
        .expect("Invalid test configuration");
        let api = BackendClient::new(&config.backend).expect("Failed to build backend client");
        let console_addr = serve(shopcrm_console::app(AppState::new(config, api))).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            backend,
            client,
            base_url: format!("http://{console_addr}"),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Log in as a seeded user and return the response body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the login is rejected.
    pub async fn login(&self, username: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(resp.status(), StatusCode::OK, "login as {username} failed");
        resp.json().await.expect("Login response is not JSON")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }
}

/// Seed records for one shop: the superadmin, an admin, an employee, a
/// verified customer `c1` with 100 points and an unverified customer `c2`.
pub fn seed_shop(backend: &FakeBackend) {
    backend.add_user(
        "root",
        json!({ "id": "u-root", "name": "Root", "role": "superadmin" }),
    );
    backend.add_user(
        "admin",
        json!({ "id": "u-admin", "name": "Ada", "role": "admin", "shop_id": "s1" }),
    );
    backend.add_user(
        "employee",
        json!({
            "id": "u-emp", "name": "Eve", "role": "employee",
            "shop_id": "s1", "branch_id": "b1"
        }),
    );
    backend.add_user(
        "verified",
        json!({
            "id": "c1", "name": "Carl", "role": "customer", "shop_id": "s1",
            "phone": "0812345678", "otp_verify": true
        }),
    );
    backend.add_user(
        "unverified",
        json!({
            "id": "c2", "name": "Cleo", "role": "customer", "shop_id": "s1",
            "phone": "0898765432", "otp_verify": false
        }),
    );

    backend.insert(
        "shops",
        json!({ "id": "s1", "name": "Sunrise Cafe", "status": "expired" }),
    );
    backend.insert(
        "customers",
        json!({
            "id": "c1", "shop_id": "s1", "name": "Carl",
            "phone": "0812345678", "points": 100
        }),
    );
    backend.insert(
        "customers",
        json!({
            "id": "c2", "shop_id": "s1", "name": "Cleo",
            "phone": "0898765432", "points": 0
        }),
    );
}
