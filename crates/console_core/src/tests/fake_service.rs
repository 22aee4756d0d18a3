//! In-process stand-in for the employee/office service, served by axum on an
//! ephemeral port. Tokens are HS256 JWTs whose `sub` is the username.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{
    domain::{EmployeeId, OfficeId},
    protocol::{CredentialsRequest, EmployeePayload, OfficePayload},
};
use tokio::{
    net::TcpListener,
    sync::{watch, Mutex},
};

use crate::{api::ConsoleApi, session::AuthSession, transport::RequestClient};

const SIGNING_SECRET: &[u8] = b"fake-service-signing-secret";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

#[derive(Default)]
struct Store {
    users: BTreeMap<String, String>,
    employees: BTreeMap<i64, EmployeePayload>,
    offices: BTreeMap<i64, OfficePayload>,
    assignments: BTreeMap<i64, BTreeSet<i64>>,
    last_employee_id: i64,
    last_office_id: i64,
    tokens_revoked: bool,
    requests: Vec<(Method, String)>,
}

#[derive(Clone)]
struct ServerState {
    store: Arc<Mutex<Store>>,
    paused: Arc<watch::Sender<bool>>,
    arrivals: Arc<watch::Sender<usize>>,
}

pub(crate) struct FakeService {
    pub api_root: String,
    state: ServerState,
}

impl FakeService {
    pub async fn start() -> Self {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let (paused, _) = watch::channel(false);
        let (arrivals, _) = watch::channel(0);
        let state = ServerState {
            store: Arc::new(Mutex::new(Store::default())),
            paused: Arc::new(paused),
            arrivals: Arc::new(arrivals),
        };

        let protected = Router::new()
            .route("/employees", get(list_employees).post(create_employee))
            .route("/employees/withOffices", get(list_employees_with_offices))
            .route(
                "/employees/:id",
                put(update_employee).delete(delete_employee),
            )
            .route("/employees/:id/withOffices", get(get_employee_with_offices))
            .route("/employees/:id/assignOffices", patch(assign_offices))
            .route("/offices", get(list_offices).post(create_office))
            .route(
                "/offices/:id",
                get(get_office).put(update_office).delete(delete_office),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_bearer,
            ));
        let app = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .merge(protected);
        let app = Router::new()
            .nest("/api/v1", app)
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            api_root: format!("http://{addr}/api/v1"),
            state,
        }
    }

    pub fn api(&self) -> ConsoleApi {
        ConsoleApi::new(RequestClient::with_api_root(self.api_root.clone()))
    }

    pub fn session(&self) -> Arc<AuthSession> {
        AuthSession::new(self.api())
    }

    pub async fn seed_user(&self, username: &str, password: &str) {
        self.state
            .store
            .lock()
            .await
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Session already signed in as `username`.
    pub async fn signed_in_session(&self, username: &str) -> Arc<AuthSession> {
        self.seed_user(username, "secret").await;
        let session = self.session();
        session.login(username, "secret").await.expect("login");
        session
    }

    pub async fn seed_office(&self, name: &str, location: &str) -> OfficeId {
        let mut store = self.state.store.lock().await;
        store.last_office_id += 1;
        let id = store.last_office_id;
        store.offices.insert(
            id,
            OfficePayload {
                name: name.to_string(),
                location: location.to_string(),
            },
        );
        OfficeId(id)
    }

    pub async fn seed_employee(&self, first_name: &str, dni: &str) -> EmployeeId {
        let mut store = self.state.store.lock().await;
        store.last_employee_id += 1;
        let id = store.last_employee_id;
        store.employees.insert(id, sample_employee(first_name, dni));
        EmployeeId(id)
    }

    pub async fn assigned_offices(&self, id: EmployeeId) -> BTreeSet<OfficeId> {
        self.state
            .store
            .lock()
            .await
            .assignments
            .get(&id.0)
            .map(|ids| ids.iter().copied().map(OfficeId).collect())
            .unwrap_or_default()
    }

    pub async fn has_office(&self, id: OfficeId) -> bool {
        self.state.store.lock().await.offices.contains_key(&id.0)
    }

    pub async fn has_employee(&self, id: EmployeeId) -> bool {
        self.state.store.lock().await.employees.contains_key(&id.0)
    }

    pub async fn employee(&self, id: EmployeeId) -> Option<EmployeePayload> {
        self.state.store.lock().await.employees.get(&id.0).cloned()
    }

    pub async fn requests(&self) -> Vec<(Method, String)> {
        self.state.store.lock().await.requests.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.state.store.lock().await.requests.len()
    }

    /// Every token issued so far (and later) is rejected from now on.
    pub async fn revoke_tokens(&self) {
        self.state.store.lock().await.tokens_revoked = true;
    }

    /// Holds every incoming request until [`FakeService::resume`].
    pub fn pause(&self) {
        self.state.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.state.paused.send_replace(false);
    }

    /// Resolves once `count` requests in total have reached the service.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut arrivals = self.state.arrivals.subscribe();
        let _ = arrivals.wait_for(|seen| *seen >= count).await;
    }
}

pub(crate) fn sample_employee(first_name: &str, dni: &str) -> EmployeePayload {
    EmployeePayload {
        first_name: first_name.to_string(),
        last_name: "Quispe".into(),
        phone: "987654321".into(),
        dni: dni.to_string(),
        address: "Av. Arequipa 123".into(),
        birth_date: "1990-01-15".into(),
    }
}

pub(crate) fn issue_token(username: &str) -> String {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_SECRET),
    )
    .expect("sign token")
}

async fn record_request(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    state
        .store
        .lock()
        .await
        .requests
        .push((request.method().clone(), request.uri().path().to_string()));
    state.arrivals.send_modify(|seen| *seen += 1);

    let mut paused = state.paused.subscribe();
    while *paused.borrow_and_update() {
        if paused.changed().await.is_err() {
            break;
        }
    }
    next.run(request).await
}

/// Missing or invalid bearer: 401 with an empty body.
async fn require_bearer(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if state.store.lock().await.tokens_revoked {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let valid = token.is_some_and(|token| {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(SIGNING_SECRET),
            &Validation::new(Algorithm::HS256),
        )
        .is_ok()
    });
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": 404,
            "error": "Not Found",
            "message": format!("{what} not found"),
        })),
    )
        .into_response()
}

fn bad_request(body: Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn employee_json(id: i64, employee: &EmployeePayload) -> Value {
    json!({
        "id": id,
        "firstName": employee.first_name,
        "lastName": employee.last_name,
        "phone": employee.phone,
        "dni": employee.dni,
        "address": employee.address,
        "birthDate": employee.birth_date,
    })
}

fn employee_with_offices_json(store: &Store, id: i64, employee: &EmployeePayload) -> Value {
    let office_names: Vec<String> = store
        .assignments
        .get(&id)
        .into_iter()
        .flatten()
        .filter_map(|office_id| store.offices.get(office_id))
        .map(|office| office.name.clone())
        .collect();
    let mut value = employee_json(id, employee);
    value["officeNames"] = json!(office_names);
    value
}

fn office_json(id: i64, office: &OfficePayload) -> Value {
    json!({ "id": id, "name": office.name, "location": office.location })
}

fn dni_taken(store: &Store, dni: &str, except: Option<i64>) -> bool {
    store
        .employees
        .iter()
        .any(|(id, employee)| Some(*id) != except && employee.dni == dni)
}

async fn register(
    State(state): State<ServerState>,
    Json(body): Json<CredentialsRequest>,
) -> Response {
    let mut store = state.store.lock().await;
    if store.users.contains_key(&body.username) {
        return bad_request(json!({ "error": "Username already exists" }));
    }
    store.users.insert(body.username.clone(), body.password);
    (StatusCode::CREATED, Json(json!({ "username": body.username }))).into_response()
}

async fn login(State(state): State<ServerState>, Json(body): Json<CredentialsRequest>) -> Response {
    let store = state.store.lock().await;
    match store.users.get(&body.username) {
        Some(password) if *password == body.password => {
            Json(json!({ "token": issue_token(&body.username) })).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn list_employees(State(state): State<ServerState>) -> Json<Vec<Value>> {
    let store = state.store.lock().await;
    Json(
        store
            .employees
            .iter()
            .map(|(id, employee)| employee_json(*id, employee))
            .collect(),
    )
}

async fn list_employees_with_offices(State(state): State<ServerState>) -> Json<Vec<Value>> {
    let store = state.store.lock().await;
    Json(
        store
            .employees
            .iter()
            .map(|(id, employee)| employee_with_offices_json(&store, *id, employee))
            .collect(),
    )
}

async fn get_employee_with_offices(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Response {
    let store = state.store.lock().await;
    match store.employees.get(&id) {
        Some(employee) => Json(employee_with_offices_json(&store, id, employee)).into_response(),
        None => not_found("Employee"),
    }
}

async fn create_employee(
    State(state): State<ServerState>,
    Json(body): Json<EmployeePayload>,
) -> Response {
    let mut store = state.store.lock().await;
    if dni_taken(&store, &body.dni, None) {
        return bad_request(json!({ "message": "DNI already registered" }));
    }
    store.last_employee_id += 1;
    let id = store.last_employee_id;
    let created = employee_json(id, &body);
    store.employees.insert(id, body);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_employee(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<EmployeePayload>,
) -> Response {
    let mut store = state.store.lock().await;
    if !store.employees.contains_key(&id) {
        return not_found("Employee");
    }
    if dni_taken(&store, &body.dni, Some(id)) {
        return bad_request(json!({ "message": "DNI already registered" }));
    }
    let updated = employee_json(id, &body);
    store.employees.insert(id, body);
    Json(updated).into_response()
}

async fn delete_employee(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().await;
    if store.employees.remove(&id).is_none() {
        return not_found("Employee");
    }
    store.assignments.remove(&id);
    StatusCode::OK.into_response()
}

async fn assign_offices(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(office_ids): Json<BTreeSet<i64>>,
) -> Response {
    let mut store = state.store.lock().await;
    if !store.employees.contains_key(&id) {
        return not_found("Employee");
    }
    if let Some(unknown) = office_ids
        .iter()
        .find(|office_id| !store.offices.contains_key(*office_id))
    {
        return bad_request(json!({ "error": format!("Office {unknown} does not exist") }));
    }
    store.assignments.insert(id, office_ids);
    StatusCode::OK.into_response()
}

async fn list_offices(State(state): State<ServerState>) -> Json<Vec<Value>> {
    let store = state.store.lock().await;
    Json(
        store
            .offices
            .iter()
            .map(|(id, office)| office_json(*id, office))
            .collect(),
    )
}

async fn get_office(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    let store = state.store.lock().await;
    match store.offices.get(&id) {
        Some(office) => Json(office_json(id, office)).into_response(),
        None => not_found("Office"),
    }
}

async fn create_office(
    State(state): State<ServerState>,
    Json(body): Json<OfficePayload>,
) -> Response {
    let mut store = state.store.lock().await;
    store.last_office_id += 1;
    let id = store.last_office_id;
    let created = office_json(id, &body);
    store.offices.insert(id, body);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_office(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<OfficePayload>,
) -> Response {
    let mut store = state.store.lock().await;
    if !store.offices.contains_key(&id) {
        return not_found("Office");
    }
    let updated = office_json(id, &body);
    store.offices.insert(id, body);
    Json(updated).into_response()
}

async fn delete_office(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().await;
    if store.offices.remove(&id).is_none() {
        return not_found("Office");
    }
    for assigned in store.assignments.values_mut() {
        assigned.remove(&id);
    }
    StatusCode::OK.into_response()
}
