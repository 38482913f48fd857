//!
//! gurukul HTTP server
//! -------------------
//! Axum surface for the multi-role dashboard. All authorization flows
//! through the session gate:
//!
//! - Public routes: role selection (the demo entry point) and the four
//!   per-role login views.
//! - `POST /login` / `POST /logout` backed by the credential directory.
//! - Demo endpoints to enter demo mode and switch the impersonated role.
//! - Guarded `/{role}-dashboard` routes: every request is decided by
//!   `RouteGuard` against one session snapshot, then rendered by the mock
//!   content generators.
//! - A panic boundary around dashboard rendering that degrades to demo
//!   mode instead of taking the process down.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::content;
use crate::directory::{self, DirectoryVerifier};
use crate::error::AppError;
use crate::session::{Decision, FileSessionStore, Role, RoleResolver, RouteGuard, SessionContext};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub sessions: Arc<SessionContext>,
    pub guard: Arc<RouteGuard>,
}

/// Start the server with configuration taken from the environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(AppConfig::from_env()).await
}

pub async fn run_with_config(config: AppConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_root)
        .with_context(|| format!("Failed to create or access data root: {}", config.data_root))?;
    // Seed one demo account per role on first run.
    directory::ensure_default_users(&config.data_root)
        .with_context(|| format!("While seeding demo accounts under: {}", config.data_root))?;

    let store = Arc::new(FileSessionStore::load_or_default(&config.data_root));
    let verifier = Arc::new(DirectoryVerifier::new(config.data_root.clone()));
    let sessions = Arc::new(SessionContext::new(store, verifier));

    // The startup switch enters demo mode before any navigation; a role
    // persisted by a previous run is kept, otherwise the configured
    // default is pinned.
    if config.force_demo {
        let pinned = sessions.snapshot().demo.role.is_some();
        sessions.enter_demo(if pinned { None } else { Some(config.demo_role) });
    }
    let snap = sessions.snapshot();
    info!(
        "session state at startup: demo_active={} demo_role={:?} rebind={}",
        snap.demo.active,
        snap.demo.role.map(|r| r.as_str()),
        config.demo_rebind
    );

    let guard = Arc::new(RouteGuard::new(RoleResolver::default(), config.demo_rebind));
    let state = AppState { config: config.clone(), sessions, guard };
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(role_selection))
        .route("/faculty-login", get(faculty_login))
        .route("/student-login", get(student_login))
        .route("/parent-login", get(parent_login))
        .route("/admin-login", get(admin_login))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/demo/enter", post(demo_enter))
        .route("/demo/role", post(demo_role))
        .route("/session", get(session_view))
        .route("/faculty-dashboard", get(faculty_dashboard))
        .route("/faculty-dashboard/{*rest}", get(faculty_dashboard))
        .route("/student-dashboard", get(student_dashboard))
        .route("/student-dashboard/{*rest}", get(student_dashboard))
        .route("/parent-dashboard", get(parent_dashboard))
        .route("/parent-dashboard/{*rest}", get(parent_dashboard))
        .route("/admin-dashboard", get(admin_dashboard))
        .route("/admin-dashboard/{*rest}", get(admin_dashboard))
        .fallback(not_found)
        .with_state(state)
}

async fn role_selection() -> impl IntoResponse {
    Json(content::role_selection_payload())
}

async fn faculty_login() -> impl IntoResponse { Json(content::login_view_payload(Role::Faculty)) }
async fn student_login() -> impl IntoResponse { Json(content::login_view_payload(Role::Student)) }
async fn parent_login() -> impl IntoResponse { Json(content::login_view_payload(Role::Parent)) }
async fn admin_login() -> impl IntoResponse { Json(content::login_view_payload(Role::Admin)) }

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> impl IntoResponse {
    match state.sessions.login(&payload.username, &payload.password).await {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "username": session.identity.username,
                "role": session.role.as_str(),
                "dashboard": session.role.dashboard_path(),
            })),
        ),
        Err(e) => {
            error!("login rejected: {e}");
            app_error_response(e.into())
        }
    }
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    state.sessions.logout();
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

#[derive(Debug, Default, Deserialize)]
struct DemoEnterPayload {
    #[serde(default)]
    role: Option<String>,
}

async fn demo_enter(State(state): State<AppState>, Json(payload): Json<DemoEnterPayload>) -> impl IntoResponse {
    let role = match payload.role.as_deref() {
        Some(s) => match Role::parse(s) {
            Some(r) => Some(r),
            None => {
                return app_error_response(AppError::user("bad_role", "unknown role keyword"));
            }
        },
        None => None,
    };
    state.sessions.enter_demo(role);
    let snap = state.sessions.snapshot();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "demo": { "active": snap.demo.active, "role": snap.demo.role.map(|r| r.as_str()) },
        })),
    )
}

#[derive(Debug, Deserialize)]
struct DemoRolePayload {
    role: String,
}

async fn demo_role(State(state): State<AppState>, Json(payload): Json<DemoRolePayload>) -> impl IntoResponse {
    let Some(role) = Role::parse(&payload.role) else {
        return app_error_response(AppError::user("bad_role", "unknown role keyword"));
    };
    match state.sessions.set_demo_role(role) {
        Ok(()) => (StatusCode::OK, Json(json!({"status":"ok","role": role.as_str()}))),
        Err(e) => app_error_response(e.into()),
    }
}

/// Snapshot view for the shell UI: who am I, and is the demo badge shown.
async fn session_view(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.sessions.snapshot();
    Json(json!({
        "authenticated": snap.real.is_some(),
        "username": snap.real.as_ref().map(|r| r.identity.username.clone()),
        "role": snap.real.as_ref().map(|r| r.role.as_str()),
        "demo": {
            "active": snap.demo.active,
            "role": snap.demo.role.map(|r| r.as_str()),
            "rebind": state.config.demo_rebind,
        },
    }))
}

async fn faculty_dashboard(State(state): State<AppState>, uri: Uri) -> Response {
    serve_dashboard(&state, &[Role::Faculty], uri.path())
}

async fn student_dashboard(State(state): State<AppState>, uri: Uri) -> Response {
    serve_dashboard(&state, &[Role::Student], uri.path())
}

async fn parent_dashboard(State(state): State<AppState>, uri: Uri) -> Response {
    serve_dashboard(&state, &[Role::Parent], uri.path())
}

async fn admin_dashboard(State(state): State<AppState>, uri: Uri) -> Response {
    serve_dashboard(&state, &[Role::Admin], uri.path())
}

/// One guarded navigation: a single guard decision, then render for the
/// effective role. A rendering panic is converted into the documented
/// degrade-to-demo transition instead of crashing the task.
fn serve_dashboard(state: &AppState, required: &[Role], path: &str) -> Response {
    match state.guard.decide(&state.sessions, required, path) {
        Decision::Allow => {
            let snap = state.sessions.snapshot();
            let (role, viewer) = match &snap.real {
                Some(real) if required.contains(&real.role) => (real.role, real.identity.username.clone()),
                _ => {
                    // Demo path; after a bootstrap the snapshot carries the role.
                    let role = snap.demo.role.unwrap_or(required[0]);
                    (role, format!("{} (demo)", role.display_name()))
                }
            };
            let rendered = std::panic::catch_unwind(AssertUnwindSafe(|| content::dashboard_payload(role, &viewer)));
            match rendered {
                Ok(payload) => (StatusCode::OK, Json(json!({"status":"ok","content": payload}))).into_response(),
                Err(panic_payload) => {
                    let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() { *s }
                              else if let Some(s) = panic_payload.downcast_ref::<String>() { s.as_str() }
                              else { "panic" };
                    error!(target: "panic", "dashboard render panic on {}: {}", path, msg);
                    state.sessions.degrade_to_demo();
                    redirect_to("/")
                }
            }
        }
        Decision::RedirectToDemoRoot => redirect_to("/"),
        Decision::RedirectToLogin(role) => redirect_to(role.login_path()),
    }
}

fn redirect_to(location: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Location", HeaderValue::from_str(location).unwrap());
    (
        StatusCode::SEE_OTHER,
        headers,
        Json(json!({"status":"redirect","location": location})),
    )
        .into_response()
}

fn app_error_response(err: AppError) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"status":"error","code": err.code_str(), "message": err.message()})),
    )
}

/// Unknown paths are a not-found view, outside the guard's responsibility.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status":"error","code":"not_found","message": format!("no view at {}", uri.path())})),
    )
}
