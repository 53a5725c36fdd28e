//!
//! aedes HTTP server
//! -----------------
//! Axum routes for the planner shell.
//!
//! Responsibilities:
//! - One server-side client session per browser, keyed by a cookie, with a CSRF
//!   token every POST must echo back.
//! - Role-card demo login, the login/signup form, navigation, and logout.
//! - Rendering the routed screen as HTML, plus a JSON snapshot for API clients.
//! - A background sweeper that drops expired client sessions.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{AuthBackend, Config};
use crate::error::{AppError, AppResult};
use crate::identity::{
    visible_views, AccountAuthProvider, AuthProvider, DemoAuthProvider, LoginRequest, Role, SessionManager,
    SharedClientSession, View,
};
use crate::security::AccountRegistry;
use crate::{login, render, router};

pub const SESSION_COOKIE: &str = "aedes_session";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub provider: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let provider: Arc<dyn AuthProvider> = match config.auth_backend {
            AuthBackend::Demo => Arc::new(DemoAuthProvider::new(config.login_delay)),
            AuthBackend::Accounts => {
                Arc::new(AccountAuthProvider::new(config.login_delay, Arc::new(AccountRegistry::new())))
            }
        };
        Self::with_provider(SessionManager::new(config.session_ttl), provider)
    }

    pub fn with_provider(sessions: SessionManager, provider: Arc<dyn AuthProvider>) -> Self {
        Self { sessions, provider }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "aedes ok" }))
        .route("/api/session", get(session_snapshot))
        .route("/role/{role}", post(select_role))
        .route("/view/{view}", post(navigate))
        .route("/logout", post(logout))
        .route("/login", post(login_submit))
        .route("/login/open", post(login_open))
        .route("/login/close", post(login_close))
        .route("/login/mode", post(login_mode))
        .route("/login/password", post(login_password))
        .route("/login/cancel", post(login_cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and block until shutdown.
pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "aedes starting: bind={}, auth={:?}, login_delay_ms={}, session_ttl_secs={}",
        config.bind_address(),
        config.auth_backend,
        config.login_delay.as_millis(),
        config.session_ttl.as_secs()
    );
    let state = AppState::new(&config);

    if !config.sweep_interval.is_zero() {
        let sessions = state.sessions.clone();
        let interval = config.sweep_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                sessions.sweep();
            }
        });
    } else {
        info!("session_sweep" = false, "client session sweeper disabled");
    }

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down");
    Ok(())
}

/// Convenience entry point reading configuration from the environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(Config::from_env()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name { return Some(v.to_string()); }
        }
    }
    None
}

fn set_session_cookie(token: &str) -> AppResult<HeaderValue> {
    // HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Strict; Path=/", SESSION_COOKIE, token))
        .map_err(|e| AppError::internal("cookie".to_string(), e.to_string()))
}

fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<SharedClientSession> {
    let token = parse_cookie(headers, SESSION_COOKIE)?;
    let session = state.sessions.get(&token)?;
    state.sessions.touch(&token);
    Some(session)
}

/// Existing session, or a fresh one plus the cookie that binds it.
fn ensure_session(state: &AppState, headers: &HeaderMap) -> AppResult<(SharedClientSession, HeaderMap)> {
    let mut out = HeaderMap::new();
    if let Some(session) = session_from_headers(state, headers) {
        return Ok((session, out));
    }
    let session = state
        .sessions
        .open()
        .map_err(|e| AppError::internal("session_open".to_string(), e.to_string()))?;
    let cookie = set_session_cookie(&session.lock().token)?;
    out.insert("Set-Cookie", cookie);
    Ok((session, out))
}

#[derive(Debug, Deserialize)]
struct CsrfForm {
    #[serde(default)]
    csrf: String,
}

/// Session for a POST, after checking the CSRF token from the form or the
/// `x-csrf-token` header.
fn authorize_post(state: &AppState, headers: &HeaderMap, form_csrf: &str) -> AppResult<SharedClientSession> {
    let Some(session) = session_from_headers(state, headers) else {
        return Err(AppError::auth("no_session", "session missing or expired"));
    };
    let provided = if form_csrf.is_empty() {
        headers.get("x-csrf-token").and_then(|v| v.to_str().ok()).unwrap_or_default()
    } else {
        form_csrf
    };
    let valid = !provided.is_empty() && session.lock().csrf == provided;
    if !valid {
        warn!(target: "auth", "rejected POST with invalid csrf token");
        return Err(AppError::csrf("csrf", "invalid csrf token"));
    }
    Ok(session)
}

fn render_session(session: &SharedClientSession) -> String {
    let s = session.lock();
    render::page(&router::screen_for(&s), &s.csrf)
}

fn back_to_root() -> Response {
    Redirect::to("/").into_response()
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let (session, cookie) = ensure_session(&state, &headers)?;
    Ok((cookie, Html(render_session(&session))).into_response())
}

async fn session_snapshot(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let (session, cookie) = ensure_session(&state, &headers)?;
    let s = session.lock();
    let identity = s.holder.current();
    let visible: Vec<View> = identity.as_ref().map(|i| visible_views(i.role)).unwrap_or_default();
    let body = serde_json::json!({
        "status": "ok",
        "authenticated": identity.is_some(),
        "identity": identity,
        "view": s.view,
        "visible_views": visible,
        "screen": router::screen_for(&s),
        "login_form": s.login_form.snapshot(),
        "csrf": s.csrf,
    });
    Ok((cookie, Json(body)).into_response())
}

async fn select_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role): Path<String>,
    Form(form): Form<CsrfForm>,
) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    let role: Role = role.parse()?;
    router::select_role(&mut session.lock(), role)?;
    Ok(back_to_root())
}

async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(view): Path<String>,
    Form(form): Form<CsrfForm>,
) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    router::navigate(&mut session.lock(), View::parse_or_default(&view))?;
    Ok(back_to_root())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    router::logout(&mut session.lock());
    Ok(back_to_root())
}

async fn login_open(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    let mut s = session.lock();
    router::require_anonymous(&s)?;
    s.login_form.open();
    Ok(back_to_root())
}

async fn login_close(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    session.lock().login_form.close();
    Ok(back_to_root())
}

async fn login_mode(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    session.lock().login_form.toggle_mode();
    Ok(back_to_root())
}

async fn login_password(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    session.lock().login_form.toggle_password_visibility();
    Ok(back_to_root())
}

async fn login_cancel(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<CsrfForm>) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &form.csrf)?;
    login::cancel(&session);
    Ok(back_to_root())
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    csrf: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    organization: String,
}

async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(payload): Form<LoginPayload>,
) -> AppResult<Response> {
    let session = authorize_post(&state, &headers, &payload.csrf)?;
    router::require_anonymous(&session.lock())?;
    let role = match payload.role.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r.parse()?,
        _ => Role::default(),
    };
    let req = LoginRequest {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        role,
        organization: payload.organization,
        ..Default::default()
    };
    match login::submit(&session, state.provider.as_ref(), req).await {
        Ok(_) => Ok(back_to_root()),
        Err(e) => {
            // the form stays open with its banner; answer with the re-rendered page
            let status = StatusCode::from_u16(AppError::from(e).http_status()).unwrap_or(StatusCode::UNAUTHORIZED);
            Ok((status, Html(render_session(&session))).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_cookie() {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_static("a=1; aedes_session=abc=def; b=2"));
        assert_eq!(parse_cookie(&h, SESSION_COOKIE).as_deref(), Some("abc=def"));
        assert_eq!(parse_cookie(&h, "b").as_deref(), Some("2"));
        assert!(parse_cookie(&h, "missing").is_none());
        assert!(parse_cookie(&HeaderMap::new(), SESSION_COOKIE).is_none());
    }

    #[test]
    fn csrf_from_form_or_header() {
        let state = AppState::new(&Config::default());
        let session = state.sessions.open().unwrap();
        let (token, csrf) = {
            let s = session.lock();
            (s.token.clone(), s.csrf.clone())
        };
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap());

        assert!(authorize_post(&state, &h, &csrf).is_ok());
        assert_eq!(authorize_post(&state, &h, "wrong").unwrap_err().http_status(), 403);
        assert_eq!(authorize_post(&state, &h, "").unwrap_err().http_status(), 403);

        h.insert("x-csrf-token", HeaderValue::from_str(&csrf).unwrap());
        assert!(authorize_post(&state, &h, "").is_ok());

        let stranger = HeaderMap::new();
        assert_eq!(authorize_post(&state, &stranger, &csrf).unwrap_err().http_status(), 401);
    }
}
