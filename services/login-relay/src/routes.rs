//! HTTP surface of the login relay
//!
//! Three flow handlers plus health:
//! - `GET /` — static page with a login link
//! - `POST /login` — mint a state, record it, return the authorization URL
//! - `GET /callback` — validate the state, exchange the code, fetch the
//!   user, persist the credential, redirect to the application
//! - `GET /health` — liveness and flow counters
//!
//! `/login` is an RPC-style endpoint and answers on the JSON body channel;
//! `/callback` is browser-facing and always answers with a redirect. Every
//! failure is converted here into a symbolic error code — no error type
//! escapes a handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use discord_auth::store::{Credential, SessionStore};
use discord_auth::{build_authorization_url, exchange_code, fetch_current_user, generate_state};

use crate::config::Config;
use crate::error::AuthErrorCode;

/// Counters surfaced by the health endpoint.
#[derive(Debug, Clone)]
pub struct RelayMetrics {
    pub logins_total: Arc<AtomicU64>,
    pub callbacks_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            logins_total: Arc::new(AtomicU64::new(0)),
            callbacks_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SessionStore>,
    pub client: reqwest::Client,
    pub metrics: RelayMetrics,
}

impl AppState {
    fn client_secret(&self) -> &str {
        self.config
            .oauth
            .client_secret
            .as_ref()
            .map(|s| s.expose())
            .unwrap_or_default()
    }

    /// `{app_url}/auth/error?error=<CODE>` for the given failure.
    fn error_url(&self, code: AuthErrorCode) -> String {
        format!("{}?error={}", self.config.error_uri(), code.as_str())
    }

    fn error_redirect(&self, code: AuthErrorCode) -> Response {
        self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
        warn!(error = code.as_str(), "callback failed");
        Redirect::to(&self.error_url(code)).into_response()
    }
}

/// Build the axum router with all routes and shared state.
///
/// The CORS layer lets the browser app call `POST /login` cross-origin and
/// read the JSON body. Credentials are allowed, so the origin list is
/// explicit — never a wildcard.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);
    Router::new()
        .route("/", get(index_handler))
        .route("/login", post(login_handler))
        .route("/callback", get(callback_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// GET / — static login page.
async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<html>
    <body>
        <a href="/login">Login with Discord</a>
    </body>
</html>"#,
    )
}

#[derive(Deserialize)]
struct LoginParams {
    token: Option<String>,
}

/// POST /login?token=<caller_token> — start a login round trip.
///
/// Responds with a JSON string body: either the error-page URL (missing
/// token, store failure) or the full Discord authorization URL carrying a
/// freshly minted state bound to the caller token.
async fn login_handler(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Json<String> {
    let Some(caller_token) = params.token else {
        state.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
        warn!("login called without caller token");
        return Json(state.error_url(AuthErrorCode::GetTokenFailed));
    };

    let login_state = generate_state();
    if let Err(e) = state
        .store
        .insert_state(login_state.clone(), caller_token)
        .await
    {
        state.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
        warn!(error = %e, "failed to record login state");
        return Json(state.error_url(AuthErrorCode::CannotStoreToken));
    }

    state.metrics.logins_total.fetch_add(1, Ordering::Relaxed);
    info!(state = login_state, "login initiated");

    Json(build_authorization_url(
        &state.config.oauth.discord_api_base,
        &state.config.oauth.client_id,
        &state.config.redirect_uri(),
        &login_state,
    ))
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// GET /callback?code=<code>&state=<state> — Discord redirects here.
///
/// The state is consumed (and the removal persisted) before any upstream
/// contact, so it stays single-use even when the exchange fails afterward.
/// Every outcome is a redirect: the app URL on success, the error page with
/// a symbolic code otherwise.
async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(oauth_state) = params.state else {
        return state.error_redirect(AuthErrorCode::StateNotFound);
    };

    let caller_token = match state.store.take_state(&oauth_state).await {
        Ok(Some(token)) => token,
        Ok(None) => return state.error_redirect(AuthErrorCode::InvalidState),
        Err(e) => {
            warn!(error = %e, "failed to consume state");
            return state.error_redirect(AuthErrorCode::CannotStoreToken);
        }
    };

    let code = params.code.unwrap_or_default();
    let token = match exchange_code(
        &state.client,
        &state.config.oauth.discord_api_base,
        &state.config.oauth.client_id,
        state.client_secret(),
        &code,
        &state.config.redirect_uri(),
    )
    .await
    {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "token exchange failed");
            return state.error_redirect(AuthErrorCode::from(&e));
        }
    };

    let user = match fetch_current_user(
        &state.client,
        &state.config.oauth.discord_api_base,
        &token.access_token,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "user fetch failed");
            return state.error_redirect(AuthErrorCode::from(&e));
        }
    };

    let credential = Credential {
        user_id: user.id.clone(),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    };
    if let Err(e) = state.store.insert_credential(caller_token, credential).await {
        warn!(error = %e, "failed to persist credential");
        return state.error_redirect(AuthErrorCode::CannotStoreToken);
    }

    state.metrics.callbacks_total.fetch_add(1, Ordering::Relaxed);
    info!(user_id = user.id, "login completed");

    Redirect::to(&state.config.oauth.app_url).into_response()
}

/// GET /health — JSON with status, uptime, and flow counters.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.metrics.started_at.elapsed().as_secs(),
        "logins_total": state.metrics.logins_total.load(Ordering::Relaxed),
        "callbacks_total": state.metrics.callbacks_total.load(Ordering::Relaxed),
        "errors_total": state.metrics.errors_total.load(Ordering::Relaxed),
        "pending_states": state.store.pending_states().await,
        "stored_credentials": state.store.stored_credentials().await,
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}
