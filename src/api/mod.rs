use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod bank_accounts;
mod error;
mod families;
mod observability;
mod types;
mod users;
mod validation;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use types::*;

use crate::services::{AccountService, AuthService, BankAccountService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn account_service(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn bank_account_service(&self) -> &Arc<dyn BankAccountService> {
        &self.shared.bank_account_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = state.config().server.clone();

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_idle_minutes,
        )));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any).allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        // Cookies only cross origins with credentials, which rules out wildcards.
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };
    let cors_layer = cors_layer.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ]);

    Router::new()
        .merge(protected_routes)
        .route("/health", get(observability::health))
        .route("/families", post(families::create_family))
        .route("/users/signin", post(auth::sign_in))
        .route("/users/signin/verify", post(auth::verify_code))
        .route("/users/signout", post(auth::sign_out))
        .layer(session_layer)
        .with_state(state)
        .layer(cors_layer)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/families/{id}", delete(families::delete_family))
        .route("/users", post(users::create_user))
        .route("/users/me", get(auth::me))
        .route(
            "/users/{id}",
            delete(users::delete_user)
                .patch(users::update_user)
                .put(users::update_user),
        )
        .route(
            "/bank_accounts",
            get(bank_accounts::index).post(bank_accounts::create),
        )
        .route(
            "/bank_accounts/{id}",
            get(bank_accounts::select)
                .patch(bank_accounts::update)
                .put(bank_accounts::update)
                .delete(bank_accounts::destroy),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
