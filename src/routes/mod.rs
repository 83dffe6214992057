//! Route definitions for the wallet SSO API

mod auth;
mod discovery;
mod user;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use discovery::discovery_routes;
pub use user::user_routes;

/// Assemble the full application with its middleware stack
pub fn create_router(state: AppState) -> Router {
    let cors = configure_cors(&state.config.cors_allowed_origins);
    let production = state.config.environment.is_production();

    let router = Router::new()
        .merge(discovery_routes())
        .merge(auth_routes())
        .merge(user_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers));

    let router = if production {
        router.layer(axum::middleware::from_fn(middleware::hsts_header))
    } else {
        router
    };

    router
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(cors)
}

fn configure_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
