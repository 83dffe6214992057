//! Health and discovery routes

use axum::{routing::get, Router};

use crate::handlers::discovery::{health_check, openid_configuration};
use crate::state::AppState;

pub fn discovery_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openid-configuration",
            get(openid_configuration),
        )
}
