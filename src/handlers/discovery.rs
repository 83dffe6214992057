//! Health and OpenID Connect discovery handlers

use axum::{extract::State, http::Uri, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;
use crate::wallet::WalletType;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// OpenID provider metadata
///
/// Tokens are HS256 over a shared secret, so no `jwks_uri` is advertised.
#[derive(Debug, Serialize)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub response_types_supported: Vec<&'static str>,
    pub subject_types_supported: Vec<&'static str>,
    pub id_token_signing_alg_values_supported: Vec<&'static str>,
    pub scopes_supported: Vec<&'static str>,
    pub claims_supported: Vec<&'static str>,
    pub wallet_types_supported: Vec<WalletType>,
}

/// GET /.well-known/openid-configuration
pub async fn openid_configuration(State(state): State<AppState>) -> Json<OpenIdConfiguration> {
    let issuer = state.auth_service.config().issuer.clone();
    let base = issuer.trim_end_matches('/');

    Json(OpenIdConfiguration {
        authorization_endpoint: format!("{}/auth/challenge", base),
        token_endpoint: format!("{}/auth/login", base),
        userinfo_endpoint: format!("{}/user/profile", base),
        issuer,
        response_types_supported: vec!["code"],
        subject_types_supported: vec!["public"],
        id_token_signing_alg_values_supported: vec!["HS256"],
        scopes_supported: vec!["openid", "profile"],
        claims_supported: vec![
            "sub",
            "iss",
            "aud",
            "exp",
            "iat",
            "address",
            "walletType",
            "chainId",
            "nonce",
        ],
        wallet_types_supported: state.auth_service.supported_wallets(),
    })
}
