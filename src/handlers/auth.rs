//! Authentication HTTP handlers
//!
//! Endpoints for the wallet challenge-response flow.

use axum::{extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::auth::{AuthError, CHALLENGE_TTL_SECONDS};
use crate::error::ApiResult;
use crate::models::{
    AuthRequest, AuthTokensResponse, ChallengeRequest, ChallengeResponse, LoginRequest,
    RefreshTokenRequest, VerifyResponse,
};
use crate::state::AppState;
use crate::wallet::WalletType;

/// Parse a wallet type and require a registered verifier for it
fn supported_wallet_type(state: &AppState, raw: &str) -> Result<WalletType, AuthError> {
    raw.parse::<WalletType>()
        .ok()
        .filter(|wt| state.auth_service.supported_wallets().contains(wt))
        .ok_or_else(|| AuthError::UnsupportedWalletType(raw.to_string()))
}

/// POST /auth/challenge - Issue a one-time message to sign
pub async fn request_challenge(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    req.validate()?;
    let wallet_type = supported_wallet_type(&state, &req.wallet_type)?;

    let message = state
        .auth_service
        .generate_challenge(&req.address, wallet_type)
        .await;

    Ok(Json(ChallengeResponse {
        message,
        expires_in: CHALLENGE_TTL_SECONDS,
    }))
}

/// POST /auth/login - Verify a signed challenge and issue tokens
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthTokensResponse>> {
    req.validate()?;

    // Unknown names never reach the core; registered-ness is checked there
    let wallet_type = req
        .wallet_type
        .parse::<WalletType>()
        .map_err(|_| AuthError::UnsupportedWalletType(req.wallet_type.clone()))?;

    let tokens = state
        .auth_service
        .authenticate(AuthRequest {
            message: req.message,
            signature: req.signature,
            address: req.address,
            wallet_type,
            chain_id: req.chain_id,
        })
        .await?;

    Ok(Json(tokens))
}

/// POST /auth/refresh - Exchange a refresh token for a new token set
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<AuthTokensResponse>> {
    req.validate()?;

    let tokens = state.auth_service.refresh_tokens(&req.refresh_token).await?;
    Ok(Json(tokens))
}

/// GET /auth/verify - Identity behind the bearer token
pub async fn verify_token(AuthenticatedUser(user): AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        user: (&user).into(),
    })
}
