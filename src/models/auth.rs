//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::wallet::WalletType;

/// Signed challenge submitted for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

// Required fields default to empty so that absence is reported by validation

/// Request for authentication challenge
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "walletType is required"))]
    pub wallet_type: String,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub message: String,
    pub expires_in: i64,
}

/// Request to log in with a signed challenge
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "signature is required"))]
    pub signature: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "walletType is required"))]
    pub wallet_type: String,
    pub chain_id: Option<u64>,
}

/// Auth tokens response
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "refreshToken is required"))]
    pub refresh_token: String,
}

/// Identity fields returned by token verification
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub address: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user: UserSummary,
}

/// Full user profile (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub address: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
    pub ens_name: Option<String>,
    pub balance: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}
