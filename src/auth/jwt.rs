//! JWT token generation and validation
//!
//! Handles creation and verification of access, identity and refresh tokens.
//! All tokens are HS256 over a single shared secret.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;
use crate::wallet::WalletType;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            _ => JwtError::DecodingFailed(e.to_string()),
        }
    }
}

/// Signing configuration, fixed for the lifetime of the service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret
    pub jwt_secret: String,
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
    /// Access and identity token lifetime
    pub access_token_ttl_seconds: i64,
    /// Refresh token lifetime
    pub refresh_token_ttl_seconds: i64,
}

/// Identity claims bound into access and identity tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub sub: String,
    pub address: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
    pub nonce: String,
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            sub: user.id.clone(),
            address: user.address.clone(),
            wallet_type: user.wallet_type,
            chain_id: user.chain_id,
            nonce: user.nonce.clone(),
        }
    }
}

/// JWT claims as read back by access verification.
///
/// Access and identity tokens fill every identity field. A refresh token
/// decodes into the same shape with only `sub` and `type` set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_type: Option<WalletType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(TokenType::Refresh.as_str())
    }
}

/// JWT claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Refresh => "refresh",
        }
    }
}

/// Stateless token signer and verifier
#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.config.access_token_ttl_seconds
    }

    /// Generate an access token carrying the user's identity claims
    pub fn issue_access_token(&self, claims: &UserClaims) -> Result<String, JwtError> {
        self.sign_user_claims(claims)
    }

    /// Generate an identity token.
    ///
    /// Same claim set and lifetime as the access token.
    pub fn issue_identity_token(&self, claims: &UserClaims) -> Result<String, JwtError> {
        self.sign_user_claims(claims)
    }

    /// Generate a refresh token for `user_id`
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            token_type: TokenType::Refresh.as_str().to_string(),
            iat: now,
            exp: now + self.config.refresh_token_ttl_seconds,
        };
        self.sign(&claims)
    }

    /// Verify signature and expiry of an access token.
    ///
    /// Any token signed with this secret decodes, refresh tokens included.
    /// Use [`TokenService::accepts_as_bearer`] before trusting it as a
    /// credential.
    pub fn verify_access_token(&self, token: &str) -> Option<Claims> {
        let mut validation = strict_validation();
        validation.validate_aud = false;

        self.decode::<Claims>(token, &validation)
            .map_err(|e| tracing::debug!(error = %e, "Access token rejected"))
            .ok()
    }

    /// Whether verified claims may authorize a request: not a refresh token,
    /// and issued for this issuer and audience
    pub fn accepts_as_bearer(&self, claims: &Claims) -> bool {
        !claims.is_refresh()
            && claims.iss.as_deref() == Some(self.config.issuer.as_str())
            && claims.aud.as_deref() == Some(self.config.audience.as_str())
    }

    /// Verify a refresh token and return its subject.
    ///
    /// Tokens without `type: "refresh"` are rejected even when correctly signed.
    pub fn verify_refresh_token(&self, token: &str) -> Option<String> {
        let mut validation = strict_validation();
        validation.validate_aud = false;

        let claims = self
            .decode::<RefreshClaims>(token, &validation)
            .map_err(|e| tracing::debug!(error = %e, "Refresh token rejected"))
            .ok()?;

        if claims.token_type != TokenType::Refresh.as_str() {
            tracing::debug!(token_type = %claims.token_type, "Wrong token type for refresh");
            return None;
        }

        Some(claims.sub)
    }

    fn sign_user_claims(&self, claims: &UserClaims) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: claims.sub.clone(),
            iat: now,
            exp: now + self.config.access_token_ttl_seconds,
            iss: Some(self.config.issuer.clone()),
            aud: Some(self.config.audience.clone()),
            address: Some(claims.address.clone()),
            wallet_type: Some(claims.wallet_type),
            chain_id: claims.chain_id,
            nonce: Some(claims.nonce.clone()),
            token_type: None,
        };
        self.sign(&claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    fn decode<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
        validation: &Validation,
    ) -> Result<T, JwtError> {
        Ok(decode::<T>(token, &self.decoding_key, validation)?.claims)
    }
}

/// HS256 only, expiry enforced with no leeway
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}
