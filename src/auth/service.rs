//! Authentication service
//!
//! Core business logic for wallet-based authentication: consumes challenges,
//! checks signatures through the wallet verifiers, resolves users and mints
//! token triples.

use thiserror::Error;

use crate::models::{AuthRequest, AuthTokensResponse, User};
use crate::wallet::{WalletType, WalletVerifiers};

use super::challenge::ChallengeStore;
use super::jwt::{AuthConfig, JwtError, TokenService, UserClaims};
use super::registry::{user_id, UserRegistry};

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid or expired challenge")]
    InvalidChallenge,

    #[error("Unsupported wallet type: {0}")]
    UnsupportedWalletType(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(String),
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidChallenge => "INVALID_CHALLENGE",
            AuthError::UnsupportedWalletType(_) => "UNSUPPORTED_WALLET_TYPE",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::TokenError(_) => "TOKEN_ERROR",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

/// Authentication service
pub struct AuthService {
    challenges: ChallengeStore,
    tokens: TokenService,
    users: UserRegistry,
    verifiers: WalletVerifiers,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(config: AuthConfig, verifiers: WalletVerifiers) -> Self {
        Self {
            challenges: ChallengeStore::new(),
            tokens: TokenService::new(config),
            users: UserRegistry::new(),
            verifiers,
        }
    }

    /// Generate a challenge message for wallet authentication
    pub async fn generate_challenge(&self, address: &str, wallet_type: WalletType) -> String {
        self.challenges.generate(address, wallet_type).await
    }

    /// Verify a signed challenge and issue tokens
    pub async fn authenticate(&self, request: AuthRequest) -> Result<AuthTokensResponse, AuthError> {
        let AuthRequest {
            message,
            signature,
            address,
            wallet_type,
            chain_id,
        } = request;

        // Consume first so a failed attempt still burns the challenge
        if !self.challenges.verify(&message).await {
            tracing::warn!(address = %address, wallet_type = %wallet_type, "Challenge rejected");
            return Err(AuthError::InvalidChallenge);
        }

        let verifier = self
            .verifiers
            .get(wallet_type)
            .ok_or_else(|| AuthError::UnsupportedWalletType(wallet_type.to_string()))?;

        if !verifier.verify_signature(&message, &signature, &address).await {
            tracing::warn!(address = %address, wallet_type = %wallet_type, "Signature rejected");
            return Err(AuthError::InvalidSignature);
        }

        // Metadata lookups may hit the network; no registry lock is held here
        let user = match self.users.record_login(&user_id(wallet_type, &address)).await {
            Some(user) => user,
            None => {
                let profile = verifier.get_user_info(&address).await;
                let chain_id = match chain_id {
                    Some(chain_id) => Some(chain_id),
                    None => verifier.get_chain_id().await,
                };
                self.users
                    .get_or_create(&address, wallet_type, chain_id, profile)
                    .await
            }
        };

        tracing::info!(user_id = %user.id, wallet_type = %wallet_type, "User authenticated");
        self.issue_tokens(&user)
    }

    /// Refresh tokens using a valid refresh token
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokensResponse, AuthError> {
        let user_id = self
            .tokens
            .verify_refresh_token(refresh_token)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let user = self
            .users
            .get_by_id(&user_id)
            .await
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "Tokens refreshed");
        self.issue_tokens(&user)
    }

    /// Resolve the user behind an access token
    pub async fn verify_token(&self, access_token: &str) -> Option<User> {
        let claims = self.tokens.verify_access_token(access_token)?;
        if !self.tokens.accepts_as_bearer(&claims) {
            tracing::debug!(sub = %claims.sub, "Token not usable as bearer");
            return None;
        }
        self.users.get_by_id(&claims.sub).await
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: &str) -> Option<User> {
        self.users.get_by_id(user_id).await
    }

    pub fn supported_wallets(&self) -> Vec<WalletType> {
        self.verifiers.supported()
    }

    pub fn config(&self) -> &AuthConfig {
        self.tokens.config()
    }

    fn issue_tokens(&self, user: &User) -> Result<AuthTokensResponse, AuthError> {
        let claims = UserClaims::from(user);

        Ok(AuthTokensResponse {
            access_token: self.tokens.issue_access_token(&claims)?,
            refresh_token: self.tokens.issue_refresh_token(&user.id)?,
            id_token: self.tokens.issue_identity_token(&claims)?,
            expires_in: self.tokens.access_token_ttl_seconds(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn challenges(&self) -> &ChallengeStore {
        &self.challenges
    }
}
