//! Wallet challenge-response authentication
//!
//! - One-time challenges with the nonce embedded in the signed text
//! - HS256 access, identity and refresh tokens
//! - In-memory user registry keyed by wallet type and address

pub mod challenge;
pub mod jwt;
pub mod registry;
mod service;

pub use challenge::{ChallengeStore, CHALLENGE_TTL_SECONDS};
pub use jwt::{AuthConfig, Claims, JwtError, TokenService, UserClaims};
pub use registry::{user_id, UserRegistry};
pub use service::{AuthError, AuthService, TOKEN_TYPE_BEARER};
