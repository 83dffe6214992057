//! Data models for the wallet SSO service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::WalletType;

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// `"{wallet_type}:{lowercase address}"`
    pub id: String,
    /// Lowercased wallet address
    pub address: String,
    pub wallet_type: WalletType,
    pub chain_id: Option<u64>,
    pub public_key: Option<String>,
    pub ens_name: Option<String>,
    pub balance: Option<String>,
    /// Opaque salt carried in token claims
    pub nonce: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            address: user.address.clone(),
            wallet_type: user.wallet_type,
            chain_id: user.chain_id,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            address: user.address,
            wallet_type: user.wallet_type,
            chain_id: user.chain_id,
            ens_name: user.ens_name,
            balance: user.balance,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
