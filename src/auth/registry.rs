//! In-memory user registry
//!
//! Users are keyed by `"{wallet_type}:{lowercase address}"`, so the same
//! wallet always resolves to the same record.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::User;
use crate::wallet::{PartialProfile, WalletType};

/// Deterministic user id for a wallet
pub fn user_id(wallet_type: WalletType, address: &str) -> String {
    format!("{}:{}", wallet_type.as_str(), address.to_lowercase())
}

#[derive(Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<String, User>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive on address, exact on wallet type
    pub async fn find_by_address(&self, address: &str, wallet_type: WalletType) -> Option<User> {
        self.get_by_id(&user_id(wallet_type, address)).await
    }

    pub async fn get_by_id(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    /// Stamp a login on an existing user, returning the updated record
    pub async fn record_login(&self, id: &str) -> Option<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id)?;
        user.last_login_at = Utc::now();
        Some(user.clone())
    }

    /// Return the user for this wallet, creating it from `profile` if absent.
    ///
    /// An existing record only has `last_login_at` updated; `profile` and
    /// `chain_id` are used for new records.
    pub async fn get_or_create(
        &self,
        address: &str,
        wallet_type: WalletType,
        chain_id: Option<u64>,
        profile: PartialProfile,
    ) -> User {
        let id = user_id(wallet_type, address);
        let now = Utc::now();

        let mut users = self.users.write().await;
        if let Some(existing) = users.get_mut(&id) {
            existing.last_login_at = now;
            return existing.clone();
        }

        let user = User {
            id: id.clone(),
            address: address.to_lowercase(),
            wallet_type,
            chain_id,
            public_key: profile.public_key,
            ens_name: profile.ens_name,
            balance: profile.balance,
            nonce: generate_user_nonce(),
            created_at: now,
            last_login_at: now,
        };
        users.insert(id, user.clone());

        tracing::info!(user_id = %user.id, wallet_type = %wallet_type, "User created");
        user
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// Opaque per-user salt carried in token claims
fn generate_user_nonce() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn profile() -> PartialProfile {
        PartialProfile {
            balance: Some("1.5".to_string()),
            ..PartialProfile::minimal(ADDRESS)
        }
    }

    #[test]
    fn test_user_id_is_deterministic() {
        assert_eq!(
            user_id(WalletType::MetaMask, ADDRESS),
            "metamask:0x742d35cc6634c0532925a3b844bc454e4438f44e"
        );
        assert_eq!(
            user_id(WalletType::MetaMask, ADDRESS),
            user_id(WalletType::MetaMask, &ADDRESS.to_lowercase())
        );
    }

    #[tokio::test]
    async fn test_create_user() {
        let registry = UserRegistry::new();
        let user = registry
            .get_or_create(ADDRESS, WalletType::MetaMask, Some(1), profile())
            .await;

        assert_eq!(user.id, user_id(WalletType::MetaMask, ADDRESS));
        assert_eq!(user.address, ADDRESS.to_lowercase());
        assert_eq!(user.chain_id, Some(1));
        assert_eq!(user.balance.as_deref(), Some("1.5"));
        assert_eq!(user.nonce.len(), 32);
        assert_eq!(user.created_at, user.last_login_at);
    }

    #[tokio::test]
    async fn test_find_by_address_ignores_case() {
        let registry = UserRegistry::new();
        registry
            .get_or_create(ADDRESS, WalletType::MetaMask, None, profile())
            .await;

        assert!(registry
            .find_by_address(&ADDRESS.to_uppercase().replace("0X", "0x"), WalletType::MetaMask)
            .await
            .is_some());
        assert!(registry
            .find_by_address(ADDRESS, WalletType::Polkadot)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_existing_user_is_reused() {
        let registry = UserRegistry::new();
        let first = registry
            .get_or_create(ADDRESS, WalletType::MetaMask, Some(1), profile())
            .await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = registry
            .get_or_create(
                &ADDRESS.to_lowercase(),
                WalletType::MetaMask,
                Some(5),
                PartialProfile::minimal(ADDRESS),
            )
            .await;

        assert_eq!(second.id, first.id);
        assert_eq!(second.nonce, first.nonce);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.chain_id, Some(1));
        assert!(second.last_login_at > first.last_login_at);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_record_login() {
        let registry = UserRegistry::new();
        assert!(registry.record_login("metamask:0xnobody").await.is_none());

        let user = registry
            .get_or_create(ADDRESS, WalletType::MetaMask, None, profile())
            .await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let updated = registry.record_login(&user.id).await.unwrap();
        assert!(updated.last_login_at > user.last_login_at);
        assert_eq!(
            registry.get_by_id(&user.id).await.unwrap().last_login_at,
            updated.last_login_at
        );
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_one_user() {
        let registry = Arc::new(UserRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry
                        .get_or_create(ADDRESS, WalletType::MetaMask, None, profile())
                        .await
                })
            })
            .collect();

        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap().nonce);
        }

        nonces.dedup();
        assert_eq!(nonces.len(), 1);
        assert_eq!(registry.len().await, 1);
    }
}
