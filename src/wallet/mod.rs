//! Wallet families and signature verifiers
//!
//! Each supported wallet family plugs into the authentication flow through the
//! [`IdentityVerifier`] trait. The mapping from [`WalletType`] to verifier is
//! resolved once at startup in [`WalletVerifiers`].

mod evm;
mod rpc;
mod substrate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use evm::{address_of, eip191_payload, keccak256, recover_address, EvmVerifier};
pub use rpc::{RpcClient, RpcError};
pub use substrate::{decode_address, SubstrateVerifier};

/// Supported wallet families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// EVM-style secp256k1 `personal_sign` wallets
    MetaMask,
    /// Substrate-style sr25519/ed25519 wallets
    Polkadot,
}

impl WalletType {
    pub const ALL: [WalletType; 2] = [WalletType::MetaMask, WalletType::Polkadot];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::MetaMask => "metamask",
            WalletType::Polkadot => "polkadot",
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown wallet type: {0}")]
pub struct UnknownWalletType(pub String);

impl FromStr for WalletType {
    type Err = UnknownWalletType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metamask" => Ok(WalletType::MetaMask),
            "polkadot" => Ok(WalletType::Polkadot),
            other => Err(UnknownWalletType(other.to_string())),
        }
    }
}

/// Best-effort profile metadata returned by a verifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialProfile {
    pub address: String,
    pub public_key: Option<String>,
    pub ens_name: Option<String>,
    pub balance: Option<String>,
}

impl PartialProfile {
    /// Profile carrying only the normalized address
    pub fn minimal(address: &str) -> Self {
        Self {
            address: address.to_lowercase(),
            ..Default::default()
        }
    }
}

/// Signature verification and metadata lookup for one wallet family.
///
/// Implementations must never fail outright: malformed input yields `false`
/// from [`verify_signature`](Self::verify_signature) and lookup failures
/// degrade to [`PartialProfile::minimal`].
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_signature(&self, message: &str, signature: &str, address: &str) -> bool;

    async fn get_user_info(&self, address: &str) -> PartialProfile;

    /// Chain id of the network this verifier talks to, if it knows one.
    async fn get_chain_id(&self) -> Option<u64> {
        None
    }
}

/// Mapping table from wallet type to verifier
#[derive(Clone, Default)]
pub struct WalletVerifiers {
    verifiers: HashMap<WalletType, Arc<dyn IdentityVerifier>>,
}

impl WalletVerifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the verifier for a wallet type
    pub fn with(mut self, wallet_type: WalletType, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.verifiers.insert(wallet_type, verifier);
        self
    }

    /// Built-in verifiers for the given wallet types, wired to their RPC endpoints.
    ///
    /// An empty endpoint list yields an offline verifier that still checks
    /// signatures but skips metadata lookups.
    pub fn from_endpoints(
        enabled: &[WalletType],
        evm_endpoints: &[String],
        substrate_endpoints: &[String],
    ) -> Result<Self, RpcError> {
        let mut verifiers = Self::new();

        for wallet_type in enabled {
            let verifier: Arc<dyn IdentityVerifier> = match wallet_type {
                WalletType::MetaMask => Arc::new(EvmVerifier::new(RpcClient::optional(
                    evm_endpoints,
                )?)),
                WalletType::Polkadot => Arc::new(SubstrateVerifier::new(RpcClient::optional(
                    substrate_endpoints,
                )?)),
            };
            verifiers = verifiers.with(*wallet_type, verifier);
        }

        Ok(verifiers)
    }

    pub fn get(&self, wallet_type: WalletType) -> Option<Arc<dyn IdentityVerifier>> {
        self.verifiers.get(&wallet_type).cloned()
    }

    pub fn supported(&self) -> Vec<WalletType> {
        WalletType::ALL
            .into_iter()
            .filter(|w| self.verifiers.contains_key(w))
            .collect()
    }
}
