//! Substrate wallet verification
//!
//! Addresses are SS58-encoded 32-byte account ids. Signatures are accepted
//! as sr25519 or ed25519, over either the raw message or the
//! `<Bytes>...</Bytes>` wrapping browser extensions apply when signing raw data.

use async_trait::async_trait;
use ed25519_dalek::Verifier;
use sp_core::crypto::{AccountId32, Ss58Codec};
use sp_core::hashing::{blake2_128, twox_128};
use sp_core::{sr25519, Pair};

use super::rpc::{RpcClient, RpcError};
use super::{IdentityVerifier, PartialProfile};

/// Paseo testnet prefix, used when the chain is unknown or unreachable
const FALLBACK_CHAIN_ID: u64 = 42;

const BYTES_PREFIX: &str = "<Bytes>";
const BYTES_SUFFIX: &str = "</Bytes>";

/// MultiSignature type tags
const MULTI_ED25519: u8 = 0x00;
const MULTI_SR25519: u8 = 0x01;

/// Verifier for Polkadot and other Substrate wallets
pub struct SubstrateVerifier {
    rpc: Option<RpcClient>,
}

impl SubstrateVerifier {
    pub fn new(rpc: Option<RpcClient>) -> Self {
        Self { rpc }
    }

    pub fn offline() -> Self {
        Self::new(None)
    }

    async fn fetch_free_balance(
        &self,
        rpc: &RpcClient,
        account: &[u8; 32],
    ) -> Result<String, RpcError> {
        let key = format!("0x{}", hex::encode(system_account_key(account)));

        let storage: String = match rpc.call("state_getStorage", [key]).await {
            Ok(storage) => storage,
            // no storage entry means the account was never funded
            Err(RpcError::EmptyResult) => return Ok("0".to_string()),
            Err(e) => return Err(e),
        };

        let bytes = hex::decode(storage.trim_start_matches("0x")).map_err(|e| RpcError::Rpc {
            code: 0,
            message: format!("Malformed account storage: {}", e),
        })?;

        decode_free_balance(&bytes)
            .map(|free| free.to_string())
            .ok_or_else(|| RpcError::Rpc {
                code: 0,
                message: format!("Account storage too short: {} bytes", bytes.len()),
            })
    }
}

#[async_trait]
impl IdentityVerifier for SubstrateVerifier {
    async fn verify_signature(&self, message: &str, signature: &str, address: &str) -> bool {
        let Some(account) = decode_address(address) else {
            tracing::debug!(address = %address, "Failed to parse SS58 address");
            return false;
        };

        let Some(sig_bytes) = hex::decode(signature.trim().trim_start_matches("0x")).ok() else {
            tracing::debug!("Failed to decode signature hex");
            return false;
        };

        let wrapped = format!("{}{}{}", BYTES_PREFIX, message, BYTES_SUFFIX);
        let payloads = [message.as_bytes(), wrapped.as_bytes()];

        match sig_bytes.len() {
            64 => payloads.iter().any(|payload| {
                verify_sr25519(&account, &sig_bytes, payload)
                    || verify_ed25519(&account, &sig_bytes, payload)
            }),
            65 => {
                let (tag, raw) = (sig_bytes[0], &sig_bytes[1..]);
                payloads.iter().any(|payload| match tag {
                    MULTI_SR25519 => verify_sr25519(&account, raw, payload),
                    MULTI_ED25519 => verify_ed25519(&account, raw, payload),
                    _ => false,
                })
            }
            len => {
                tracing::debug!(len, "Invalid signature length");
                false
            }
        }
    }

    async fn get_user_info(&self, address: &str) -> PartialProfile {
        let Some(account) = decode_address(address) else {
            return PartialProfile::minimal(address);
        };

        let mut profile = PartialProfile {
            public_key: Some(format!("0x{}", hex::encode(account))),
            ..PartialProfile::minimal(address)
        };

        if let Some(rpc) = &self.rpc {
            match self.fetch_free_balance(rpc, &account).await {
                Ok(balance) => profile.balance = Some(balance),
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Failed to fetch Substrate account info");
                }
            }
        }

        profile
    }

    async fn get_chain_id(&self) -> Option<u64> {
        let rpc = self.rpc.as_ref()?;

        let result: Result<String, RpcError> = rpc.call("system_chain", Vec::<String>::new()).await;
        match result {
            Ok(chain) => Some(chain_id_for(&chain)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch Substrate chain name");
                Some(FALLBACK_CHAIN_ID)
            }
        }
    }
}

/// Raw 32-byte account id behind an SS58 address
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    AccountId32::from_ss58check(address.trim())
        .ok()
        .map(Into::into)
}

fn verify_sr25519(account: &[u8; 32], signature: &[u8], payload: &[u8]) -> bool {
    let Ok(raw) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let public = sr25519::Public::from_raw(*account);
    sr25519::Pair::verify(&sr25519::Signature::from_raw(raw), payload, &public)
}

fn verify_ed25519(account: &[u8; 32], signature: &[u8], payload: &[u8]) -> bool {
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(account) else {
        return false;
    };
    let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
        return false;
    };
    key.verify(payload, &signature).is_ok()
}

/// Storage key of `System.Account(account)`
fn system_account_key(account: &[u8; 32]) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + 16 + 16 + 32);
    key.extend_from_slice(&twox_128(b"System"));
    key.extend_from_slice(&twox_128(b"Account"));
    key.extend_from_slice(&blake2_128(account));
    key.extend_from_slice(account);
    key
}

/// `AccountInfo` is four u32 counters followed by `AccountData { free: u128, .. }`
fn decode_free_balance(account_info: &[u8]) -> Option<u128> {
    let free: [u8; 16] = account_info.get(16..32)?.try_into().ok()?;
    Some(u128::from_le_bytes(free))
}

fn chain_id_for(chain: &str) -> u64 {
    let chain = chain.to_lowercase();
    if chain.contains("paseo") {
        42
    } else if chain.contains("polkadot") {
        0
    } else if chain.contains("kusama") {
        2
    } else if chain.contains("westend") {
        42
    } else {
        FALLBACK_CHAIN_ID
    }
}
