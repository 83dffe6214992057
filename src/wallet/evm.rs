//! EVM wallet verification
//!
//! Verifies EIP-191 `personal_sign` signatures over secp256k1 by recovering
//! the signer address and comparing it with the claimed one.

use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tiny_keccak::{Hasher, Keccak};

use super::rpc::{RpcClient, RpcError};
use super::{IdentityVerifier, PartialProfile};

/// Chain id reported when the node cannot be reached (Ethereum mainnet)
const FALLBACK_CHAIN_ID: u64 = 1;

const WEI_DECIMALS: usize = 18;

/// Verifier for MetaMask and other EVM wallets
pub struct EvmVerifier {
    rpc: Option<RpcClient>,
}

impl EvmVerifier {
    pub fn new(rpc: Option<RpcClient>) -> Self {
        Self { rpc }
    }

    /// Signature checks only, no metadata lookups
    pub fn offline() -> Self {
        Self::new(None)
    }

    async fn fetch_balance(&self, rpc: &RpcClient, address: &str) -> Result<String, RpcError> {
        let hex_balance: String = rpc
            .call("eth_getBalance", (address, "latest"))
            .await?;

        parse_hex_u128(&hex_balance)
            .map(format_ether)
            .ok_or_else(|| RpcError::Rpc {
                code: 0,
                message: format!("Malformed balance: {}", hex_balance),
            })
    }
}

#[async_trait]
impl IdentityVerifier for EvmVerifier {
    async fn verify_signature(&self, message: &str, signature: &str, address: &str) -> bool {
        match recover_address(message, signature) {
            Some(recovered) => recovered.eq_ignore_ascii_case(address.trim()),
            None => {
                tracing::debug!(address = %address, "Malformed EVM signature");
                false
            }
        }
    }

    async fn get_user_info(&self, address: &str) -> PartialProfile {
        let Some(rpc) = &self.rpc else {
            return PartialProfile::minimal(address);
        };

        match self.fetch_balance(rpc, address).await {
            Ok(balance) => PartialProfile {
                balance: Some(balance),
                ..PartialProfile::minimal(address)
            },
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Failed to fetch EVM account info");
                PartialProfile::minimal(address)
            }
        }
    }

    async fn get_chain_id(&self) -> Option<u64> {
        let rpc = self.rpc.as_ref()?;

        let result: Result<String, RpcError> = rpc.call("eth_chainId", Vec::<String>::new()).await;
        match result.ok().and_then(|hex| parse_hex_u128(&hex)) {
            Some(chain_id) => u64::try_from(chain_id).ok().or(Some(FALLBACK_CHAIN_ID)),
            None => {
                tracing::warn!("Failed to fetch EVM chain id, assuming mainnet");
                Some(FALLBACK_CHAIN_ID)
            }
        }
    }
}

/// Recover the `0x`-prefixed lowercase address that produced an EIP-191 signature.
///
/// The signature is 65 bytes of hex, `r || s || v`, with `v` in `{0, 1, 27, 28}`.
pub fn recover_address(message: &str, signature_hex: &str) -> Option<String> {
    let sig_bytes = hex::decode(signature_hex.trim().trim_start_matches("0x")).ok()?;
    if sig_bytes.len() != 65 {
        return None;
    }

    let (rs, v) = sig_bytes.split_at(64);
    let recovery_id = match v[0] {
        0 | 27 => RecoveryId::new(false, false),
        1 | 28 => RecoveryId::new(true, false),
        _ => return None,
    };

    let signature = Signature::from_slice(rs).ok()?;
    let digest = keccak256(eip191_payload(message).as_bytes());
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id).ok()?;

    Some(address_of(&verifying_key))
}

/// `personal_sign` framing
pub fn eip191_payload(message: &str) -> String {
    format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message)
}

/// Ethereum address of a secp256k1 public key
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // skip the 0x04 uncompressed tag
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

fn parse_hex_u128(value: &str) -> Option<u128> {
    let digits = value.trim_start_matches("0x");
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, 16).ok()
}

/// Wei amount rendered in ether, e.g. `1.5` or `0.0`
fn format_ether(wei: u128) -> String {
    let unit = 10u128.pow(WEI_DECIMALS as u32);
    let whole = wei / unit;
    let fraction = format!("{:0width$}", wei % unit, width = WEI_DECIMALS);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
