//! Wallet SSO
//!
//! Single sign-on for callers who prove control of a wallet keypair by
//! signing a one-time challenge. MetaMask (EIP-191 over secp256k1) and
//! Polkadot (sr25519/ed25519) wallets are supported.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod wallet;
