//! Configuration management for the wallet SSO server
//!
//! Loads and validates configuration from environment variables, with support
//! for different environments (development, staging, production).

use std::env;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::auth::AuthConfig;
use crate::wallet::WalletType;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";
const DEFAULT_EVM_RPC_URLS: &str = "https://cloudflare-eth.com";
const DEFAULT_POLKADOT_RPC_URLS: &str = "https://paseo-rpc.dwellir.com,https://rpc.ibp.network/paseo";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Bind address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// CORS allowed origins; empty means permissive
    pub cors_allowed_origins: Vec<String>,

    /// Shared HS256 signing secret
    pub jwt_secret: String,

    pub jwt_issuer: String,

    pub jwt_audience: String,

    /// Access and identity token TTL in seconds (default: 3600)
    pub access_token_ttl_seconds: i64,

    /// Refresh token TTL in seconds (default: 86400)
    pub refresh_token_ttl_seconds: i64,

    /// EVM JSON-RPC endpoints, tried in order
    pub evm_rpc_urls: Vec<String>,

    /// Substrate JSON-RPC endpoints, tried in order
    pub polkadot_rpc_urls: Vec<String>,

    /// Wallet types with a registered verifier
    pub enabled_wallets: Vec<WalletType>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = var("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue("HOST must be an IP address".to_string()))?;

        let port = var("PORT", "3001")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_level = var("RUST_LOG", "info");

        let cors_allowed_origins = split_list(&var("CORS_ALLOWED_ORIGINS", ""));

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let jwt_issuer = var("JWT_ISSUER", "http://localhost:3001");
        let jwt_audience = var("JWT_AUDIENCE", "wallet-sso");

        let access_token_ttl_seconds =
            positive_seconds("ACCESS_TOKEN_TTL_SECONDS", &var("ACCESS_TOKEN_TTL_SECONDS", "3600"))?;
        let refresh_token_ttl_seconds = positive_seconds(
            "REFRESH_TOKEN_TTL_SECONDS",
            &var("REFRESH_TOKEN_TTL_SECONDS", "86400"),
        )?;

        let evm_rpc_urls = split_list(&var("EVM_RPC_URLS", DEFAULT_EVM_RPC_URLS));
        let polkadot_rpc_urls = split_list(&var("POLKADOT_RPC_URLS", DEFAULT_POLKADOT_RPC_URLS));

        let enabled_wallets = split_list(&var("ENABLED_WALLETS", "metamask,polkadot"))
            .iter()
            .map(|s| {
                s.parse::<WalletType>()
                    .map_err(|e| ConfigError::InvalidValue(format!("ENABLED_WALLETS: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            environment,
            host,
            port,
            log_level,
            cors_allowed_origins,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            evm_rpc_urls,
            polkadot_rpc_urls,
            enabled_wallets,
        })
    }

    /// Signing configuration handed to the auth core
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
            access_token_ttl_seconds: self.access_token_ttl_seconds,
            refresh_token_ttl_seconds: self.refresh_token_ttl_seconds,
        }
    }

    /// True when JWT_SECRET was not supplied
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn positive_seconds(key: &str, raw: &str) -> Result<i64, ConfigError> {
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}
