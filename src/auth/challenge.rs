//! One-time sign-in challenges
//!
//! A challenge is a human-readable message with a random nonce embedded in
//! its text. Clients sign the message verbatim and hand it back, so the nonce
//! never travels as a separate field.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::wallet::WalletType;

/// Lifetime of an unconsumed challenge
pub const CHALLENGE_TTL_SECONDS: i64 = 300;

const NONCE_MARKER: &str = "Nonce: ";

#[derive(Debug, Clone)]
struct Challenge {
    message: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl Challenge {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

/// In-memory store of outstanding challenges, keyed by nonce
pub struct ChallengeStore {
    challenges: Mutex<HashMap<String, Challenge>>,
    ttl: Duration,
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(CHALLENGE_TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a new challenge message for `address`
    pub async fn generate(&self, address: &str, wallet_type: WalletType) -> String {
        self.generate_at(address, wallet_type, Utc::now()).await
    }

    pub(crate) async fn generate_at(
        &self,
        address: &str,
        wallet_type: WalletType,
        now: DateTime<Utc>,
    ) -> String {
        let nonce = Uuid::new_v4().to_string();
        let message = challenge_message(address, wallet_type, now, &nonce);

        let mut challenges = self.challenges.lock().await;
        challenges.insert(
            nonce,
            Challenge {
                message: message.clone(),
                expires_at: now + self.ttl,
                used: false,
            },
        );
        sweep_locked(&mut challenges, now);

        tracing::debug!(wallet_type = %wallet_type, outstanding = challenges.len(), "Challenge issued");
        message
    }

    /// Consume a challenge.
    ///
    /// Returns `true` exactly once for a live challenge whose stored message
    /// matches `message` byte for byte.
    pub async fn verify(&self, message: &str) -> bool {
        self.verify_at(message, Utc::now()).await
    }

    pub(crate) async fn verify_at(&self, message: &str, now: DateTime<Utc>) -> bool {
        let Some(nonce) = embedded_nonce(message) else {
            return false;
        };

        let mut challenges = self.challenges.lock().await;
        match challenges.get_mut(nonce) {
            Some(challenge) if challenge.message == message && challenge.is_live(now) => {
                challenge.used = true;
                true
            }
            _ => false,
        }
    }

    /// Drop used and expired challenges
    pub async fn sweep(&self) {
        self.sweep_at(Utc::now()).await
    }

    pub(crate) async fn sweep_at(&self, now: DateTime<Utc>) {
        let mut challenges = self.challenges.lock().await;
        sweep_locked(&mut challenges, now);
    }

    /// Number of live challenges
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let mut challenges = self.challenges.lock().await;
        sweep_locked(&mut challenges, now);
        challenges.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sweep_locked(challenges: &mut HashMap<String, Challenge>, now: DateTime<Utc>) {
    challenges.retain(|_, challenge| challenge.is_live(now));
}

fn challenge_message(
    address: &str,
    wallet_type: WalletType,
    issued_at: DateTime<Utc>,
    nonce: &str,
) -> String {
    format!(
        "Sign this message to authenticate with {} wallet {} at {}. {}{}",
        wallet_type.as_str().to_uppercase(),
        address,
        issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        NONCE_MARKER,
        nonce
    )
}

fn embedded_nonce(message: &str) -> Option<&str> {
    message
        .rsplit_once(NONCE_MARKER)
        .map(|(_, nonce)| nonce)
        .filter(|nonce| !nonce.is_empty())
}
