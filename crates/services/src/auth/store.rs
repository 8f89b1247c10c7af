use super::ports::{IdentityAssertion, Session};
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Maps opaque session tokens to authenticated identities.
///
/// Tokens are stored under their SHA-256 hash, so the map never holds the
/// client-facing token and lookups compare hashes rather than token bytes.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    session_ttl: Duration,
}

impl SessionStore {
    pub fn new(session_ttl_hours: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Generate a new session token (256 bits)
    fn generate_session_token() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        format!("sid_{}", hex::encode(bytes))
    }

    /// Hash a session token for storage
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Mint a session for an authenticated identity and return its token.
    /// An existing entry is never overwritten; a hash collision regenerates
    /// the token instead.
    pub async fn create(&self, identity: IdentityAssertion) -> String {
        let mut sessions = self.sessions.write().await;

        let session_token = loop {
            let candidate = Self::generate_session_token();
            if !sessions.contains_key(&Self::hash_token(&candidate)) {
                break candidate;
            }
        };

        let now = Utc::now();
        sessions.insert(
            Self::hash_token(&session_token),
            Session {
                identity,
                created_at: now,
                expires_at: now + self.session_ttl,
            },
        );

        debug!("Created session, active sessions: {}", sessions.len());
        session_token
    }

    /// Return the identity for a live session token. Expired entries are
    /// lazily evicted here; a miss is a normal not-found path, never an
    /// error.
    pub async fn lookup(&self, session_token: &str) -> Option<IdentityAssertion> {
        let hash = Self::hash_token(session_token);

        {
            let sessions = self.sessions.read().await;
            let session = sessions.get(&hash)?;
            if session.expires_at > Utc::now() {
                return Some(session.identity.clone());
            }
        }

        // Entry exists but has expired: evict it before reporting the miss.
        // Re-check under the write lock in case a sweep got there first.
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&hash)
            .is_some_and(|s| s.expires_at <= Utc::now())
        {
            sessions.remove(&hash);
            debug!("Evicted expired session on lookup");
        }
        None
    }

    /// Remove a session unconditionally. Idempotent: invalidating an
    /// unknown token is a no-op.
    pub async fn invalidate(&self, session_token: &str) {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&Self::hash_token(session_token));
        if removed.is_some() {
            debug!("Invalidated session");
        }
    }

    /// Sweep expired sessions
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        let swept = before - sessions.len();
        if swept > 0 {
            debug!("Cleaned up {} expired sessions", swept);
        }
        swept
    }
}
