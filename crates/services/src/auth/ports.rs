use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Domain models

/// Authenticated identity produced by a successful code exchange.
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Provider-scoped unique identifier
    pub subject_id: String,
    pub display_name: String,
    /// Ordered as delivered by the provider; the first entry is the
    /// primary address
    pub emails: Vec<String>,
    pub issued_at: DateTime<Utc>,
}

/// A login handshake waiting for its provider callback.
///
/// Keyed by the hash of its state token in the pending map; consumed
/// exactly once when the callback arrives or swept after expiry.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// Where to send the user after a successful sign-in
    pub redirect_target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Established session, owned exclusively by the [`store::SessionStore`]
///
/// [`store::SessionStore`]: crate::auth::store::SessionStore
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: IdentityAssertion,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Tampered, expired, or replayed callback state
    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Code exchange failed: {0}")]
    CodeExchangeFailed(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// Provider contract violation in the profile payload
    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    /// Short machine-readable kind, used as the error indicator on the
    /// redirect back to the login page
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidState => "invalid_state",
            AuthError::CodeExchangeFailed(_) => "code_exchange_failed",
            AuthError::ProfileFetchFailed(_) => "profile_fetch_failed",
            AuthError::MalformedProfile(_) => "malformed_profile",
            AuthError::ConfigError(_) => "config_error",
        }
    }
}
