use super::ports::{AuthError, IdentityAssertion, PendingLogin};
use chrono::{Duration, Utc};
use config::ProviderConfig;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Orchestrates the delegated-authorization handshake with the provider:
/// builds the authorization redirect, validates the callback, exchanges the
/// authorization code for an identity assertion.
///
/// The pending-login map is the handshake's only state; a login is pending
/// exactly while its state token's hash is present. No retries are performed
/// on a failed exchange, the caller restarts from `initiate`.
pub struct AuthFlow {
    provider: ProviderConfig,
    pending_ttl: Duration,
    http_client: Client,
    pending: RwLock<HashMap<String, PendingLogin>>,
}

impl AuthFlow {
    pub fn new(
        provider: ProviderConfig,
        pending_ttl_minutes: i64,
        http_timeout_secs: u64,
    ) -> Result<Self, AuthError> {
        // Timeouts on the outbound calls are mandatory; a stalled provider
        // must never hang the caller
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(http_timeout_secs))
            .build()
            .map_err(|e| AuthError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            pending_ttl: Duration::minutes(pending_ttl_minutes),
            http_client,
            pending: RwLock::new(HashMap::new()),
        })
    }

    /// Generate a fresh unguessable state token (256 bits)
    fn generate_state_token() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Hash a token before using it as a map key. Lookups then compare
    /// hashes instead of raw token bytes, which closes the state-guessing
    /// timing side channel.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Start a login: store a pending entry and build the provider's
    /// authorization URL. No network call is made here.
    ///
    /// Returns the authorization URL to redirect the user to and the state
    /// token embedded in it.
    pub async fn initiate(&self, redirect_target: &str) -> Result<(String, String), AuthError> {
        let state_token = Self::generate_state_token();
        let auth_url = self.authorization_url(&state_token)?;

        let now = Utc::now();
        let mut pending = self.pending.write().await;
        pending.insert(
            Self::hash_token(&state_token),
            PendingLogin {
                redirect_target: redirect_target.to_string(),
                created_at: now,
                expires_at: now + self.pending_ttl,
            },
        );

        debug!("Initiated login handshake, pending callbacks: {}", pending.len());
        Ok((auth_url, state_token))
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let mut url = Url::parse(&self.provider.auth_url)
            .map_err(|e| AuthError::ConfigError(format!("Invalid authorization URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.provider.client_id)
            .append_pair("redirect_uri", &self.provider.redirect_url)
            .append_pair("scope", &self.provider.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Handle the provider callback: consume the pending entry, exchange the
    /// authorization code for an access token, fetch the profile, and build
    /// the identity assertion.
    ///
    /// Returns the assertion together with the redirect target recorded at
    /// `initiate` time.
    ///
    /// The pending entry is consumed atomically and regardless of outcome,
    /// so a state token is usable exactly once: of two concurrent callbacks
    /// presenting the same token, at most one can succeed.
    pub async fn handle_callback(
        &self,
        state: &str,
        code: &str,
    ) -> Result<(IdentityAssertion, String), AuthError> {
        // Remove under the write lock, then release it before any network
        // await below
        let entry = {
            let mut pending = self.pending.write().await;
            pending.remove(&Self::hash_token(state))
        };

        let entry = entry.ok_or(AuthError::InvalidState)?;
        if entry.expires_at < Utc::now() {
            debug!("Callback presented an expired state token");
            return Err(AuthError::InvalidState);
        }

        let access_token = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&access_token).await?;

        if profile.sub.is_empty() {
            return Err(AuthError::MalformedProfile(
                "Profile payload has no subject identifier".to_string(),
            ));
        }

        let mut emails = profile.emails;
        if emails.is_empty() {
            emails.extend(profile.email.clone());
        }

        let display_name = profile
            .name
            .or_else(|| {
                profile
                    .email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| profile.sub.clone());

        let identity = IdentityAssertion {
            subject_id: profile.sub,
            display_name,
            emails,
            issued_at: Utc::now(),
        };

        info!("Authenticated subject: {}", identity.subject_id);
        Ok((identity, entry.redirect_target))
    }

    /// Exchange the authorization code at the provider's token endpoint
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        debug!("Exchanging authorization code for access token");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.provider.redirect_url.as_str()),
            ("client_id", self.provider.client_id.as_str()),
            ("client_secret", self.provider.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.provider.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                AuthError::CodeExchangeFailed(format!("Failed to reach token endpoint: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::CodeExchangeFailed(format!(
                "Token endpoint returned status: {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AuthError::CodeExchangeFailed(format!("Failed to parse token response: {e}"))
        })?;

        Ok(token.access_token)
    }

    /// Fetch the provider's profile endpoint with the access token
    async fn fetch_profile(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        debug!("Fetching user profile with access token");

        let response = self
            .http_client
            .get(&self.provider.userinfo_url)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| {
                AuthError::ProfileFetchFailed(format!("Failed to reach profile endpoint: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(AuthError::ProfileFetchFailed(format!(
                "Profile endpoint returned status: {status}, body: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::MalformedProfile(format!("Failed to parse profile: {e}")))
    }

    /// Consume a pending entry for a callback that cannot proceed, such as
    /// the provider reporting denied consent. State tokens are single-use
    /// whether or not an exchange follows; abandoning an unknown state is
    /// a no-op.
    pub async fn abandon(&self, state: &str) {
        let removed = self.pending.write().await.remove(&Self::hash_token(state));
        if removed.is_some() {
            debug!("Abandoned pending login");
        }
    }

    /// Sweep pending logins whose callback never arrived
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, entry| entry.expires_at > now);
        before - pending.len()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "id", default)]
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    emails: Vec<String>,
}
