pub mod middleware;
pub mod routes;

use crate::{
    middleware::session_middleware,
    routes::{
        auth::{login, logout, oauth_callback},
        pages::{home_page, profile_page},
    },
};
use axum::{middleware::from_fn_with_state, routing::get, Router};
use config::AuthConfig;
use services::auth::{AuthError, AuthFlow, SessionStore};
use std::sync::Arc;

/// Shared application state handed to every route handler.
///
/// The two stores are the only shared mutable state in the process; the
/// provider configuration inside [`AuthFlow`] is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<AuthFlow>,
    pub sessions: Arc<SessionStore>,
    session_ttl_hours: i64,
}

impl AppState {
    pub fn from_config(auth: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            flow: Arc::new(AuthFlow::new(
                auth.provider.clone(),
                auth.pending_ttl_minutes,
                auth.http_timeout_secs,
            )?),
            sessions: Arc::new(SessionStore::new(auth.session_ttl_hours)),
            session_ttl_hours: auth.session_ttl_hours,
        })
    }

    /// Session lifetime as the cookie Max-Age value
    pub fn session_max_age_secs(&self) -> i64 {
        self.session_ttl_hours * 3600
    }
}

/// Build the application router
///
/// Routes:
/// - GET / - Home page with sign-in link
/// - GET /login - Redirect to the SSO provider
/// - GET /callback - Provider callback, establishes the session
/// - GET /profile - Protected profile page
/// - GET /logout - End the session
pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Everything above this layer requires a live session
        .route("/profile", get(profile_page))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .route("/", get(home_page))
        .route("/login", get(login))
        .route("/callback", get(oauth_callback))
        .route("/logout", get(logout))
        .with_state(state)
}
