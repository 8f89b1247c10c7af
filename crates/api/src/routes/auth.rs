use crate::middleware::session::{session_cookie, SESSION_COOKIE};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use services::auth::AuthError;
use tracing::{debug, error, info};

/// Query parameters delivered by the provider callback. The provider sends
/// either `code` or `error` (for example `access_denied` when the user
/// refuses consent), so every field is optional.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Provider failure indicator, set instead of `code`
    error: Option<String>,
}

/// GET /login
///
/// Initiates the handshake and redirects the user to the provider's
/// authorization page. The pending state lives server-side; no cookie is
/// set yet.
pub async fn login(State(state): State<AppState>) -> Result<Redirect, Redirect> {
    match state.flow.initiate("/profile").await {
        Ok((auth_url, _state_token)) => {
            debug!("Redirecting to provider authorization endpoint");
            Ok(Redirect::to(&auth_url))
        }
        Err(e) => {
            error!("Failed to initiate login: {}", e);
            Err(redirect_with_error(&e))
        }
    }
}

/// GET /callback?state=&code=
///
/// Handles the provider callback. On success, mints a session, sets the
/// session cookie, and redirects to the page the login was initiated for.
/// Every failure is converted to a redirect back to the login page with an
/// error indicator; none is fatal to the process.
pub async fn oauth_callback(
    Query(params): Query<CallbackQuery>,
    State(state): State<AppState>,
) -> Response {
    // A denied consent or otherwise failed authorization arrives without a
    // code. The pending entry is still consumed; state tokens are single-use
    // whether or not an exchange follows.
    let (state_token, code) = match (params.state, params.code, params.error) {
        (Some(state_token), Some(code), None) => (state_token, code),
        (state_token, _, provider_error) => {
            if let Some(token) = state_token.as_deref() {
                state.flow.abandon(token).await;
            }
            let kind = provider_error.unwrap_or_else(|| "invalid_request".to_string());
            error!("Provider callback did not deliver a code: {}", kind);
            return Redirect::to(&format!("/?error={}", urlencoding::encode(&kind)))
                .into_response();
        }
    };

    match state.flow.handle_callback(&state_token, &code).await {
        Ok((identity, redirect_target)) => {
            info!("Signed in: {}", identity.subject_id);

            let session_token = state.sessions.create(identity).await;
            let cookie = format!(
                "{SESSION_COOKIE}={session_token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
                state.session_max_age_secs()
            );

            ([(SET_COOKIE, cookie)], Redirect::to(&redirect_target)).into_response()
        }
        Err(e) => {
            // Provider-unreachable vs provider-rejected matters for the log
            // only; both land back on the login page
            error!("Login failed: {}", e);
            redirect_with_error(&e).into_response()
        }
    }
}

/// GET /logout
///
/// Invalidates the session, clears the cookie, and redirects home.
/// Logging out without a session is a no-op.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session_token) = session_cookie(&headers) {
        state.sessions.invalidate(&session_token).await;
        debug!("Logged out");
    }

    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0");
    ([(SET_COOKIE, cookie)], Redirect::to("/"))
}

fn redirect_with_error(error: &AuthError) -> Redirect {
    Redirect::to(&format!("/?error={}", urlencoding::encode(error.kind())))
}
