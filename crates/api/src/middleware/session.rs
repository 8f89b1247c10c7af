use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Redirect, Response},
};
use services::auth::IdentityAssertion;
use tracing::debug;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Authenticated identity passed to protected route handlers
#[derive(Clone)]
pub struct CurrentUser(pub IdentityAssertion);

/// Extract the session token from the request's Cookie header
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{SESSION_COOKIE}=");
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

/// Session middleware guarding protected routes.
///
/// Resolves the session cookie to an identity and inserts it as a
/// [`CurrentUser`] extension; requests without a live session are redirected
/// to the login page. An expired session is a normal miss, not an error.
pub async fn session_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Redirect> {
    let identity = match session_cookie(request.headers()) {
        Some(token) => state.sessions.lookup(&token).await,
        None => None,
    };

    match identity {
        Some(identity) => {
            debug!("Request authenticated as: {}", identity.subject_id);
            let mut request = request;
            request.extensions_mut().insert(CurrentUser(identity));
            Ok(next.run(request).await)
        }
        None => {
            debug!("No live session, redirecting to login page");
            Err(Redirect::to("/"))
        }
    }
}
