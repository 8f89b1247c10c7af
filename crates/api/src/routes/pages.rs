use crate::middleware::CurrentUser;
use axum::{
    extract::Query,
    response::{Html, IntoResponse},
    Extension,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// Error indicator carried on the redirect back from a failed login
    pub error: Option<String>,
}

/// GET /
///
/// Home page with a sign-in link. Shows an error banner when a failed
/// login redirected back here.
pub async fn home_page(Query(query): Query<HomeQuery>) -> impl IntoResponse {
    let banner = match query.error.as_deref() {
        Some(kind) => format!(
            r#"<p class="error">Sign-in failed ({}). Please try again.</p>"#,
            escape_html(kind)
        ),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>SSO Portal</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 480px; margin: 4rem auto; }}
        .error {{ color: #c53030; border: 1px solid #c53030; border-radius: 8px; padding: 0.75rem 1rem; }}
    </style>
</head>
<body>
    <h1>Home</h1>
    {banner}
    <a href="/login">Login with Google</a>
</body>
</html>"#
    ))
}

/// GET /profile (protected)
///
/// Shows the authenticated identity. The session middleware guarantees a
/// [`CurrentUser`] extension is present.
pub async fn profile_page(Extension(user): Extension<CurrentUser>) -> impl IntoResponse {
    let identity = user.0;
    let email = identity
        .emails
        .first()
        .map(String::as_str)
        .unwrap_or("(no email on record)");

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Profile - SSO Portal</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 480px; margin: 4rem auto; }}
    </style>
</head>
<body>
    <h1>Welcome, {name}</h1>
    <p>Email: {email}</p>
    <a href="/logout">Logout</a>
</body>
</html>"#,
        name = escape_html(&identity.display_name),
        email = escape_html(email),
    ))
}

/// Escape text for interpolation into HTML. Profile fields and the error
/// indicator come from outside the process and must never reach the page
/// raw.
fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}
