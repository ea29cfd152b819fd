//! Login/logout: the capability boundary, not a user system.
//!
//! The panel has a single shared access key. Presenting it issues the
//! catalog-write capability cookie; everything behind `/products` requires
//! that cookie. Proper multi-user authentication is deliberately out of
//! scope for this subsystem.

use askama::Template;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::{COOKIE_NAME, capability_token, verify_access_key};
use crate::state::AppState;

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub access_key: String,
}

/// Login page handler.
pub async fn login_page() -> Html<String> {
    render(&LoginTemplate { error: None })
}

/// Exchange the shared access key for the capability cookie.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    if !verify_access_key(&state.config().access_key, &form.access_key) {
        tracing::warn!("login attempt with wrong access key");
        let body = render(&LoginTemplate {
            error: Some("Wrong access key".to_string()),
        });
        return (StatusCode::UNAUTHORIZED, body).into_response();
    }

    let token = capability_token(&state.config().session_secret);
    let secure = if state.config().base_url.starts_with("https://") {
        "; Secure"
    } else {
        ""
    };
    let cookie = format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict{secure}");

    let mut response = Redirect::to("/products").into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// Clear the capability cookie.
pub async fn logout() -> Response {
    let cookie = format!("{COOKIE_NAME}=; Path=/; HttpOnly; Max-Age=0");

    let mut response = Redirect::to("/login").into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn render(template: &LoginTemplate) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}
