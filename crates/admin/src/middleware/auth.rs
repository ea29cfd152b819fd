//! Catalog-write capability check.
//!
//! The gallery subsystem performs no authorization logic of its own; it only
//! requires that the caller already holds the write capability. That
//! capability is a signed cookie, issued by the login route after the shared
//! access key checks out, and verified here with a constant-time comparison
//! against an HMAC recomputed from the session secret.
//!
//! This is deliberately not a user system - no accounts, no roles. The
//! panel runs on VPN-only infrastructure and one capability gates all
//! catalog writes.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::state::AppState;

/// Cookie that carries the capability token.
pub const COOKIE_NAME: &str = "tandem_admin";

/// Message bound into the capability HMAC.
const CAPABILITY_SCOPE: &[u8] = b"tandem:catalog-write:v1";

/// Extractor that requires the catalog-write capability.
///
/// HTML requests without it redirect to the login page; gallery endpoints
/// (under `/products/.../gallery/`) answer 401 so an expired session mid-edit
/// fails loudly instead of bouncing a form post through a redirect.
pub struct RequireCatalogWrite;

/// Rejection for requests without the capability.
pub enum CapabilityRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for gallery/API requests).
    Unauthorized,
}

impl IntoResponse for CapabilityRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireCatalogWrite {
    type Rejection = CapabilityRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, COOKIE_NAME);

        let ok = token.is_some_and(|token| {
            verify_capability(&state.config().session_secret, &token)
        });

        if ok {
            return Ok(Self);
        }

        if parts.uri.path().contains("/gallery/") {
            Err(CapabilityRejection::Unauthorized)
        } else {
            Err(CapabilityRejection::RedirectToLogin)
        }
    }
}

/// Compute the capability token for the configured session secret.
#[must_use]
pub fn capability_token(session_secret: &SecretString) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(session_secret.expose_secret().as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(CAPABILITY_SCOPE);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a presented capability token in constant time.
#[must_use]
pub fn verify_capability(session_secret: &SecretString, token: &str) -> bool {
    constant_time_compare(&capability_token(session_secret), token)
}

/// Check the login form's access key against the configured one.
#[must_use]
pub fn verify_access_key(configured: &SecretString, presented: &str) -> bool {
    constant_time_compare(configured.expose_secret(), presented)
}

/// Extract a cookie value from the `Cookie` header.
fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    let header = parts.headers.get(header::COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("a-very-long-session-secret-for-tests")
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_capability_roundtrip() {
        let token = capability_token(&secret());
        assert!(verify_capability(&secret(), &token));
    }

    #[test]
    fn test_capability_rejects_tampered_token() {
        let mut token = capability_token(&secret());
        token.replace_range(0..1, "g");
        assert!(!verify_capability(&secret(), &token));
    }

    #[test]
    fn test_access_key_check() {
        let configured = SecretString::from("k3y-with-plenty-of-entropy-09#");
        assert!(verify_access_key(&configured, "k3y-with-plenty-of-entropy-09#"));
        assert!(!verify_access_key(&configured, "k3y-with-plenty-of-entropy-09!"));
        assert!(!verify_access_key(&configured, ""));
    }

    #[test]
    fn test_capability_rejects_other_secret() {
        let token = capability_token(&SecretString::from("a-different-32-char-session-secret!"));
        assert!(!verify_capability(&secret(), &token));
    }
}
