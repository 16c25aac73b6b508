//! HTTP Basic Authentication for admin routes, and player identity extraction

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::BoardError;
use crate::types::PlayerId;

/// Header carrying the authenticated player's identity, set by the auth proxy
pub const PLAYER_HEADER: &str = "x-player-id";

/// Admin credentials, held as SHA-256 digests so every comparison runs over
/// the same 32 bytes whatever the submitted lengths
#[derive(Clone)]
struct AdminCredentials {
    username: [u8; 32],
    password: [u8; 32],
}

/// Authentication configuration for the admin routes
#[derive(Clone, Default)]
pub struct AdminAuthConfig {
    /// None = auth disabled
    credentials: Option<AdminCredentials>,
}

impl std::fmt::Debug for AdminAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthConfig")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AdminAuthConfig {
    /// Admin routes open to everyone
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_credentials(username: &str, password: &str) -> Self {
        Self {
            credentials: Some(AdminCredentials {
                username: digest(username),
                password: digest(password),
            }),
        }
    }

    /// ADMIN_USERNAME and ADMIN_PASSWORD must both be non-empty to enable auth
    pub fn from_env() -> Self {
        let username = env_credential("ADMIN_USERNAME");
        let password = env_credential("ADMIN_PASSWORD");

        match (username, password) {
            (Some(username), Some(password)) => {
                tracing::info!("Admin authentication enabled");
                Self::with_credentials(&username, &password)
            }
            (username, password) => {
                if username.is_some() || password.is_some() {
                    tracing::warn!(
                        "ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable authentication"
                    );
                }
                tracing::warn!("Admin authentication DISABLED - anyone can reshuffle or import state!");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Always true when auth is disabled
    pub fn validate(&self, username: &str, password: &str) -> bool {
        let Some(expected) = &self.credentials else {
            return true;
        };
        // Both halves are always compared
        let user_ok = digests_match(&expected.username, &digest(username));
        let pass_ok = digests_match(&expected.password, &digest(password));
        user_ok & pass_ok
    }
}

fn env_credential(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Pull `user:password` out of a `Basic` Authorization header value
fn basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Middleware for HTTP Basic Authentication on admin routes
pub async fn admin_auth_middleware(
    State(auth_config): State<Arc<AdminAuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth_config.is_enabled() {
        return next.run(request).await;
    }

    let credentials = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(basic_credentials);

    if let Some((username, password)) = credentials {
        if auth_config.validate(&username, &password) {
            return next.run(request).await;
        }
        tracing::warn!(username = %username, "Rejected admin credentials");
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Trivia Admin\"")],
        "Unauthorized",
    )
        .into_response()
}

/// The calling player, as asserted by the upstream auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player(pub PlayerId);

impl<S: Send + Sync> FromRequestParts<S> for Player {
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PLAYER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Player(value.to_string()))
            .ok_or_else(|| BoardError::Unauthorized("missing player identity".to_string()))
    }
}
