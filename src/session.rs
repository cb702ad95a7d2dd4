//! # Session bootstrap
//!
//! The storefront never talks to the commerce backend directly; on first
//! load it asks this service for a session. An existing session cookie is
//! reused only when the client-IP cookie still matches the caller, which
//! catches a session leaking across origins. Otherwise the fixed credential
//! pair is exchanged for a fresh token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::State as AppState;

pub const SESSION_COOKIE: &str = "session";
pub const CLIENT_IP_COOKIE: &str = "ClientIP";

/// Session token for an authenticated route, from the session cookie.
pub fn session_token(jar: &CookieJar) -> Result<String, AppError> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)
}

pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string()
}

fn secure_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

pub async fn check_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers);
    let session = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let old_ip = jar.get(CLIENT_IP_COOKIE).map(|c| c.value().to_string());

    if let Some(token) = session {
        if old_ip.as_deref() == Some(ip.as_str()) {
            let jar = jar.add(secure_cookie(CLIENT_IP_COOKIE, ip.clone()));
            let body = json!({
                "sessionData": { "success": "true", "api_token": token },
                "clientIP": ip,
            });
            return Ok((jar, Json(body)).into_response());
        }
    }

    match state.commerce.login().await {
        Ok(token) => {
            info!("commerce session established");
            let body = json!({
                "sessionData": { "success": "true", "api_token": token },
                "clientIP": ip,
            });
            let jar = jar
                .add(secure_cookie(SESSION_COOKIE, token))
                .add(secure_cookie(CLIENT_IP_COOKIE, ip));
            Ok((jar, Json(body)).into_response())
        }
        Err(error) => {
            warn!("session bootstrap failed: {error}");
            let jar = jar
                .remove(removal_cookie(SESSION_COOKIE))
                .remove(removal_cookie(CLIENT_IP_COOKIE));
            Ok((StatusCode::FORBIDDEN, jar, Json(json!({ "expired": true }))).into_response())
        }
    }
}
