//! Request tracing middleware
//!
//! One completion line per request, tagged with the SSO step it belongs to
//! and, for failures, the error code sent to the client.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::error::ErrorCode;

/// SSO step a request path belongs to
fn endpoint_for(path: &str) -> &'static str {
    match path {
        "/auth/challenge" => "challenge",
        "/auth/login" => "login",
        "/auth/refresh" => "refresh",
        "/auth/verify" => "verify",
        "/user/profile" => "profile",
        "/.well-known/openid-configuration" => "discovery",
        "/health" => "health",
        _ => "unmatched",
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`
fn forwarded_client(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(|s| s.trim().to_string())
}

/// Middleware for logging request information with timing
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let endpoint = endpoint_for(request.uri().path());
    let client_ip = forwarded_client(&request);
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let code = response.extensions().get::<ErrorCode>().map(|c| c.0);

    if response.status().is_server_error() {
        tracing::error!(%method, endpoint, ?client_ip, status, ?code, duration_ms, "SSO request failed");
    } else if endpoint == "login" && code.is_some() {
        tracing::warn!(%method, endpoint, ?client_ip, status, ?code, duration_ms, "Login rejected");
    } else if code.is_some() {
        tracing::info!(%method, endpoint, ?client_ip, status, ?code, duration_ms, "SSO request rejected");
    } else {
        tracing::debug!(%method, endpoint, ?client_ip, status, duration_ms, "SSO request completed");
    }

    response
}
