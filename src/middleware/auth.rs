//! Authentication middleware
//!
//! Bearer-token extraction and resolution to a registered user.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ErrorCode;
use crate::models::User;

/// User resolved from a valid access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[derive(Debug, Serialize)]
struct Rejection {
    error: RejectionDetails,
}

#[derive(Debug, Serialize)]
struct RejectionDetails {
    code: &'static str,
    message: &'static str,
}

fn reject(code: &'static str, message: &'static str) -> Response {
    let body = Rejection {
        error: RejectionDetails { code, message },
    };
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    response.extensions_mut().insert(ErrorCode(code));
    response
}

/// Extractor for authenticated users
///
/// Verifies the access token from the `Authorization` header and loads the
/// user it names. A token whose user is no longer registered is rejected the
/// same way as an invalid one.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    reject(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        match auth_service.verify_token(bearer.token()).await {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                tracing::debug!("Bearer token rejected");
                Err(reject("INVALID_TOKEN", "Invalid or expired token"))
            }
        }
    }
}
