//! User-related API handlers

use axum::Json;

use super::AuthenticatedUser;
use crate::models::ProfileResponse;

/// GET /user/profile - Full profile of the authenticated user
pub async fn get_profile(AuthenticatedUser(user): AuthenticatedUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: user.into() })
}
