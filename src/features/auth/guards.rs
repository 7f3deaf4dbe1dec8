//! Role-based authorization guards.
//!
//! Admin endpoints require the "staff" role; "super_admin" includes it.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for checking if user has staff level access.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireStaff(user): RequireStaff) { ... }
/// ```
pub struct RequireStaff(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_staff() {
            return Err(AppError::Forbidden("Staff access required".to_string()));
        }

        Ok(RequireStaff(user.clone()))
    }
}

/// Optional user for endpoints whose access is decided by a permission policy
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}
