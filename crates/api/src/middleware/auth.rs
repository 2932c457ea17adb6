//! Bearer-token identity for wiki writes.
//!
//! Reads are public. Every mutating wiki and page route takes a role
//! extractor from [`super::rbac`], which resolves the caller through
//! [`AuthUser`]. Tokens are minted by the identity service that shares
//! `JWT_SECRET`; this crate only verifies them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use wikitree_core::error::CoreError;
use wikitree_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The editor or contributor behind a write request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Recorded as the owner of uploaded cover attachments.
    pub user_id: DbId,
    /// One of the role names in `wikitree_core::roles`.
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
