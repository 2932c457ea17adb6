//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects callers whose role is less
//! privileged than required, per [`wikitree_core::roles::is_forbidden`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use wikitree_core::error::CoreError;
use wikitree_core::roles::{is_forbidden, ROLE_CONTRIBUTOR, ROLE_EDITOR};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    required: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if is_forbidden(&user.role, required) {
        tracing::debug!(user_id = %user.user_id, role = %user.role, required, "Role check failed");
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Role '{required}' or higher required"
        ))));
    }
    Ok(user)
}

/// Requires `editor` or `admin`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn delete_wiki(RequireEditor(user): RequireEditor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireEditor(pub AuthUser);

impl FromRequestParts<AppState> for RequireEditor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, ROLE_EDITOR)
            .await
            .map(RequireEditor)
    }
}

/// Requires `contributor` or any more privileged role.
pub struct RequireContributor(pub AuthUser);

impl FromRequestParts<AppState> for RequireContributor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, ROLE_CONTRIBUTOR)
            .await
            .map(RequireContributor)
    }
}
