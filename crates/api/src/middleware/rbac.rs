//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kct_core::error::CoreError;

use super::auth::AuthUser;
use crate::auth::jwt::{ROLE_ADMIN, ROLE_SERVICE};
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` or `service_role` role. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl RequireAdmin {
    /// Identifier recorded in audit columns such as `changed_by`.
    pub fn actor(&self) -> String {
        match &self.0.email {
            Some(email) => email.clone(),
            None => format!("{}:{}", self.0.role, self.0.user_id),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_SERVICE {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
