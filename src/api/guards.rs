use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, UserRole};
use crate::core::state::AppState;

/// Roles allowed to create, update or delete items.
pub(crate) const ITEM_WRITE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::User];

/// Identity resolved from a verified bearer token. Identity management lives
/// outside this service; the claims are the whole picture.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser {
    pub(crate) id: String,
    pub(crate) role: UserRole,
}

pub(crate) struct CurrentUser(pub(crate) AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentUser(AuthUser { id: claims.sub, role: claims.role }))
    }
}

pub(crate) fn require_role(user: &AuthUser, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_role_accepts_listed_roles() {
        let admin = AuthUser { id: "a".to_string(), role: UserRole::Admin };
        let user = AuthUser { id: "u".to_string(), role: UserRole::User };
        assert!(require_role(&admin, ITEM_WRITE_ROLES).is_ok());
        assert!(require_role(&user, ITEM_WRITE_ROLES).is_ok());
    }

    #[test]
    fn require_role_rejects_guest() {
        let guest = AuthUser { id: "g".to_string(), role: UserRole::Guest };
        assert!(require_role(&guest, ITEM_WRITE_ROLES).is_err());
    }
}
