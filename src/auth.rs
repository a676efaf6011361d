/// Authentication extractors and role checks
use crate::{
    account::{Role, User},
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::{VaultError, VaultResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated user - extracts and validates the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = VaultError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| VaultError::Authentication("Missing authorization header".to_string()))?;

        let user = state.account_manager.authenticate(&token).await?;

        Ok(AuthUser(user))
    }
}

/// Role membership check applied after authentication
pub struct RoleGuard;

impl RoleGuard {
    /// Allow when `allowed` is empty or the user holds any of the listed roles
    pub fn check(user: &User, allowed: &[Role]) -> VaultResult<()> {
        if allowed.is_empty() || user.roles.iter().any(|role| allowed.contains(role)) {
            return Ok(());
        }

        let wanted = allowed.iter().map(Role::as_str).collect::<Vec<_>>().join(",");
        tracing::debug!("User {} rejected, needs one of [{}]", user.id, wanted);

        Err(VaultError::Authorization(format!(
            "User {} does not have one valid role [{}]",
            user.name, wanted
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with(roles: Vec<Role>) -> User {
        User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            roles,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_role_list_allows() {
        assert!(RoleGuard::check(&user_with(vec![Role::User]), &[]).is_ok());
    }

    #[test]
    fn test_any_listed_role_allows() {
        let user = user_with(vec![Role::User, Role::Admin]);
        assert!(RoleGuard::check(&user, &[Role::SuperAdmin, Role::Admin]).is_ok());
    }

    #[test]
    fn test_missing_role_is_forbidden() {
        let err = RoleGuard::check(&user_with(vec![Role::User]), &[Role::Admin, Role::SuperAdmin])
            .unwrap_err();

        assert!(matches!(err, VaultError::Authorization(_)));
        assert!(err
            .to_string()
            .contains("User Ana does not have one valid role [ADMIN,SUPER_ADMIN]"));
    }

    #[test]
    fn test_roles_are_not_hierarchical() {
        let user = user_with(vec![Role::SuperAdmin]);
        assert!(RoleGuard::check(&user, &[Role::Admin]).is_err());
    }
}
