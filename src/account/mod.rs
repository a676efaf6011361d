/// Account management system
///
/// Handles user registration, login, token issuance and the soft
/// deactivation of users.

mod manager;
pub mod roles;

pub use manager::AccountManager;
pub use roles::Role;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// User together with a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct UserWithToken {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, message = "name must be longer than or equal to 2 characters"))]
    pub name: String,
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be longer than or equal to 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be longer than or equal to 6 characters"))]
    pub password: String,
}

/// Partial user update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, message = "name must be longer than or equal to 2 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be an email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be longer than or equal to 6 characters"))]
    pub password: Option<String>,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string
    pub uid: String,
    pub iat: i64,
    pub exp: i64,
}
