/// User roles
use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};

/// Roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> VaultResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(VaultError::InvalidInput(format!("Invalid role: {}", s))),
        }
    }

    /// Decode the comma-separated column form
    pub fn parse_list(s: &str) -> VaultResult<Vec<Self>> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Role::parse)
            .collect()
    }

    /// Encode into the comma-separated column form
    pub fn join(roles: &[Role]) -> String {
        roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("SUPER_ADMIN").unwrap(), Role::SuperAdmin);
        assert_eq!(Role::parse(" user ").unwrap(), Role::User);
        assert!(Role::parse("root").is_err());
    }

    #[test]
    fn test_role_list_column() {
        let roles = Role::parse_list("USER,ADMIN").unwrap();
        assert_eq!(roles, vec![Role::User, Role::Admin]);
        assert_eq!(Role::join(&roles), "USER,ADMIN");
        assert!(Role::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
    }
}
