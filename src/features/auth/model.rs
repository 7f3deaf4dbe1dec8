use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_STAFF, ROLE_SUPER_ADMIN};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Display name, used for `uploaded_by` in the flat projection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }

    /// Staff access is granted to staff members and super admins
    pub fn is_staff(&self) -> bool {
        self.is_super_admin() || self.has_role(ROLE_STAFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str], name: Option<&str>) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user-1".to_string(),
            name: name.map(|n| n.to_string()),
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_staff_access() {
        assert!(user(&["staff"], None).is_staff());
        assert!(user(&["super_admin"], None).is_staff());
        assert!(!user(&["viewer"], None).is_staff());
        assert!(!user(&[], None).is_super_admin());
    }
}
