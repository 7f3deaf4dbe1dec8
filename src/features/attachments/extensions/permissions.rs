use axum::http::Method;

use crate::features::auth::model::AuthenticatedUser;

/// Access policy for the public attachment endpoints
pub trait AttachmentPermission: Send + Sync {
    fn has_permission(&self, user: Option<&AuthenticatedUser>, method: &Method) -> bool;
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Any authenticated user
pub struct IsAuthenticated;

impl AttachmentPermission for IsAuthenticated {
    fn has_permission(&self, user: Option<&AuthenticatedUser>, _method: &Method) -> bool {
        user.is_some()
    }
}

/// Staff and super admins only
pub struct IsStaff;

impl AttachmentPermission for IsStaff {
    fn has_permission(&self, user: Option<&AuthenticatedUser>, _method: &Method) -> bool {
        user.is_some_and(AuthenticatedUser::is_staff)
    }
}

/// Anonymous reads, authenticated writes
pub struct ReadOnlyOrAuthenticated;

impl AttachmentPermission for ReadOnlyOrAuthenticated {
    fn has_permission(&self, user: Option<&AuthenticatedUser>, method: &Method) -> bool {
        is_safe_method(method) || user.is_some()
    }
}

pub struct AllowAny;

impl AttachmentPermission for AllowAny {
    fn has_permission(&self, _user: Option<&AuthenticatedUser>, _method: &Method) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "u".to_string(),
            name: None,
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!IsAuthenticated.has_permission(None, &Method::GET));
        assert!(IsAuthenticated.has_permission(Some(&user(&[])), &Method::POST));
    }

    #[test]
    fn test_is_staff() {
        assert!(!IsStaff.has_permission(None, &Method::GET));
        assert!(!IsStaff.has_permission(Some(&user(&[])), &Method::GET));
        assert!(IsStaff.has_permission(Some(&user(&["staff"])), &Method::DELETE));
    }

    #[test]
    fn test_read_only_or_authenticated() {
        let policy = ReadOnlyOrAuthenticated;
        assert!(policy.has_permission(None, &Method::GET));
        assert!(policy.has_permission(None, &Method::HEAD));
        assert!(!policy.has_permission(None, &Method::POST));
        assert!(policy.has_permission(Some(&user(&[])), &Method::POST));
    }

    #[test]
    fn test_allow_any() {
        assert!(AllowAny.has_permission(None, &Method::DELETE));
    }
}
