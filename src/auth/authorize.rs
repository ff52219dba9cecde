//! Role and scope authorization.

use crate::pipeline::context::Principal;

/// Role that bypasses every role/scope requirement.
pub const OVERRIDE_ROLE: &str = "admin";

/// Grant access when the principal's role or any of its scopes
/// intersects the required set. An empty required set means
/// authentication alone suffices.
pub fn is_authorized(principal: &Principal, required: &[String]) -> bool {
    if required.is_empty() {
        return true;
    }
    if principal.role == OVERRIDE_ROLE {
        return true;
    }
    required
        .iter()
        .any(|needed| *needed == principal.role || principal.scopes.contains(needed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: &str, scopes: &[&str]) -> Principal {
        Principal {
            id: "p1".into(),
            email: "p1@example.com".into(),
            role: role.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn empty_requirement_always_grants() {
        assert!(is_authorized(&principal("user", &[]), &[]));
    }

    #[test]
    fn role_match_grants() {
        let required = vec!["moderator".to_string()];
        assert!(is_authorized(&principal("moderator", &[]), &required));
        assert!(!is_authorized(&principal("user", &[]), &required));
    }

    #[test]
    fn scope_intersection_grants() {
        let required = vec!["trust:write".to_string()];
        assert!(is_authorized(
            &principal("user", &["trust:write", "agents:read"]),
            &required
        ));
        assert!(!is_authorized(&principal("user", &["agents:read"]), &required));
    }

    #[test]
    fn admin_overrides_everything() {
        let required = vec!["owner".to_string(), "trust:admin".to_string()];
        assert!(is_authorized(&principal("admin", &[]), &required));
    }
}
