use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;
use crate::permissions;

/// Role identifier used for RBAC.
///
/// Roles are intentionally opaque strings at this layer; mapping roles to
/// permissions is done by the policy table below (or a caller-supplied one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default role → permission policy.
///
/// Unknown roles grant nothing.
pub fn default_role_permissions(role: &str) -> Vec<Permission> {
    match role {
        "admin" => vec![Permission::new("*")],
        "accountant" => vec![
            Permission::new(permissions::LEDGER_DRAFT),
            Permission::new(permissions::LEDGER_POST),
            Permission::new(permissions::LEDGER_CANCEL),
            Permission::new(permissions::ACCOUNTS_MANAGE),
            Permission::new(permissions::REPORTS_READ),
        ],
        "manager" => vec![
            Permission::new(permissions::LEDGER_APPROVE),
            Permission::new(permissions::REPORTS_READ),
        ],
        "employee" => vec![Permission::new(permissions::LEDGER_DRAFT)],
        "viewer" => vec![Permission::new(permissions::REPORTS_READ)],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gets_wildcard() {
        let perms = default_role_permissions("admin");
        assert!(perms.iter().any(|p| p.is_wildcard()));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(default_role_permissions("intern").is_empty());
    }
}
