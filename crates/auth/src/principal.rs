use serde::{Deserialize, Serialize};

use muhasib_core::{OrganizationId, UserId};

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the upstream
/// identity service supplies (user, role, organization) for every request,
/// and callers may attach explicit per-user permission grants on top of
/// role-derived ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(user_id: UserId, organization_id: OrganizationId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            organization_id,
            roles,
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }
}
