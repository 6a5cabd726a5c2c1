use std::collections::HashSet;

use thiserror::Error;

use muhasib_core::OrganizationId;

use crate::{Permission, Principal, default_role_permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The principal is acting outside its own organization.
    #[error("organization mismatch")]
    OrganizationMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for an operation against an organization's ledger.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// The effective permission set is the union of role-derived permissions
/// (via [`default_role_permissions`]) and explicit grants on the principal.
pub fn authorize(
    principal: &Principal,
    organization_id: OrganizationId,
    required: &Permission,
) -> Result<(), AuthzError> {
    if principal.organization_id != organization_id {
        return Err(AuthzError::OrganizationMismatch);
    }

    let mut perms: HashSet<String> = principal
        .permissions
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();
    for role in &principal.roles {
        for p in default_role_permissions(role.as_str()) {
            perms.insert(p.as_str().to_string());
        }
    }

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
