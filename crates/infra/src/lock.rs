//! Per-organization posting locks.
//!
//! One ledger per organization means postings within an organization are
//! serialized while different organizations post concurrently. The registry
//! hands out one keyed mutex per organization id — there is no global lock
//! shared across tenants.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use muhasib_core::OrganizationId;

/// Keyed mutex registry: one lock handle per organization.
///
/// Handles are created lazily on first use and live for the registry's
/// lifetime; the registry itself is only locked long enough to look up or
/// insert a handle, never across a posting.
#[derive(Debug, Default)]
pub struct OrgLocks {
    inner: Mutex<HashMap<OrganizationId, Arc<Mutex<()>>>>,
}

impl OrgLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for one organization's exclusive posting section.
    pub fn for_org(&self, organization_id: OrganizationId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(organization_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_organization_shares_one_lock() {
        let locks = OrgLocks::new();
        let org = OrganizationId::new();

        let a = locks.for_org(org);
        let b = locks.for_org(org);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_organizations_do_not_contend() {
        let locks = OrgLocks::new();
        let a = locks.for_org(OrganizationId::new());
        let b = locks.for_org(OrganizationId::new());
        assert!(!Arc::ptr_eq(&a, &b));

        // Holding one organization's lock leaves the other free.
        let _guard = a.lock().unwrap();
        assert!(b.try_lock().is_ok());
    }
}
