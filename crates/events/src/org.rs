use muhasib_core::OrganizationId;

use crate::EventEnvelope;

/// Helper trait for organization-scoped messages.
///
/// Marks types that carry an organization ID, enabling tenant-aware
/// processing in infrastructure components (workers, consumers) — e.g.
/// filtering a subscription down to one organization.
pub trait OrgScoped {
    fn organization_id(&self) -> OrganizationId;
}

impl<E> OrgScoped for EventEnvelope<E> {
    fn organization_id(&self) -> OrganizationId {
        self.organization_id()
    }
}
