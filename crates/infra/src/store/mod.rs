//! Ledger persistence boundary.
//!
//! The `LedgerStore` trait is what the posting engine requires of durable
//! storage: chart snapshots, entry storage, and an **atomic** posting commit
//! (balances + history + entry status move together or not at all). The
//! in-memory implementation backs tests/dev; SQL backends live outside this
//! repository behind the same trait.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use muhasib_core::{AccountId, DomainError, EntryId, OrganizationId, UserId};
use muhasib_ledger::{Account, ChartOfAccounts, JournalEntry, PostingDelta};

mod in_memory;

pub use in_memory::InMemoryLedgerStore;

/// Balance of one account immediately after a posting was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultingBalance {
    pub account_id: AccountId,
    pub balance: i64,
}

/// Immutable record of one posting, appended to per-organization history.
///
/// Sequence numbers are assigned by the store, start at 1 and increase
/// monotonically per organization. Records are never modified or removed;
/// the balance projector replays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRecord {
    pub record_id: Uuid,
    pub organization_id: OrganizationId,
    pub entry_id: EntryId,
    pub entry_number: String,

    /// Monotonically increasing position in the organization's history.
    pub sequence: u64,

    pub posted_by: UserId,
    pub posted_at: DateTime<Utc>,

    /// Signed natural-side delta per affected account.
    pub deltas: Vec<PostingDelta>,
    /// Account balances immediately after this posting.
    pub resulting_balances: Vec<ResultingBalance>,
}

/// Ledger store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown organization {0}")]
    UnknownOrganization(OrganizationId),

    #[error("unknown account {0}")]
    UnknownAccount(AccountId),

    #[error("unknown entry {0}")]
    UnknownEntry(EntryId),

    /// Deterministic domain rejection (e.g. duplicate account code).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Backend failure (lock poisoning, IO, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Organization-scoped ledger storage.
///
/// Implementations must:
/// - isolate organizations from each other on every operation
/// - make `commit_posting` atomic: either every balance delta, the entry
///   status change and the history record are applied, or none are
/// - assign history sequence numbers monotonically with no gaps
/// - let readers observe only pre- or post-commit state, never a partial one
pub trait LedgerStore: Send + Sync {
    /// Register an organization's (initially empty) ledger. Idempotent.
    fn init_organization(&self, organization_id: OrganizationId) -> Result<(), StoreError>;

    /// Snapshot of the organization's chart of accounts.
    fn chart(&self, organization_id: OrganizationId) -> Result<ChartOfAccounts, StoreError>;

    fn add_account(
        &self,
        organization_id: OrganizationId,
        account: Account,
    ) -> Result<AccountId, StoreError>;

    fn set_account_active(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
        active: bool,
    ) -> Result<(), StoreError>;

    /// Allocate the next human-facing entry number (e.g. "JE-000042").
    fn next_entry_number(&self, organization_id: OrganizationId) -> Result<String, StoreError>;

    fn insert_entry(&self, entry: JournalEntry) -> Result<(), StoreError>;

    fn entry(
        &self,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, StoreError>;

    /// Replace a stored entry (status transitions on draft/posted entries).
    fn update_entry(&self, entry: &JournalEntry) -> Result<(), StoreError>;

    fn entries(&self, organization_id: OrganizationId) -> Result<Vec<JournalEntry>, StoreError>;

    /// Atomic read-modify-write for a posting: apply every delta to its
    /// account, persist the (already `posted`) entry, append the history
    /// record, and return it with its assigned sequence number.
    fn commit_posting(
        &self,
        entry: &JournalEntry,
        deltas: &[PostingDelta],
    ) -> Result<PostingRecord, StoreError>;

    /// Full posting history for an organization, in sequence order.
    fn history(&self, organization_id: OrganizationId) -> Result<Vec<PostingRecord>, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn init_organization(&self, organization_id: OrganizationId) -> Result<(), StoreError> {
        (**self).init_organization(organization_id)
    }

    fn chart(&self, organization_id: OrganizationId) -> Result<ChartOfAccounts, StoreError> {
        (**self).chart(organization_id)
    }

    fn add_account(
        &self,
        organization_id: OrganizationId,
        account: Account,
    ) -> Result<AccountId, StoreError> {
        (**self).add_account(organization_id, account)
    }

    fn set_account_active(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
        active: bool,
    ) -> Result<(), StoreError> {
        (**self).set_account_active(organization_id, account_id, active)
    }

    fn next_entry_number(&self, organization_id: OrganizationId) -> Result<String, StoreError> {
        (**self).next_entry_number(organization_id)
    }

    fn insert_entry(&self, entry: JournalEntry) -> Result<(), StoreError> {
        (**self).insert_entry(entry)
    }

    fn entry(
        &self,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, StoreError> {
        (**self).entry(organization_id, entry_id)
    }

    fn update_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        (**self).update_entry(entry)
    }

    fn entries(&self, organization_id: OrganizationId) -> Result<Vec<JournalEntry>, StoreError> {
        (**self).entries(organization_id)
    }

    fn commit_posting(
        &self,
        entry: &JournalEntry,
        deltas: &[PostingDelta],
    ) -> Result<PostingRecord, StoreError> {
        (**self).commit_posting(entry, deltas)
    }

    fn history(&self, organization_id: OrganizationId) -> Result<Vec<PostingRecord>, StoreError> {
        (**self).history(organization_id)
    }
}
