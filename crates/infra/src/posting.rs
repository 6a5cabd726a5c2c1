//! The posting engine: journal entry lifecycle orchestration.
//!
//! Pipeline for `post`: authorize → acquire the organization's exclusive
//! lock → re-validate against the current chart → apply balance deltas and
//! append the history record in one atomic store commit → publish the event.
//! The lock is held across re-validation, mutation and the history write, so
//! postings within one organization are serialized; different organizations
//! post concurrently.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use muhasib_auth::permissions::{
    ACCOUNTS_MANAGE, LEDGER_APPROVE, LEDGER_CANCEL, LEDGER_DRAFT, LEDGER_POST,
};
use muhasib_auth::{AuthzError, Permission, Principal, authorize};
use muhasib_core::{AccountId, DomainError, EntryId, OrganizationId};
use muhasib_events::{Event, EventBus, EventEnvelope};
use muhasib_ledger::{
    Account, ChartOfAccounts, EntryApproved, EntryCancelled, EntryPosted, EntryStatus, EntryType,
    JournalEntry, JournalEntryLine, LedgerError, LedgerEvent, PostingDelta, validate_entry,
};

use crate::lock::OrgLocks;
use crate::store::{LedgerStore, PostingRecord, StoreError};

/// Engine operation error.
///
/// Domain rejections pass through verbatim; store failures surface as
/// [`LedgerError::PostingFailed`] (retryable while the entry is draft).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => EngineError::Domain(e),
            StoreError::UnknownEntry(_) | StoreError::UnknownOrganization(_) => {
                EngineError::Domain(DomainError::NotFound)
            }
            other => EngineError::Ledger(LedgerError::posting_failed(other.to_string())),
        }
    }
}

/// Caller-supplied fields for a new draft entry; the engine assigns the
/// identity, the entry number and the timestamps.
#[derive(Debug, Clone)]
pub struct DraftEntry {
    pub organization_id: OrganizationId,
    pub entry_date: chrono::DateTime<Utc>,
    pub description: String,
    pub entry_type: EntryType,
    pub lines: Vec<JournalEntryLine>,
}

/// Posting engine over a store and an event bus.
pub struct PostingEngine<S, B> {
    store: S,
    bus: B,
    locks: OrgLocks,
}

impl<S, B> PostingEngine<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            locks: OrgLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, B> PostingEngine<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Register a new account in the organization's chart.
    pub fn create_account(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        account: Account,
    ) -> Result<AccountId, EngineError> {
        authorize(principal, organization_id, &Permission::new(ACCOUNTS_MANAGE))?;
        Ok(self.store.add_account(organization_id, account)?)
    }

    /// Deactivate an account. Accounts are never deleted; an inactive
    /// account simply stops resolving for new postings.
    pub fn deactivate_account(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        account_id: AccountId,
    ) -> Result<(), EngineError> {
        authorize(principal, organization_id, &Permission::new(ACCOUNTS_MANAGE))?;
        Ok(self
            .store
            .set_account_active(organization_id, account_id, false)?)
    }

    /// Create a draft entry with an allocated entry number.
    pub fn create_draft(
        &self,
        principal: &Principal,
        draft: DraftEntry,
    ) -> Result<JournalEntry, EngineError> {
        authorize(principal, draft.organization_id, &Permission::new(LEDGER_DRAFT))?;

        let entry_number = self.store.next_entry_number(draft.organization_id)?;
        let entry = JournalEntry::draft(
            EntryId::new(),
            draft.organization_id,
            entry_number,
            draft.entry_date,
            draft.description,
            draft.entry_type,
            draft.lines,
            principal.user_id,
            Utc::now(),
        );
        self.store.insert_entry(entry.clone())?;
        tracing::debug!(
            organization_id = %draft.organization_id,
            entry_id = %entry.id(),
            entry_number = entry.entry_number(),
            "journal entry drafted"
        );
        Ok(entry)
    }

    /// Post a draft entry: draft → posted, with balance effects.
    ///
    /// Re-validates inside the organization's exclusive section (balances and
    /// account states may have changed since drafting), applies every line's
    /// signed delta and writes the history record as one atomic commit. A
    /// store failure leaves no partial update — the entry stays draft and the
    /// caller may retry.
    pub fn post(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<PostingRecord, EngineError> {
        authorize(principal, organization_id, &Permission::new(LEDGER_POST))?;

        let lock = self.locks.for_org(organization_id);
        let _guard = lock
            .lock()
            .map_err(|_| LedgerError::posting_failed("organization lock poisoned"))?;

        let mut entry = self.store.entry(organization_id, entry_id)?;
        if entry.status() != EntryStatus::Draft {
            return Err(LedgerError::InvalidStateTransition {
                from: entry.status(),
                to: EntryStatus::Posted,
            }
            .into());
        }

        let chart = self.store.chart(organization_id)?;
        validate_entry(&entry, &chart)?;
        let deltas = deltas_for(&entry, &chart)?;

        entry.mark_posted(Utc::now())?;
        let record = self.store.commit_posting(&entry, &deltas)?;
        tracing::info!(
            organization_id = %organization_id,
            entry_id = %entry_id,
            entry_number = entry.entry_number(),
            sequence = record.sequence,
            "journal entry posted"
        );

        self.publish(
            organization_id,
            LedgerEvent::EntryPosted(EntryPosted {
                organization_id,
                entry_id,
                entry_number: record.entry_number.clone(),
                sequence: record.sequence,
                deltas: record.deltas.clone(),
                posted_by: principal.user_id,
                occurred_at: record.posted_at,
            }),
        );

        Ok(record)
    }

    /// Approve a posted entry: posted → approved.
    pub fn approve(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, EngineError> {
        authorize(principal, organization_id, &Permission::new(LEDGER_APPROVE))?;

        let mut entry = self.store.entry(organization_id, entry_id)?;
        entry.approve(principal.user_id)?;
        self.store.update_entry(&entry)?;

        self.publish(
            organization_id,
            LedgerEvent::EntryApproved(EntryApproved {
                organization_id,
                entry_id,
                approved_by: principal.user_id,
                occurred_at: Utc::now(),
            }),
        );
        Ok(entry)
    }

    /// Cancel a draft entry: draft → cancelled. Never touches balances;
    /// posted entries must be reversed instead.
    pub fn cancel(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, EngineError> {
        authorize(principal, organization_id, &Permission::new(LEDGER_CANCEL))?;

        let mut entry = self.store.entry(organization_id, entry_id)?;
        entry.cancel()?;
        self.store.update_entry(&entry)?;

        self.publish(
            organization_id,
            LedgerEvent::EntryCancelled(EntryCancelled {
                organization_id,
                entry_id,
                cancelled_by: principal.user_id,
                occurred_at: Utc::now(),
            }),
        );
        Ok(entry)
    }

    /// Draft the offsetting entry that reverses a posted/approved entry.
    /// The source entry is never edited; the reversal posts like any draft.
    pub fn reverse(
        &self,
        principal: &Principal,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, EngineError> {
        authorize(principal, organization_id, &Permission::new(LEDGER_DRAFT))?;

        let source = self.store.entry(organization_id, entry_id)?;
        let entry_number = self.store.next_entry_number(organization_id)?;
        let reversal =
            source.reversal(EntryId::new(), entry_number, principal.user_id, Utc::now())?;
        self.store.insert_entry(reversal.clone())?;
        Ok(reversal)
    }

    /// Publish after commit. The history record is already durable, so a bus
    /// failure is logged and swallowed; consumers can rebuild from history.
    fn publish(&self, organization_id: OrganizationId, event: LedgerEvent) {
        let payload = match serde_json::to_value(&event) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize ledger event");
                return;
            }
        };
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            organization_id,
            event.event_type(),
            event.occurred_at(),
            payload,
        );
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(error = ?e, "event publish failed after commit");
        }
    }
}

/// Aggregate each line's signed natural-side delta per account,
/// preserving first-touch order.
fn deltas_for(
    entry: &JournalEntry,
    chart: &ChartOfAccounts,
) -> Result<Vec<PostingDelta>, LedgerError> {
    let mut order: Vec<AccountId> = Vec::new();
    let mut sums: HashMap<AccountId, i64> = HashMap::new();

    for line in entry.lines() {
        let account = chart
            .resolve_active(line.account_id)
            .ok_or(LedgerError::UnknownAccount(line.account_id))?;
        let delta = account.delta_for(line.debit, line.credit);
        if !sums.contains_key(&line.account_id) {
            order.push(line.account_id);
        }
        *sums.entry(line.account_id).or_insert(0) += delta;
    }

    Ok(order
        .into_iter()
        .map(|account_id| PostingDelta {
            account_id,
            delta: sums[&account_id],
        })
        .collect())
}
