use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use muhasib_core::{AccountId, DomainError, EntryId, OrganizationId};
use muhasib_ledger::{Account, ChartOfAccounts, EntryStatus, JournalEntry, PostingDelta};

use super::{LedgerStore, PostingRecord, ResultingBalance, StoreError};

#[derive(Debug)]
struct OrgLedger {
    chart: ChartOfAccounts,
    entries: HashMap<EntryId, JournalEntry>,
    history: Vec<PostingRecord>,
    entry_counter: u64,
}

impl OrgLedger {
    fn new(organization_id: OrganizationId) -> Self {
        Self {
            chart: ChartOfAccounts::new(organization_id),
            entries: HashMap::new(),
            history: Vec::new(),
            entry_counter: 0,
        }
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. One `RwLock` over all organizations keeps the
/// commit section trivially atomic: readers see pre- or post-commit state,
/// never a partial update.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    orgs: RwLock<HashMap<OrganizationId, OrgLedger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<OrganizationId, OrgLedger>>, StoreError> {
        self.orgs
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<OrganizationId, OrgLedger>>, StoreError> {
        self.orgs
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn init_organization(&self, organization_id: OrganizationId) -> Result<(), StoreError> {
        let mut orgs = self.write()?;
        orgs.entry(organization_id)
            .or_insert_with(|| OrgLedger::new(organization_id));
        Ok(())
    }

    fn chart(&self, organization_id: OrganizationId) -> Result<ChartOfAccounts, StoreError> {
        let orgs = self.read()?;
        let org = orgs
            .get(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        Ok(org.chart.clone())
    }

    fn add_account(
        &self,
        organization_id: OrganizationId,
        account: Account,
    ) -> Result<AccountId, StoreError> {
        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        Ok(org.chart.add_account(account)?)
    }

    fn set_account_active(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
        active: bool,
    ) -> Result<(), StoreError> {
        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        org.chart
            .set_active(account_id, active)
            .map_err(|_| StoreError::UnknownAccount(account_id))
    }

    fn next_entry_number(&self, organization_id: OrganizationId) -> Result<String, StoreError> {
        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        org.entry_counter += 1;
        Ok(format!("JE-{:06}", org.entry_counter))
    }

    fn insert_entry(&self, entry: JournalEntry) -> Result<(), StoreError> {
        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&entry.organization_id())
            .ok_or(StoreError::UnknownOrganization(entry.organization_id()))?;
        if org.entries.contains_key(&entry.id()) {
            return Err(StoreError::Domain(DomainError::conflict(format!(
                "entry {} already exists",
                entry.id()
            ))));
        }
        org.entries.insert(entry.id(), entry);
        Ok(())
    }

    fn entry(
        &self,
        organization_id: OrganizationId,
        entry_id: EntryId,
    ) -> Result<JournalEntry, StoreError> {
        let orgs = self.read()?;
        let org = orgs
            .get(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        org.entries
            .get(&entry_id)
            .cloned()
            .ok_or(StoreError::UnknownEntry(entry_id))
    }

    fn update_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&entry.organization_id())
            .ok_or(StoreError::UnknownOrganization(entry.organization_id()))?;
        if !org.entries.contains_key(&entry.id()) {
            return Err(StoreError::UnknownEntry(entry.id()));
        }
        org.entries.insert(entry.id(), entry.clone());
        Ok(())
    }

    fn entries(&self, organization_id: OrganizationId) -> Result<Vec<JournalEntry>, StoreError> {
        let orgs = self.read()?;
        let org = orgs
            .get(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        let mut out: Vec<JournalEntry> = org.entries.values().cloned().collect();
        out.sort_by(|a, b| a.entry_number().cmp(b.entry_number()));
        Ok(out)
    }

    fn commit_posting(
        &self,
        entry: &JournalEntry,
        deltas: &[PostingDelta],
    ) -> Result<PostingRecord, StoreError> {
        let posted_at = match (entry.status(), entry.posted_at()) {
            (EntryStatus::Posted, Some(at)) => at,
            _ => {
                return Err(StoreError::Domain(DomainError::invariant(
                    "commit requires a posted entry",
                )));
            }
        };

        let mut orgs = self.write()?;
        let org = orgs
            .get_mut(&entry.organization_id())
            .ok_or(StoreError::UnknownOrganization(entry.organization_id()))?;
        if !org.entries.contains_key(&entry.id()) {
            return Err(StoreError::UnknownEntry(entry.id()));
        }

        // All accounts are checked before any balance moves (all-or-nothing).
        for d in deltas {
            if org.chart.get(d.account_id).is_none() {
                return Err(StoreError::UnknownAccount(d.account_id));
            }
        }

        let mut resulting = Vec::with_capacity(deltas.len());
        for d in deltas {
            org.chart
                .apply_delta(d.account_id, d.delta)
                .map_err(|_| StoreError::UnknownAccount(d.account_id))?;
            if let Some(account) = org.chart.get(d.account_id) {
                resulting.push(ResultingBalance {
                    account_id: d.account_id,
                    balance: account.balance,
                });
            }
        }

        let record = PostingRecord {
            record_id: Uuid::now_v7(),
            organization_id: entry.organization_id(),
            entry_id: entry.id(),
            entry_number: entry.entry_number().to_string(),
            sequence: org.history.len() as u64 + 1,
            posted_by: entry.created_by(),
            posted_at,
            deltas: deltas.to_vec(),
            resulting_balances: resulting,
        };

        org.entries.insert(entry.id(), entry.clone());
        org.history.push(record.clone());
        Ok(record)
    }

    fn history(&self, organization_id: OrganizationId) -> Result<Vec<PostingRecord>, StoreError> {
        let orgs = self.read()?;
        let org = orgs
            .get(&organization_id)
            .ok_or(StoreError::UnknownOrganization(organization_id))?;
        Ok(org.history.clone())
    }
}
