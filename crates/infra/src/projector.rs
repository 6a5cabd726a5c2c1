//! Balance projection over posted-entry history.
//!
//! Two query paths that must agree:
//! - **Incremental**: a running balance cache fed by posted-entry events,
//!   guarded by a per-organization cursor on the posting sequence
//!   (duplicates are skipped, gaps rejected — consumers may see
//!   at-least-once delivery).
//! - **Full recompute**: opening balance plus every history delta with
//!   `posted_at` at or before the requested time.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use muhasib_core::{AccountId, OrganizationId};
use muhasib_events::EventEnvelope;
use muhasib_ledger::{AccountType, EntryPosted, LedgerEvent, NormalSide, PostingDelta};

use crate::store::{LedgerStore, PostingRecord, StoreError};

#[derive(Debug, Error)]
pub enum ProjectorError {
    #[error("failed to deserialize ledger event: {0}")]
    Deserialize(String),

    #[error("event organization does not match envelope organization")]
    OrganizationMismatch,

    #[error("non-monotonic posting sequence (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("unknown account {0}")]
    UnknownAccount(AccountId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One row of a trial balance: the account's as-of balance placed on its
/// debit or credit column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: i64,
    pub credit: i64,
}

/// Trial balance data as of a point in time. Totals always match for a
/// ledger built from balanced entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialBalance {
    pub organization_id: OrganizationId,
    pub as_of: DateTime<Utc>,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: i128,
    pub total_credit: i128,
}

/// Read-side balance projection. Holds only read access to the store;
/// the posting engine is the sole writer.
#[derive(Debug)]
pub struct BalanceProjector<S> {
    store: S,
    /// Running sum of posted deltas per account (opening balance excluded).
    deltas: RwLock<HashMap<(OrganizationId, AccountId), i64>>,
    /// Last applied posting sequence per organization.
    cursors: RwLock<HashMap<OrganizationId, u64>>,
}

impl<S> BalanceProjector<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            deltas: RwLock::new(HashMap::new()),
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn cursor(&self, organization_id: OrganizationId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&organization_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn apply(
        &self,
        organization_id: OrganizationId,
        sequence: u64,
        deltas: &[PostingDelta],
    ) -> Result<(), ProjectorError> {
        let last = self.cursor(organization_id);

        if sequence == 0 {
            return Err(ProjectorError::NonMonotonicSequence { last, found: sequence });
        }
        if sequence <= last {
            // Duplicate delivery; already applied.
            return Ok(());
        }
        if sequence != last + 1 && last != 0 {
            return Err(ProjectorError::NonMonotonicSequence { last, found: sequence });
        }

        if let Ok(mut sums) = self.deltas.write() {
            for d in deltas {
                *sums.entry((organization_id, d.account_id)).or_insert(0) += d.delta;
            }
        }
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(organization_id, sequence);
        }
        Ok(())
    }

    /// Incrementally apply a posted-entry event.
    pub fn apply_posted(&self, event: &EntryPosted) -> Result<(), ProjectorError> {
        self.apply(event.organization_id, event.sequence, &event.deltas)
    }

    /// Incrementally apply a history record (rebuild path).
    pub fn apply_record(&self, record: &PostingRecord) -> Result<(), ProjectorError> {
        self.apply(record.organization_id, record.sequence, &record.deltas)
    }

    /// Apply a bus envelope. Only posted-entry events move balances;
    /// approval/cancellation events are acknowledged without effect.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectorError> {
        let event: LedgerEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectorError::Deserialize(e.to_string()))?;

        match event {
            LedgerEvent::EntryPosted(posted) => {
                if posted.organization_id != envelope.organization_id() {
                    return Err(ProjectorError::OrganizationMismatch);
                }
                self.apply_posted(&posted)
            }
            LedgerEvent::EntryApproved(_) | LedgerEvent::EntryCancelled(_) => Ok(()),
        }
    }

    /// Drop and replay an organization's projection from its full history.
    pub fn rebuild_from_history(
        &self,
        organization_id: OrganizationId,
    ) -> Result<(), ProjectorError> {
        if let Ok(mut sums) = self.deltas.write() {
            sums.retain(|(org, _), _| *org != organization_id);
        }
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.remove(&organization_id);
        }

        for record in self.store.history(organization_id)? {
            self.apply_record(&record)?;
        }
        Ok(())
    }

    /// Incremental path: opening balance plus the running delta sum.
    pub fn current_balance(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
    ) -> Result<i64, ProjectorError> {
        let chart = self.store.chart(organization_id)?;
        let account = chart
            .get(account_id)
            .ok_or(ProjectorError::UnknownAccount(account_id))?;
        let sum = match self.deltas.read() {
            Ok(sums) => *sums.get(&(organization_id, account_id)).unwrap_or(&0),
            Err(_) => 0,
        };
        Ok(account.opening_balance + sum)
    }

    /// Full-recompute path: replay history up to and including `as_of`.
    pub fn balance_as_of(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
        as_of: DateTime<Utc>,
    ) -> Result<i64, ProjectorError> {
        let chart = self.store.chart(organization_id)?;
        let account = chart
            .get(account_id)
            .ok_or(ProjectorError::UnknownAccount(account_id))?;

        let sum: i64 = self
            .store
            .history(organization_id)?
            .iter()
            .filter(|r| r.posted_at <= as_of)
            .flat_map(|r| r.deltas.iter())
            .filter(|d| d.account_id == account_id)
            .map(|d| d.delta)
            .sum();
        Ok(account.opening_balance + sum)
    }

    /// Trial balance data as of a point in time (no formatting).
    pub fn trial_balance(
        &self,
        organization_id: OrganizationId,
        as_of: DateTime<Utc>,
    ) -> Result<TrialBalance, ProjectorError> {
        let chart = self.store.chart(organization_id)?;

        let mut accounts: Vec<_> = chart.accounts().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let mut rows = Vec::with_capacity(accounts.len());
        let mut total_debit: i128 = 0;
        let mut total_credit: i128 = 0;

        for account in accounts {
            let balance = self.balance_as_of(organization_id, account.id, as_of)?;
            // A negative natural balance shows up on the opposite column.
            let (debit, credit) = match (account.account_type.normal_side(), balance >= 0) {
                (NormalSide::Debit, true) => (balance, 0),
                (NormalSide::Debit, false) => (0, -balance),
                (NormalSide::Credit, true) => (0, balance),
                (NormalSide::Credit, false) => (-balance, 0),
            };
            total_debit += debit as i128;
            total_credit += credit as i128;
            rows.push(TrialBalanceRow {
                account_id: account.id,
                code: account.code,
                name: account.name,
                account_type: account.account_type,
                debit,
                credit,
            });
        }

        Ok(TrialBalance {
            organization_id,
            as_of,
            rows,
            total_debit,
            total_credit,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    use muhasib_core::{EntryId, UserId};
    use muhasib_ledger::{
        Account, AccountType, EntryType, JournalEntry, JournalEntryLine,
    };

    use super::*;
    use crate::store::InMemoryLedgerStore;

    struct Fixture {
        store: Arc<InMemoryLedgerStore>,
        projector: BalanceProjector<Arc<InMemoryLedgerStore>>,
        org: OrganizationId,
        cash: AccountId,
        revenue: AccountId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let org = OrganizationId::new();
        store.init_organization(org).unwrap();
        let cash = store
            .add_account(org, Account::new("1000", "Cash", AccountType::Asset, "SAR"))
            .unwrap();
        let revenue = store
            .add_account(
                org,
                Account::new("4000", "Revenue", AccountType::Revenue, "SAR"),
            )
            .unwrap();
        let projector = BalanceProjector::new(store.clone());
        Fixture {
            store,
            projector,
            org,
            cash,
            revenue,
        }
    }

    /// Post a balanced cash/revenue entry directly through the store,
    /// with an explicit posting time.
    fn commit(f: &Fixture, amount: i64, posted_at: DateTime<Utc>) -> PostingRecord {
        let number = f.store.next_entry_number(f.org).unwrap();
        let mut entry = JournalEntry::draft(
            EntryId::new(),
            f.org,
            number,
            posted_at,
            "Cash sale",
            EntryType::Manual,
            vec![
                JournalEntryLine::debit(f.cash, amount),
                JournalEntryLine::credit(f.revenue, amount),
            ],
            UserId::new(),
            posted_at,
        );
        f.store.insert_entry(entry.clone()).unwrap();
        entry.mark_posted(posted_at).unwrap();
        let deltas = vec![
            PostingDelta { account_id: f.cash, delta: amount },
            PostingDelta { account_id: f.revenue, delta: amount },
        ];
        f.store.commit_posting(&entry, &deltas).unwrap()
    }

    #[test]
    fn duplicate_records_are_idempotent() {
        let f = fixture();
        let record = commit(&f, 100, Utc::now());

        f.projector.apply_record(&record).unwrap();
        f.projector.apply_record(&record).unwrap();

        assert_eq!(f.projector.current_balance(f.org, f.cash).unwrap(), 100);
    }

    #[test]
    fn sequence_gaps_are_rejected() {
        let f = fixture();
        let r1 = commit(&f, 100, Utc::now());
        let _r2 = commit(&f, 50, Utc::now());
        let r3 = commit(&f, 25, Utc::now());

        f.projector.apply_record(&r1).unwrap();
        let err = f.projector.apply_record(&r3).unwrap_err();
        assert!(matches!(
            err,
            ProjectorError::NonMonotonicSequence { last: 1, found: 3 }
        ));
    }

    #[test]
    fn as_of_filters_later_postings() {
        let f = fixture();
        let t1 = Utc::now();
        let t2 = t1 + Duration::hours(1);
        commit(&f, 100, t1);
        commit(&f, 50, t2);

        let between = t1 + Duration::minutes(30);
        assert_eq!(f.projector.balance_as_of(f.org, f.cash, between).unwrap(), 100);
        assert_eq!(f.projector.balance_as_of(f.org, f.cash, t2).unwrap(), 150);
        // Boundary is inclusive.
        assert_eq!(f.projector.balance_as_of(f.org, f.cash, t1).unwrap(), 100);
    }

    #[test]
    fn opening_balances_are_included_on_both_paths() {
        let f = fixture();
        let savings = f
            .store
            .add_account(
                f.org,
                Account::new("1100", "Savings", AccountType::Asset, "SAR")
                    .with_opening_balance(1_000),
            )
            .unwrap();

        assert_eq!(f.projector.current_balance(f.org, savings).unwrap(), 1_000);
        assert_eq!(
            f.projector
                .balance_as_of(f.org, savings, Utc::now())
                .unwrap(),
            1_000
        );
    }

    #[test]
    fn rebuild_matches_incremental() {
        let f = fixture();
        for amount in [100, 50, 25] {
            let record = commit(&f, amount, Utc::now());
            f.projector.apply_posted(&EntryPosted {
                organization_id: f.org,
                entry_id: record.entry_id,
                entry_number: record.entry_number.clone(),
                sequence: record.sequence,
                deltas: record.deltas.clone(),
                posted_by: record.posted_by,
                occurred_at: record.posted_at,
            })
            .unwrap();
        }
        let incremental = f.projector.current_balance(f.org, f.cash).unwrap();

        f.projector.rebuild_from_history(f.org).unwrap();
        assert_eq!(f.projector.current_balance(f.org, f.cash).unwrap(), incremental);
        assert_eq!(incremental, 175);
    }

    #[test]
    fn trial_balance_columns_match() {
        let f = fixture();
        for record in [commit(&f, 100, Utc::now()), commit(&f, 40, Utc::now())] {
            f.projector.apply_record(&record).unwrap();
        }

        let tb = f.projector.trial_balance(f.org, Utc::now()).unwrap();
        assert_eq!(tb.total_debit, tb.total_credit);
        assert_eq!(tb.total_debit, 140);
        let cash_row = tb.rows.iter().find(|r| r.account_id == f.cash).unwrap();
        assert_eq!(cash_row.debit, 140);
        assert_eq!(cash_row.credit, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of posted entries, the incremental
        /// cache, a full replay, and the store's own balances all agree.
        #[test]
        fn incremental_and_recompute_agree(
            amounts in prop::collection::vec(1i64..1_000_000i64, 1..20)
        ) {
            let f = fixture();
            for &amount in &amounts {
                let record = commit(&f, amount, Utc::now());
                f.projector.apply_record(&record).unwrap();
            }

            let incremental = f.projector.current_balance(f.org, f.cash).unwrap();
            let recomputed = f.projector.balance_as_of(f.org, f.cash, Utc::now()).unwrap();
            let stored = f.store.chart(f.org).unwrap().get(f.cash).unwrap().balance;

            prop_assert_eq!(incremental, recomputed);
            prop_assert_eq!(incremental, stored);
            prop_assert_eq!(incremental, amounts.iter().sum::<i64>());
        }
    }
}
