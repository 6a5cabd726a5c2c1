use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use muhasib_core::{AccountId, EntryId, OrganizationId, UserId};

use crate::error::LedgerError;

/// Journal entry lifecycle.
///
/// draft → posted → approved; draft → cancelled. Posted entries can never be
/// cancelled — corrections go through an offsetting reversal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
    Approved,
    Cancelled,
}

impl EntryStatus {
    pub fn can_transition_to(self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Draft, EntryStatus::Posted)
                | (EntryStatus::Draft, EntryStatus::Cancelled)
                | (EntryStatus::Posted, EntryStatus::Approved)
        )
    }
}

impl core::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
            EntryStatus::Approved => "approved",
            EntryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Origin of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Manual,
    Auto,
    Opening,
    Closing,
    Adjustment,
}

/// One side of a journal entry. Immutable once the parent entry is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub account_id: AccountId,
    /// Debit amount in minor units. At most one of debit/credit is non-zero.
    pub debit: i64,
    /// Credit amount in minor units.
    pub credit: i64,
    pub cost_center: Option<String>,
    pub description: Option<String>,
}

impl JournalEntryLine {
    pub fn debit(account_id: AccountId, amount: i64) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: 0,
            cost_center: None,
            description: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: i64) -> Self {
        Self {
            account_id,
            debit: 0,
            credit: amount,
            cost_center: None,
            description: None,
        }
    }

    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Line with debit and credit swapped (reversal building block).
    pub fn offsetting(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            cost_center: self.cost_center.clone(),
            description: self.description.clone(),
        }
    }
}

/// A journal entry: an ordered set of lines plus lifecycle state.
///
/// Fields are private; state only changes through the transition methods so
/// a posted entry cannot be edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: EntryId,
    organization_id: OrganizationId,
    /// Human-facing number, e.g. "JE-000042". Unique per organization.
    entry_number: String,
    /// Business date of the transaction.
    entry_date: DateTime<Utc>,
    description: String,
    entry_type: EntryType,
    status: EntryStatus,
    lines: Vec<JournalEntryLine>,
    total_debit: i128,
    total_credit: i128,
    created_by: UserId,
    approved_by: Option<UserId>,
    created_at: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn draft(
        id: EntryId,
        organization_id: OrganizationId,
        entry_number: impl Into<String>,
        entry_date: DateTime<Utc>,
        description: impl Into<String>,
        entry_type: EntryType,
        lines: Vec<JournalEntryLine>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let total_debit = lines.iter().map(|l| l.debit as i128).sum();
        let total_credit = lines.iter().map(|l| l.credit as i128).sum();
        Self {
            id,
            organization_id,
            entry_number: entry_number.into(),
            entry_date,
            description: description.into(),
            entry_type,
            status: EntryStatus::Draft,
            lines,
            total_debit,
            total_credit,
            created_by,
            approved_by: None,
            created_at,
            posted_at: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn entry_number(&self) -> &str {
        &self.entry_number
    }

    pub fn entry_date(&self) -> DateTime<Utc> {
        self.entry_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn lines(&self) -> &[JournalEntryLine] {
        &self.lines
    }

    pub fn total_debit(&self) -> i128 {
        self.total_debit
    }

    pub fn total_credit(&self) -> i128 {
        self.total_credit
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    fn transition(&mut self, to: EntryStatus) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(to) {
            return Err(LedgerError::InvalidStateTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// draft → posted. Called by the posting engine after the balance
    /// deltas were committed; records the posting timestamp.
    pub fn mark_posted(&mut self, at: DateTime<Utc>) -> Result<(), LedgerError> {
        self.transition(EntryStatus::Posted)?;
        self.posted_at = Some(at);
        Ok(())
    }

    /// posted → approved.
    pub fn approve(&mut self, by: UserId) -> Result<(), LedgerError> {
        self.transition(EntryStatus::Approved)?;
        self.approved_by = Some(by);
        Ok(())
    }

    /// draft → cancelled. Never touches account balances.
    pub fn cancel(&mut self) -> Result<(), LedgerError> {
        self.transition(EntryStatus::Cancelled)
    }

    /// Build the offsetting draft that reverses this entry.
    ///
    /// Only posted or approved entries can be reversed; the source entry is
    /// left untouched.
    pub fn reversal(
        &self,
        id: EntryId,
        entry_number: impl Into<String>,
        created_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        if !matches!(self.status, EntryStatus::Posted | EntryStatus::Approved) {
            return Err(LedgerError::InvalidStateTransition {
                from: self.status,
                to: EntryStatus::Cancelled,
            });
        }
        let lines = self.lines.iter().map(JournalEntryLine::offsetting).collect();
        Ok(JournalEntry::draft(
            id,
            self.organization_id,
            entry_number,
            at,
            format!("Reversal of {}", self.entry_number),
            EntryType::Adjustment,
            lines,
            created_by,
            at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_line_entry(debit: i64, credit: i64) -> JournalEntry {
        JournalEntry::draft(
            EntryId::new(),
            OrganizationId::new(),
            "JE-000001",
            Utc::now(),
            "Test entry",
            EntryType::Manual,
            vec![
                JournalEntryLine::debit(AccountId::new(), debit),
                JournalEntryLine::credit(AccountId::new(), credit),
            ],
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn draft_computes_totals() {
        let entry = two_line_entry(100, 100);
        assert_eq!(entry.total_debit(), 100);
        assert_eq!(entry.total_credit(), 100);
        assert!(entry.is_balanced());
        assert_eq!(entry.status(), EntryStatus::Draft);
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut entry = two_line_entry(100, 100);
        entry.mark_posted(Utc::now()).unwrap();
        assert_eq!(entry.status(), EntryStatus::Posted);
        assert!(entry.posted_at().is_some());

        let approver = UserId::new();
        entry.approve(approver).unwrap();
        assert_eq!(entry.status(), EntryStatus::Approved);
        assert_eq!(entry.approved_by(), Some(approver));
    }

    #[test]
    fn posted_entries_cannot_be_cancelled() {
        let mut entry = two_line_entry(100, 100);
        entry.mark_posted(Utc::now()).unwrap();

        let err = entry.cancel().unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidStateTransition {
                from: EntryStatus::Posted,
                to: EntryStatus::Cancelled,
            }
        );
    }

    #[test]
    fn cancelled_entries_are_terminal() {
        let mut entry = two_line_entry(100, 100);
        entry.cancel().unwrap();
        assert!(entry.mark_posted(Utc::now()).is_err());
        assert!(entry.approve(UserId::new()).is_err());
    }

    #[test]
    fn double_post_is_rejected() {
        let mut entry = two_line_entry(100, 100);
        entry.mark_posted(Utc::now()).unwrap();
        let err = entry.mark_posted(Utc::now()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidStateTransition {
                from: EntryStatus::Posted,
                to: EntryStatus::Posted,
            }
        );
    }

    #[test]
    fn reversal_swaps_sides() {
        let mut entry = two_line_entry(100, 100);
        entry.mark_posted(Utc::now()).unwrap();

        let reversal = entry
            .reversal(EntryId::new(), "JE-000002", UserId::new(), Utc::now())
            .unwrap();
        assert_eq!(reversal.status(), EntryStatus::Draft);
        assert_eq!(reversal.entry_type(), EntryType::Adjustment);
        assert_eq!(reversal.lines()[0].credit, entry.lines()[0].debit);
        assert_eq!(reversal.lines()[1].debit, entry.lines()[1].credit);
        assert!(reversal.is_balanced());
    }

    #[test]
    fn drafts_cannot_be_reversed() {
        let entry = two_line_entry(100, 100);
        assert!(
            entry
                .reversal(EntryId::new(), "JE-000002", UserId::new(), Utc::now())
                .is_err()
        );
    }
}
