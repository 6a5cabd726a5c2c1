//! The ledger validator.
//!
//! Pure function of a candidate entry and a chart snapshot — no side effects.
//! The posting engine re-runs it inside the organization's exclusive section,
//! since balances and account states may have changed since drafting.

use crate::chart::ChartOfAccounts;
use crate::entry::JournalEntry;
use crate::error::LedgerError;

/// Check the double-entry invariants on a candidate entry.
///
/// Rejections, in check order:
/// - [`LedgerError::EmptyEntry`]: fewer than two lines.
/// - [`LedgerError::NegativeAmount`]: a line with a negative amount.
/// - [`LedgerError::ZeroLine`]: a line with both sides zero or both non-zero.
/// - [`LedgerError::UnknownAccount`]: a line naming a missing/inactive account.
/// - [`LedgerError::ImbalancedEntry`]: debits != credits (exact, no epsilon).
pub fn validate_entry(entry: &JournalEntry, chart: &ChartOfAccounts) -> Result<(), LedgerError> {
    if entry.lines().len() < 2 {
        return Err(LedgerError::EmptyEntry);
    }

    let mut debits: i128 = 0;
    let mut credits: i128 = 0;

    for (idx, line) in entry.lines().iter().enumerate() {
        if line.debit < 0 || line.credit < 0 {
            return Err(LedgerError::NegativeAmount { line: idx });
        }
        if (line.debit != 0) == (line.credit != 0) {
            return Err(LedgerError::ZeroLine { line: idx });
        }
        if chart.resolve_active(line.account_id).is_none() {
            return Err(LedgerError::UnknownAccount(line.account_id));
        }
        debits += line.debit as i128;
        credits += line.credit as i128;
    }

    if debits != credits {
        return Err(LedgerError::ImbalancedEntry { debits, credits });
    }

    Ok(())
}
