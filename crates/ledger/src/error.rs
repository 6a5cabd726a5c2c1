//! The ledger error taxonomy.

use thiserror::Error;

use muhasib_core::AccountId;

use crate::entry::EntryStatus;

/// Errors raised by the validator and the posting lifecycle.
///
/// Validation failures are deterministic client-input errors, surfaced
/// verbatim and never retried. `PostingFailed` covers storage/lock failures
/// and may be retried by the caller while the entry remains draft.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Sum of debits does not equal sum of credits (exact comparison).
    #[error("imbalanced entry: debits {debits} != credits {credits}")]
    ImbalancedEntry { debits: i128, credits: i128 },

    /// A journal entry needs at least two lines.
    #[error("entry must contain at least two lines")]
    EmptyEntry,

    /// A line references an account absent from the chart or inactive.
    #[error("unknown or inactive account {0}")]
    UnknownAccount(AccountId),

    /// A line must carry exactly one of debit or credit.
    #[error("line {line}: exactly one of debit or credit must be non-zero")]
    ZeroLine { line: usize },

    /// Line amounts are magnitudes; the side carries the sign.
    #[error("line {line}: amounts must not be negative")]
    NegativeAmount { line: usize },

    /// The entry lifecycle forbids this transition.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: EntryStatus, to: EntryStatus },

    /// Storage or lock failure while posting; no balance update was applied.
    #[error("posting failed: {0}")]
    PostingFailed(String),
}

impl LedgerError {
    /// Deterministic client-input error: surface verbatim, never retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::PostingFailed(_))
    }

    /// Safe to retry at the caller's discretion — only while the entry is
    /// still draft; `InvalidStateTransition` is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::PostingFailed(_))
    }

    pub fn posting_failed(msg: impl Into<String>) -> Self {
        Self::PostingFailed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let imbalanced = LedgerError::ImbalancedEntry {
            debits: 100,
            credits: 90,
        };
        assert!(imbalanced.is_client_error());
        assert!(!imbalanced.is_retryable());

        let failed = LedgerError::posting_failed("lock poisoned");
        assert!(!failed.is_client_error());
        assert!(failed.is_retryable());

        let transition = LedgerError::InvalidStateTransition {
            from: EntryStatus::Posted,
            to: EntryStatus::Posted,
        };
        assert!(transition.is_client_error());
        assert!(!transition.is_retryable());
    }
}
