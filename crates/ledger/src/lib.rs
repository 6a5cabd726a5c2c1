//! `muhasib-ledger` — the double-entry ledger domain.
//!
//! Pure domain types and rules: the chart of accounts, journal entries and
//! their lifecycle, the entry validator, and the ledger's domain events.
//! No IO, no locks — the posting engine in `muhasib-infra` orchestrates
//! persistence and concurrency around these rules.

pub mod account;
pub mod chart;
pub mod entry;
pub mod error;
pub mod events;
pub mod validate;

pub use account::{Account, AccountType, NormalSide};
pub use chart::ChartOfAccounts;
pub use entry::{EntryStatus, EntryType, JournalEntry, JournalEntryLine};
pub use error::LedgerError;
pub use events::{EntryApproved, EntryCancelled, EntryPosted, LedgerEvent, PostingDelta};
pub use validate::validate_entry;
