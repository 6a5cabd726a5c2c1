//! Infrastructure layer: persistence, per-organization locking, the posting
//! engine, and the balance projector.

pub mod lock;
pub mod posting;
pub mod projector;
pub mod store;


pub use lock::OrgLocks;
pub use posting::{DraftEntry, EngineError, PostingEngine};
pub use projector::{BalanceProjector, ProjectorError, TrialBalance, TrialBalanceRow};
pub use store::{
    InMemoryLedgerStore, LedgerStore, PostingRecord, ResultingBalance, StoreError,
};
