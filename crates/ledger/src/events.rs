//! Ledger domain events, published to reporting consumers after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use muhasib_core::{AccountId, EntryId, OrganizationId, UserId};
use muhasib_events::Event;

/// Signed natural-side balance effect of one posted entry on one account.
///
/// Deltas are precomputed by the posting engine so consumers never need the
/// chart to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingDelta {
    pub account_id: AccountId,
    pub delta: i64,
}

/// Event: a draft entry was posted and account balances moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPosted {
    pub organization_id: OrganizationId,
    pub entry_id: EntryId,
    pub entry_number: String,
    /// Per-organization posting sequence assigned by the history store.
    pub sequence: u64,
    pub deltas: Vec<PostingDelta>,
    pub posted_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a posted entry was approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryApproved {
    pub organization_id: OrganizationId,
    pub entry_id: EntryId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a draft entry was cancelled. No balance effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCancelled {
    pub organization_id: OrganizationId,
    pub entry_id: EntryId,
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    EntryPosted(EntryPosted),
    EntryApproved(EntryApproved),
    EntryCancelled(EntryCancelled),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::EntryPosted(_) => "ledger.entry.posted",
            LedgerEvent::EntryApproved(_) => "ledger.entry.approved",
            LedgerEvent::EntryCancelled(_) => "ledger.entry.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::EntryPosted(e) => e.occurred_at,
            LedgerEvent::EntryApproved(e) => e.occurred_at,
            LedgerEvent::EntryCancelled(e) => e.occurred_at,
        }
    }
}
