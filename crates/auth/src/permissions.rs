use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "ledger.post").
/// A special wildcard permission `"*"` can be used by policy layers to
/// indicate "allow all" without hardcoding domain permissions into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draft journal entries.
pub const LEDGER_DRAFT: &str = "ledger.draft";
/// Post draft entries to the ledger.
pub const LEDGER_POST: &str = "ledger.post";
/// Approve posted entries.
pub const LEDGER_APPROVE: &str = "ledger.approve";
/// Cancel draft entries.
pub const LEDGER_CANCEL: &str = "ledger.cancel";
/// Administer the chart of accounts.
pub const ACCOUNTS_MANAGE: &str = "accounts.manage";
/// Query balances and trial balance data.
pub const REPORTS_READ: &str = "reports.read";
