use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use muhasib_core::{AccountId, DomainError, DomainResult, OrganizationId};

use crate::account::Account;

/// Per-organization chart of accounts.
///
/// A plain tree registry: resolves identifiers to accounts, codes to
/// identifiers, parents to children. Cloning produces the snapshot the
/// validator runs against; shared, synchronized access is the store's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    organization_id: OrganizationId,
    accounts: HashMap<AccountId, Account>,
    by_code: HashMap<String, AccountId>,
}

impl ChartOfAccounts {
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            accounts: HashMap::new(),
            by_code: HashMap::new(),
        }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Register a new account.
    ///
    /// Codes are unique per organization. A child must reference an existing,
    /// active parent of the same account type; its tree level is derived from
    /// the parent.
    pub fn add_account(&mut self, mut account: Account) -> DomainResult<AccountId> {
        if self.by_code.contains_key(&account.code) {
            return Err(DomainError::conflict(format!(
                "duplicate account code '{}'",
                account.code
            )));
        }

        match account.parent_id {
            None => {
                account.level = 1;
            }
            Some(parent_id) => {
                let parent = self
                    .accounts
                    .get(&parent_id)
                    .ok_or_else(|| DomainError::validation("parent account does not exist"))?;
                if !parent.active {
                    return Err(DomainError::validation("parent account is inactive"));
                }
                if parent.account_type != account.account_type {
                    return Err(DomainError::validation(
                        "account type must match its parent",
                    ));
                }
                account.level = parent.level + 1;
            }
        }

        let id = account.id;
        self.by_code.insert(account.code.clone(), id);
        self.accounts.insert(id, account);
        Ok(id)
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn get_by_code(&self, code: &str) -> Option<&Account> {
        self.by_code.get(code).and_then(|id| self.accounts.get(id))
    }

    /// Resolve an account for posting: it must exist and be active.
    pub fn resolve_active(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id).filter(|a| a.active)
    }

    pub fn children(&self, parent_id: AccountId) -> Vec<&Account> {
        let mut out: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| a.parent_id == Some(parent_id))
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }

    /// Activate or deactivate an account. Accounts are never removed.
    pub fn set_active(&mut self, id: AccountId, active: bool) -> DomainResult<()> {
        let account = self.accounts.get_mut(&id).ok_or(DomainError::NotFound)?;
        account.active = active;
        Ok(())
    }

    /// Apply a signed natural-side delta to an account's balance.
    ///
    /// Only the posting engine calls this, through the store's atomic commit.
    pub fn apply_delta(&mut self, id: AccountId, delta: i64) -> DomainResult<()> {
        let account = self.accounts.get_mut(&id).ok_or(DomainError::NotFound)?;
        account.balance += delta;
        Ok(())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;

    fn chart() -> ChartOfAccounts {
        ChartOfAccounts::new(OrganizationId::new())
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let mut chart = chart();
        chart
            .add_account(Account::new("1000", "Cash", AccountType::Asset, "SAR"))
            .unwrap();

        let err = chart
            .add_account(Account::new("1000", "Petty Cash", AccountType::Asset, "SAR"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn child_levels_follow_parents() {
        let mut chart = chart();
        let assets = chart
            .add_account(Account::new("1", "Assets", AccountType::Asset, "SAR"))
            .unwrap();
        let current = chart
            .add_account(
                Account::new("10", "Current Assets", AccountType::Asset, "SAR").with_parent(assets),
            )
            .unwrap();
        let cash = chart
            .add_account(
                Account::new("1000", "Cash", AccountType::Asset, "SAR").with_parent(current),
            )
            .unwrap();

        assert_eq!(chart.get(assets).unwrap().level, 1);
        assert_eq!(chart.get(current).unwrap().level, 2);
        assert_eq!(chart.get(cash).unwrap().level, 3);
        assert_eq!(chart.children(current).len(), 1);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut chart = chart();
        let err = chart
            .add_account(
                Account::new("1000", "Cash", AccountType::Asset, "SAR")
                    .with_parent(AccountId::new()),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn parent_type_mismatch_is_rejected() {
        let mut chart = chart();
        let assets = chart
            .add_account(Account::new("1", "Assets", AccountType::Asset, "SAR"))
            .unwrap();
        let err = chart
            .add_account(
                Account::new("4000", "Sales", AccountType::Revenue, "SAR").with_parent(assets),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn inactive_accounts_do_not_resolve_for_posting() {
        let mut chart = chart();
        let cash = chart
            .add_account(Account::new("1000", "Cash", AccountType::Asset, "SAR"))
            .unwrap();
        chart.set_active(cash, false).unwrap();

        assert!(chart.get(cash).is_some());
        assert!(chart.resolve_active(cash).is_none());
    }
}
