use serde::{Deserialize, Serialize};

use muhasib_core::{AccountId, Entity};

/// High-level account type (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// The side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountType {
    /// Assets and expenses increase on debit; liabilities, equity and
    /// revenue increase on credit.
    pub fn normal_side(self) -> NormalSide {
        match self {
            AccountType::Asset | AccountType::Expense => NormalSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalSide::Credit
            }
        }
    }

    /// Signed balance delta for a (debit, credit) amount pair, expressed in
    /// this type's natural-balance terms.
    pub fn signed_delta(self, debit: i64, credit: i64) -> i64 {
        match self.normal_side() {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }
}

/// A node in the chart of accounts.
///
/// Amounts are in minor currency units (e.g. cents). Once created, balances
/// are mutated only by the posting engine; accounts are never deleted, only
/// deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique per organization, e.g. "1000".
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    /// Tree structure: roots have no parent.
    pub parent_id: Option<AccountId>,
    /// Depth in the account tree (roots are level 1). Maintained by the chart.
    pub level: u8,
    /// ISO currency code, e.g. "SAR".
    pub currency: String,
    pub active: bool,
    /// Balance carried in before any posted entry (natural-side, minor units).
    pub opening_balance: i64,
    /// Current natural-side balance (minor units).
    pub balance: i64,
}

impl Account {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
            level: 1,
            currency: currency.into(),
            active: true,
            opening_balance: 0,
            balance: 0,
        }
    }

    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_opening_balance(mut self, opening: i64) -> Self {
        self.opening_balance = opening;
        self.balance = opening;
        self
    }

    /// Signed delta this account's balance receives for a (debit, credit) pair.
    pub fn delta_for(&self, debit: i64, credit: i64) -> i64 {
        self.account_type.signed_delta(debit, credit)
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_convention_by_type() {
        assert_eq!(AccountType::Asset.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Expense.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Liability.normal_side(), NormalSide::Credit);
        assert_eq!(AccountType::Equity.normal_side(), NormalSide::Credit);
        assert_eq!(AccountType::Revenue.normal_side(), NormalSide::Credit);
    }

    #[test]
    fn debit_increases_asset_and_credit_increases_revenue() {
        assert_eq!(AccountType::Asset.signed_delta(100, 0), 100);
        assert_eq!(AccountType::Asset.signed_delta(0, 100), -100);
        assert_eq!(AccountType::Revenue.signed_delta(0, 100), 100);
        assert_eq!(AccountType::Revenue.signed_delta(100, 0), -100);
    }

    #[test]
    fn opening_balance_seeds_current_balance() {
        let cash = Account::new("1000", "Cash", AccountType::Asset, "SAR")
            .with_opening_balance(5_000);
        assert_eq!(cash.balance, 5_000);
        assert_eq!(cash.opening_balance, 5_000);
    }
}
