// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::ParseError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    #[serde(rename = "bank")]
    Bank,
    #[serde(rename = "vault")]
    Vault,
    #[serde(rename = "ewallet")]
    EWallet,
    #[serde(rename = "prepaid")]
    PrepaidCard,
    #[serde(rename = "credit")]
    CreditCard,
}

impl AccountKind {
    pub const ALL: [AccountKind; 5] = [
        AccountKind::Bank,
        AccountKind::Vault,
        AccountKind::EWallet,
        AccountKind::PrepaidCard,
        AccountKind::CreditCard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::Vault => "vault",
            AccountKind::EWallet => "ewallet",
            AccountKind::PrepaidCard => "prepaid",
            AccountKind::CreditCard => "credit",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bank" => Ok(AccountKind::Bank),
            "vault" | "cash" => Ok(AccountKind::Vault),
            "ewallet" | "e-wallet" | "e_wallet" | "wallet" => Ok(AccountKind::EWallet),
            "prepaid" | "prepaid_card" | "prepaid-card" => Ok(AccountKind::PrepaidCard),
            "credit" | "credit_card" | "credit-card" => Ok(AccountKind::CreditCard),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Composite account identifier: the kind plus an id that is unique within it.
///
/// Ordering is kind first, then id. Two-account movements lock in this order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountRef {
    pub kind: AccountKind,
    pub id: String,
}

impl AccountRef {
    pub fn new(kind: AccountKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for AccountRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseError::MalformedRef(s.to_string()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(ParseError::MalformedRef(s.to_string()));
        }
        Ok(AccountRef::new(kind.parse()?, id))
    }
}

impl TryFrom<String> for AccountRef {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountRef> for String {
    fn from(value: AccountRef) -> Self {
        value.to_string()
    }
}

/// Consumption limits carried by e-wallets and prepaid cards.
///
/// `None` means the limit is not set. The `*_used` counters are reset by an
/// external scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLimits {
    pub daily_limit: Option<Decimal>,
    pub daily_used: Decimal,
    pub monthly_limit: Option<Decimal>,
    pub monthly_used: Decimal,
    pub transaction_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultRules {
    pub max_capacity: Option<Decimal>,
    pub min_balance: Option<Decimal>,
    pub daily_withdrawal_limit: Option<Decimal>,
    pub withdrawn_today: Decimal,
}

/// `current_balance` is the amount owed on the card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditLine {
    pub credit_limit: Decimal,
    pub current_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AccountDetails {
    #[serde(rename = "bank")]
    Bank,
    #[serde(rename = "vault")]
    Vault(VaultRules),
    #[serde(rename = "ewallet")]
    EWallet(UsageLimits),
    #[serde(rename = "prepaid")]
    PrepaidCard(UsageLimits),
    #[serde(rename = "credit")]
    CreditCard(CreditLine),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub stored_balance: Decimal,
    pub is_active: bool,
    #[serde(flatten)]
    pub details: AccountDetails,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        stored_balance: Decimal,
        details: AccountDetails,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            stored_balance,
            is_active: true,
            details,
        }
    }

    pub fn bank(id: impl Into<String>, name: impl Into<String>, balance: Decimal) -> Self {
        Self::new(id, name, balance, AccountDetails::Bank)
    }

    pub fn vault(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        rules: VaultRules,
    ) -> Self {
        Self::new(id, name, balance, AccountDetails::Vault(rules))
    }

    pub fn ewallet(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        limits: UsageLimits,
    ) -> Self {
        Self::new(id, name, balance, AccountDetails::EWallet(limits))
    }

    pub fn prepaid_card(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        limits: UsageLimits,
    ) -> Self {
        Self::new(id, name, balance, AccountDetails::PrepaidCard(limits))
    }

    pub fn credit_card(
        id: impl Into<String>,
        name: impl Into<String>,
        credit_limit: Decimal,
        owed: Decimal,
    ) -> Self {
        Self::new(
            id,
            name,
            Decimal::ZERO,
            AccountDetails::CreditCard(CreditLine {
                credit_limit,
                current_balance: owed,
            }),
        )
    }

    pub fn kind(&self) -> AccountKind {
        match self.details {
            AccountDetails::Bank => AccountKind::Bank,
            AccountDetails::Vault(_) => AccountKind::Vault,
            AccountDetails::EWallet(_) => AccountKind::EWallet,
            AccountDetails::PrepaidCard(_) => AccountKind::PrepaidCard,
            AccountDetails::CreditCard(_) => AccountKind::CreditCard,
        }
    }

    pub fn account_ref(&self) -> AccountRef {
        AccountRef::new(self.kind(), self.id.clone())
    }

    /// The figure a ledger entry reports as "balance after": the stored
    /// balance, or the amount owed for a credit card.
    pub fn balance_figure(&self) -> Decimal {
        match &self.details {
            AccountDetails::CreditCard(line) => line.current_balance,
            _ => self.stored_balance,
        }
    }

    pub fn usage_limits(&self) -> Option<&UsageLimits> {
        match &self.details {
            AccountDetails::EWallet(limits) | AccountDetails::PrepaidCard(limits) => Some(limits),
            _ => None,
        }
    }
}
