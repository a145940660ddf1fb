// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AccountRef;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Why a movement was not applied. Rejections are ordinary values; nothing is
/// mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("Invalid amount {amount}: must be positive with at most 2 decimal places")]
    InvalidAmount { amount: Decimal },
    #[error("Invalid fee: fees must be non-negative with at most 2 decimal places")]
    InvalidFee,
    #[error("Invalid commission {commission}: must be non-negative with at most 2 decimal places")]
    InvalidCommission { commission: Decimal },
    #[error("Movement needs a source or a destination account")]
    MissingAccounts,
    #[error("Source and destination are the same account ({account})")]
    SameAccount { account: AccountRef },
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Decimal, required: Decimal },
    #[error("Transaction limit exceeded: allowed {allowed}, requested {requested}")]
    TransactionLimitExceeded { allowed: Decimal, requested: Decimal },
    #[error("Daily limit exceeded: remaining {remaining}")]
    DailyLimitExceeded { remaining: Decimal },
    #[error("Monthly limit exceeded: remaining {remaining}")]
    MonthlyLimitExceeded { remaining: Decimal },
    #[error("Capacity exceeded: capacity {capacity}, balance would be {requested_balance}")]
    CapacityExceeded {
        capacity: Decimal,
        requested_balance: Decimal,
    },
    #[error("Amount out of range: {amount} cannot be applied without overflow")]
    AmountOutOfRange { amount: Decimal },
    #[error("Overpayment: card owes {owed}, payment of {offered} exceeds it")]
    Overpayment { owed: Decimal, offered: Decimal },
    #[error("Account {account} is inactive")]
    AccountInactive { account: AccountRef },
    #[error("Account {account} not found")]
    UnknownAccount { account: AccountRef },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Transaction limit exceeded: allowed {allowed}, requested {requested}")]
    TransactionLimitExceeded { allowed: Decimal, requested: Decimal },
    #[error("Daily limit exceeded: remaining {remaining}")]
    DailyLimitExceeded { remaining: Decimal },
    #[error("Monthly limit exceeded: remaining {remaining}")]
    MonthlyLimitExceeded { remaining: Decimal },
}

impl From<LimitViolation> for Rejection {
    fn from(value: LimitViolation) -> Self {
        match value {
            LimitViolation::TransactionLimitExceeded { allowed, requested } => {
                Rejection::TransactionLimitExceeded { allowed, requested }
            }
            LimitViolation::DailyLimitExceeded { remaining } => {
                Rejection::DailyLimitExceeded { remaining }
            }
            LimitViolation::MonthlyLimitExceeded { remaining } => {
                Rejection::MonthlyLimitExceeded { remaining }
            }
        }
    }
}

/// Failures turning user text into engine types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown account kind '{0}' (use bank|vault|ewallet|prepaid|credit)")]
    UnknownKind(String),
    #[error("Malformed account reference '{0}', expected KIND:ID")]
    MalformedRef(String),
    #[error("Unknown movement kind '{0}' (use deposit|withdrawal|payment|transfer)")]
    UnknownMovementKind(String),
    #[error("Invalid fee policy: {0}")]
    FeePolicy(String),
}
