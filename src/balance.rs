// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Usable balance per account kind, and the ceiling checks on the credit side.

use crate::errors::Rejection;
use crate::models::{Account, AccountDetails};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

/// Source role: what the account can contribute right now. A credit card
/// contributes its unused credit, a vault keeps its minimum balance back.
///
/// Destination role: the figure the credit lands on (amount owed for a card).
pub fn usable_balance(account: &Account, role: Role) -> Decimal {
    match (role, &account.details) {
        (Role::Source, AccountDetails::CreditCard(line)) => {
            line.credit_limit
                .saturating_sub(line.current_balance)
                .max(Decimal::ZERO)
        }
        (Role::Source, AccountDetails::Vault(rules)) => {
            // A negative floor must not free up more than the stored balance.
            let floor = rules.min_balance.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
            account.stored_balance.saturating_sub(floor).max(Decimal::ZERO)
        }
        (Role::Source, AccountDetails::Bank)
        | (Role::Source, AccountDetails::EWallet(_))
        | (Role::Source, AccountDetails::PrepaidCard(_)) => account.stored_balance,
        (Role::Destination, _) => account.balance_figure(),
    }
}

/// How much more may be credited. `None` means unbounded.
pub fn credit_headroom(account: &Account) -> Option<Decimal> {
    match &account.details {
        AccountDetails::Vault(rules) => rules
            .max_capacity
            .map(|cap| cap.saturating_sub(account.stored_balance).max(Decimal::ZERO)),
        AccountDetails::CreditCard(line) => Some(line.current_balance),
        AccountDetails::Bank | AccountDetails::EWallet(_) | AccountDetails::PrepaidCard(_) => None,
    }
}

/// Rejects a credit that would overfill a capped vault or overpay a card.
pub fn check_credit(account: &Account, total_credit: Decimal) -> Result<(), Rejection> {
    match &account.details {
        AccountDetails::Vault(rules) => match rules.max_capacity {
            Some(capacity) => {
                let requested_balance = account
                    .stored_balance
                    .checked_add(total_credit)
                    .ok_or(Rejection::AmountOutOfRange {
                        amount: total_credit,
                    })?;
                if requested_balance > capacity {
                    return Err(Rejection::CapacityExceeded {
                        capacity,
                        requested_balance,
                    });
                }
                Ok(())
            }
            None => Ok(()),
        },
        AccountDetails::CreditCard(line) if total_credit > line.current_balance => {
            Err(Rejection::Overpayment {
                owed: line.current_balance,
                offered: total_credit,
            })
        }
        _ => Ok(()),
    }
}
