// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-account consumption limits.
//!
//! E-wallets and prepaid cards carry transaction/daily/monthly limits in
//! either role. Vaults carry an optional daily withdrawal limit that applies
//! when they fund a movement. Counters are reset from outside the engine.

use crate::balance::Role;
use crate::errors::LimitViolation;
use crate::models::{Account, AccountDetails, UsageLimits};
use rust_decimal::Decimal;

/// True when a limit check runs for `account` in `role`, and therefore
/// when its usage counters move on commit.
pub fn tracks_usage(account: &Account, role: Role) -> bool {
    match (&account.details, role) {
        (AccountDetails::EWallet(_), _) | (AccountDetails::PrepaidCard(_), _) => true,
        (AccountDetails::Vault(_), Role::Source) => true,
        (AccountDetails::Vault(_), Role::Destination) => false,
        (AccountDetails::Bank, _) | (AccountDetails::CreditCard(_), _) => false,
    }
}

/// Checks in order: transaction limit, daily, monthly. First failure wins.
pub fn check(account: &Account, role: Role, gross: Decimal) -> Result<(), LimitViolation> {
    match (&account.details, role) {
        (AccountDetails::EWallet(limits), _) | (AccountDetails::PrepaidCard(limits), _) => {
            check_usage(limits, gross)
        }
        (AccountDetails::Vault(rules), Role::Source) => match rules.daily_withdrawal_limit {
            Some(limit) if exceeds(rules.withdrawn_today, gross, limit) => {
                Err(LimitViolation::DailyLimitExceeded {
                    remaining: remaining(limit, rules.withdrawn_today),
                })
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn check_usage(limits: &UsageLimits, gross: Decimal) -> Result<(), LimitViolation> {
    if let Some(allowed) = limits.transaction_limit {
        if gross > allowed {
            return Err(LimitViolation::TransactionLimitExceeded {
                allowed,
                requested: gross,
            });
        }
    }
    if let Some(limit) = limits.daily_limit {
        if exceeds(limits.daily_used, gross, limit) {
            return Err(LimitViolation::DailyLimitExceeded {
                remaining: remaining(limit, limits.daily_used),
            });
        }
    }
    if let Some(limit) = limits.monthly_limit {
        if exceeds(limits.monthly_used, gross, limit) {
            return Err(LimitViolation::MonthlyLimitExceeded {
                remaining: remaining(limit, limits.monthly_used),
            });
        }
    }
    Ok(())
}

// A sum too large to represent is over any limit.
fn exceeds(used: Decimal, gross: Decimal, limit: Decimal) -> bool {
    used.checked_add(gross).is_none_or(|total| total > limit)
}

fn remaining(limit: Decimal, used: Decimal) -> Decimal {
    limit.saturating_sub(used).max(Decimal::ZERO)
}

/// Moves the counters a successful [`check`] covered. Counters without a
/// limit saturate instead of overflowing.
pub fn record_usage(account: &mut Account, role: Role, gross: Decimal) {
    match (&mut account.details, role) {
        (AccountDetails::EWallet(limits), _) | (AccountDetails::PrepaidCard(limits), _) => {
            limits.daily_used = limits.daily_used.saturating_add(gross);
            limits.monthly_used = limits.monthly_used.saturating_add(gross);
        }
        (AccountDetails::Vault(rules), Role::Source) => {
            rules.withdrawn_today = rules.withdrawn_today.saturating_add(gross)
        }
        _ => {}
    }
}

pub fn reset_daily(account: &mut Account) {
    match &mut account.details {
        AccountDetails::EWallet(limits) | AccountDetails::PrepaidCard(limits) => {
            limits.daily_used = Decimal::ZERO;
        }
        AccountDetails::Vault(rules) => rules.withdrawn_today = Decimal::ZERO,
        AccountDetails::Bank | AccountDetails::CreditCard(_) => {}
    }
}

pub fn reset_monthly(account: &mut Account) {
    if let AccountDetails::EWallet(limits) | AccountDetails::PrepaidCard(limits) =
        &mut account.details
    {
        limits.monthly_used = Decimal::ZERO;
    }
}
