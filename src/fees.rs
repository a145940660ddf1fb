// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fee calculation. Currency settles to 2 decimal places, rounded half-up.

use crate::errors::ParseError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MONEY_DP: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FeePolicy {
    #[default]
    None,
    Fixed(Decimal),
    /// Percent of the amount, e.g. `2.5` for 2.5%.
    Percentage(Decimal),
}

impl FeePolicy {
    /// Build a policy from the optional `--fee-fixed` / `--fee-percent` pair.
    pub fn from_parts(
        fixed: Option<Decimal>,
        percent: Option<Decimal>,
    ) -> Result<Self, ParseError> {
        match (fixed, percent) {
            (Some(_), Some(_)) => Err(ParseError::FeePolicy(
                "give either a fixed fee or a percentage, not both".into(),
            )),
            (Some(v), None) => Ok(FeePolicy::Fixed(v)),
            (None, Some(p)) => Ok(FeePolicy::Percentage(p)),
            (None, None) => Ok(FeePolicy::None),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            FeePolicy::None => true,
            FeePolicy::Fixed(v) => !v.is_sign_negative() && has_money_scale(*v),
            FeePolicy::Percentage(p) => !p.is_sign_negative(),
        }
    }
}

impl fmt::Display for FeePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeePolicy::None => f.write_str("none"),
            FeePolicy::Fixed(v) => write!(f, "fixed {}", v),
            FeePolicy::Percentage(p) => write!(f, "{}%", p),
        }
    }
}

/// Round to currency precision (half-up) and pad to exactly 2 fractional digits.
pub fn round_money(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(MONEY_DP);
    v
}

/// True when `value` carries no more than 2 significant fractional digits.
pub fn has_money_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_DP
}

/// `None` when the fee cannot be represented.
pub fn compute_fee(amount: Decimal, policy: &FeePolicy) -> Option<Decimal> {
    let fee = match policy {
        FeePolicy::None => Decimal::ZERO,
        FeePolicy::Fixed(v) => *v,
        FeePolicy::Percentage(p) => amount.checked_mul(*p)? / Decimal::ONE_HUNDRED,
    };
    Some(round_money(fee.max(Decimal::ZERO)))
}
