// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::EngineConfig;
use crate::engine::{MovementOutcome, MovementRequest};
use crate::fees::FeePolicy;
use crate::ledger::{LedgerEntry, MovementKind};
use crate::models::{AccountKind, AccountRef};
use crate::store;
use crate::utils::{fmt_money, parse_decimal, parse_opt_decimal, parse_timestamp};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let (kind, sub) = match m.subcommand() {
        Some(("deposit", sub)) => (MovementKind::Deposit, sub),
        Some(("withdraw", sub)) => (MovementKind::Withdrawal, sub),
        Some(("transfer", sub)) => (MovementKind::Transfer, sub),
        Some(("pay", sub)) => (MovementKind::Payment, sub),
        _ => return Ok(()),
    };
    let request = request_from_args(kind, sub)?;
    let config = EngineConfig::load(conn)?;
    let outcome = store::submit(conn, &config, request)?;
    report(&outcome);
    Ok(())
}

fn parse_ref(raw: &str) -> Result<AccountRef> {
    raw.parse::<AccountRef>()
        .with_context(|| format!("Invalid account '{}'", raw.trim()))
}

/// Builds the request for a `move` subcommand. `pay` must target a credit
/// card and `transfer` must not; the kind is otherwise implied by the sides.
pub fn request_from_args(kind: MovementKind, sub: &clap::ArgMatches) -> Result<MovementRequest> {
    let source = match kind {
        MovementKind::Deposit => None,
        _ => Some(parse_ref(sub.get_one::<String>("from").unwrap())?),
    };
    let destination = match kind {
        MovementKind::Withdrawal => None,
        _ => Some(parse_ref(sub.get_one::<String>("to").unwrap())?),
    };
    match (kind, destination.as_ref().map(|d| d.kind)) {
        (MovementKind::Payment, Some(k)) if k != AccountKind::CreditCard => {
            return Err(anyhow!("pay needs a credit card destination, got {}", k));
        }
        (MovementKind::Transfer, Some(AccountKind::CreditCard)) => {
            return Err(anyhow!("Use `move pay` to pay into a credit card"));
        }
        _ => {}
    }

    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let fee_policy = FeePolicy::from_parts(
        parse_opt_decimal(sub.get_one::<String>("fee-fixed").map(|s| s.as_str()))?,
        parse_opt_decimal(sub.get_one::<String>("fee-percent").map(|s| s.as_str()))?,
    )?;
    let commission = parse_opt_decimal(sub.get_one::<String>("commission").map(|s| s.as_str()))?
        .unwrap_or(Decimal::ZERO);

    let mut request = MovementRequest::new(source, destination, amount)
        .with_fee(fee_policy)
        .with_commission(commission);
    if let Some(date) = sub.get_one::<String>("date") {
        request = request.at(parse_timestamp(date)?);
    }
    if let Some(desc) = sub.get_one::<String>("description") {
        request = request.described(desc.trim());
    }
    if sub.get_flag("count-destination-limits") {
        request = request.count_destination_limits(true);
    } else if sub.get_flag("skip-destination-limits") {
        request = request.count_destination_limits(false);
    }
    Ok(request)
}

pub fn describe_entry(entry: &LedgerEntry) -> String {
    let mut parts = vec![format!("#{} {} {}", entry.id, entry.kind, fmt_money(&entry.amount))];
    if let Some(src) = &entry.source {
        parts.push(format!(
            "from {} (debited {}, now {})",
            src,
            fmt_money(&entry.total_debited),
            entry
                .source_balance_after
                .as_ref()
                .map(fmt_money)
                .unwrap_or_default()
        ));
    }
    if let Some(dst) = &entry.destination {
        parts.push(format!(
            "to {} (credited {}, now {})",
            dst,
            fmt_money(&entry.total_credited),
            entry
                .destination_balance_after
                .as_ref()
                .map(fmt_money)
                .unwrap_or_default()
        ));
    }
    parts.join(" ")
}

fn report(outcome: &MovementOutcome) {
    match outcome {
        MovementOutcome::Applied(entry) => println!("Applied {}", describe_entry(entry)),
        MovementOutcome::Rejected(reason) => eprintln!("Rejected: {}", reason),
    }
}
