// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance::{Role, credit_headroom, usable_balance};
use crate::fees::has_money_scale;
use crate::models::{
    Account, AccountDetails, AccountKind, AccountRef, CreditLine, UsageLimits, VaultRules,
};
use crate::store;
use crate::utils::{fmt_money, fmt_opt_money, maybe_print_json, parse_opt_decimal, pretty_table};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let account = account_ref(sub)?;
            if !store::delete_account(conn, &account)? {
                return Err(anyhow!("Account {} not found", account));
            }
            println!("Removed account {}", account);
        }
        Some(("balance", sub)) => balance(conn, sub)?,
        Some(("activate", sub)) => set_active(conn, sub, true)?,
        Some(("deactivate", sub)) => set_active(conn, sub, false)?,
        Some(("reset-usage", sub)) => {
            let daily = sub.get_flag("daily");
            let monthly = sub.get_flag("monthly");
            if !daily && !monthly {
                return Err(anyhow!("Pass --daily and/or --monthly"));
            }
            let n = store::reset_usage(conn, daily, monthly)?;
            println!("Reset usage counters on {} accounts", n);
        }
        _ => {}
    }
    Ok(())
}

pub fn account_ref(sub: &clap::ArgMatches) -> Result<AccountRef> {
    let raw = sub.get_one::<String>("account").unwrap();
    raw.parse::<AccountRef>()
        .with_context(|| format!("Invalid account '{}'", raw.trim()))
}

/// Builds the account described by `account add` arguments.
pub fn account_from_args(sub: &clap::ArgMatches) -> Result<Account> {
    let kind: AccountKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let id = sub.get_one::<String>("id").unwrap().trim().to_string();
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if id.is_empty() || id.contains(':') {
        return Err(anyhow!("Account id '{}' must be non-empty and contain no ':'", id));
    }
    let opt = |key: &str| parse_opt_decimal(sub.get_one::<String>(key).map(|s| s.as_str()));
    let balance = opt("balance")?.unwrap_or(Decimal::ZERO);

    let allowed: &[&str] = match kind {
        AccountKind::Bank => &["balance"],
        AccountKind::Vault => &[
            "balance",
            "max-capacity",
            "min-balance",
            "daily-withdrawal-limit",
        ],
        AccountKind::EWallet | AccountKind::PrepaidCard => {
            &["balance", "daily-limit", "monthly-limit", "tx-limit"]
        }
        AccountKind::CreditCard => &["credit-limit", "owed"],
    };
    for key in [
        "balance",
        "credit-limit",
        "owed",
        "daily-limit",
        "monthly-limit",
        "tx-limit",
        "max-capacity",
        "min-balance",
        "daily-withdrawal-limit",
    ] {
        if sub.get_one::<String>(key).is_some() && !allowed.contains(&key) {
            return Err(anyhow!("--{} does not apply to {} accounts", key, kind));
        }
    }

    let details = match kind {
        AccountKind::Bank => AccountDetails::Bank,
        AccountKind::Vault => AccountDetails::Vault(VaultRules {
            max_capacity: opt("max-capacity")?,
            min_balance: opt("min-balance")?,
            daily_withdrawal_limit: opt("daily-withdrawal-limit")?,
            withdrawn_today: Decimal::ZERO,
        }),
        AccountKind::EWallet | AccountKind::PrepaidCard => {
            let limits = UsageLimits {
                daily_limit: opt("daily-limit")?,
                daily_used: Decimal::ZERO,
                monthly_limit: opt("monthly-limit")?,
                monthly_used: Decimal::ZERO,
                transaction_limit: opt("tx-limit")?,
            };
            if kind == AccountKind::EWallet {
                AccountDetails::EWallet(limits)
            } else {
                AccountDetails::PrepaidCard(limits)
            }
        }
        AccountKind::CreditCard => AccountDetails::CreditCard(CreditLine {
            credit_limit: opt("credit-limit")?
                .ok_or_else(|| anyhow!("Credit cards need --credit-limit"))?,
            current_balance: opt("owed")?.unwrap_or(Decimal::ZERO),
        }),
    };
    let account = Account::new(id, name, balance, details);
    validate_new_account(&account)?;
    Ok(account)
}

/// Every money figure given on the command line, with its flag name.
fn money_figures(account: &Account) -> Vec<(&'static str, Decimal)> {
    let mut figures = vec![("balance", account.stored_balance)];
    let mut opt = |flag: &'static str, value: Option<Decimal>| {
        if let Some(v) = value {
            figures.push((flag, v));
        }
    };
    match &account.details {
        AccountDetails::Bank => {}
        AccountDetails::Vault(rules) => {
            opt("max-capacity", rules.max_capacity);
            opt("min-balance", rules.min_balance);
            opt("daily-withdrawal-limit", rules.daily_withdrawal_limit);
        }
        AccountDetails::EWallet(limits) | AccountDetails::PrepaidCard(limits) => {
            opt("daily-limit", limits.daily_limit);
            opt("monthly-limit", limits.monthly_limit);
            opt("tx-limit", limits.transaction_limit);
        }
        AccountDetails::CreditCard(line) => {
            opt("credit-limit", Some(line.credit_limit));
            opt("owed", Some(line.current_balance));
        }
    }
    figures
}

fn validate_new_account(account: &Account) -> Result<()> {
    for (flag, value) in money_figures(account) {
        if value < Decimal::ZERO {
            return Err(anyhow!("--{} cannot be negative, got {}", flag, value));
        }
        if !has_money_scale(value) {
            return Err(anyhow!(
                "--{} {} has more than 2 decimal places",
                flag,
                value
            ));
        }
    }
    match &account.details {
        AccountDetails::Vault(rules) => {
            if let Some(cap) = rules.max_capacity {
                if account.stored_balance > cap {
                    return Err(anyhow!(
                        "Opening balance {} exceeds max capacity {}",
                        account.stored_balance,
                        cap
                    ));
                }
            }
            if let Some(min) = rules.min_balance {
                if account.stored_balance < min {
                    return Err(anyhow!(
                        "Opening balance {} is below min balance {}",
                        account.stored_balance,
                        min
                    ));
                }
            }
        }
        AccountDetails::CreditCard(line) => {
            if line.current_balance.is_sign_negative() || line.current_balance > line.credit_limit
            {
                return Err(anyhow!(
                    "Owed amount {} must be between 0 and the credit limit {}",
                    line.current_balance,
                    line.credit_limit
                ));
            }
        }
        AccountDetails::Bank | AccountDetails::EWallet(_) | AccountDetails::PrepaidCard(_) => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = account_from_args(sub)?;
    store::insert_account(conn, &account)?;
    println!(
        "Added account {} ({})",
        account.account_ref(),
        account.display_name
    );
    Ok(())
}

#[derive(Serialize)]
pub struct AccountRow {
    pub account: String,
    pub name: String,
    pub balance: String,
    pub available: String,
    pub headroom: String,
    pub active: bool,
}

pub fn account_rows(conn: &Connection) -> Result<Vec<AccountRow>> {
    let accounts = store::load_accounts(conn)?;
    Ok(accounts
        .iter()
        .map(|acc| AccountRow {
            account: acc.account_ref().to_string(),
            name: acc.display_name.clone(),
            balance: fmt_money(&acc.balance_figure()),
            available: fmt_money(&usable_balance(acc, Role::Source)),
            headroom: fmt_opt_money(credit_headroom(acc).as_ref()),
            active: acc.is_active,
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    if json_flag || jsonl_flag {
        let accounts = store::load_accounts(conn)?;
        maybe_print_json(json_flag, jsonl_flag, &accounts)?;
        return Ok(());
    }
    let rows = account_rows(conn)?
        .into_iter()
        .map(|r| {
            vec![
                r.account,
                r.name,
                r.balance,
                r.available,
                r.headroom,
                if r.active { "yes".into() } else { "no".into() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Account", "Name", "Balance", "Available", "Headroom", "Active"],
            rows
        )
    );
    Ok(())
}

fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = account_ref(sub)?;
    let acc = store::load_account(conn, &account)?
        .ok_or_else(|| anyhow!("Account {} not found", account))?;
    println!(
        "{}: balance {}, available {}",
        account,
        fmt_money(&acc.balance_figure()),
        fmt_money(&usable_balance(&acc, Role::Source))
    );
    Ok(())
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let account = account_ref(sub)?;
    if !store::set_active(conn, &account, active)? {
        return Err(anyhow!("Account {} not found", account));
    }
    println!(
        "{} account {}",
        if active { "Activated" } else { "Deactivated" },
        account
    );
    Ok(())
}
