// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, AccountDetails};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows: Vec<Vec<String>> = find_issues(conn)?
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// `(issue, detail)` pairs for every stored account that breaks a balance,
/// credit or usage invariant.
pub fn find_issues(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut issues = Vec::new();
    for account in store::load_accounts(conn)? {
        check_account(&account, &mut issues);
    }
    Ok(issues)
}

fn check_account(account: &Account, issues: &mut Vec<(String, String)>) {
    let who = account.account_ref();
    let mut push =
        |issue: &str, detail: String| issues.push((issue.into(), format!("{}: {}", who, detail)));

    if account.stored_balance < Decimal::ZERO {
        push("negative_balance", format!("balance {}", account.stored_balance));
    }
    match &account.details {
        AccountDetails::Vault(rules) => {
            if let Some(cap) = rules.max_capacity {
                if account.stored_balance > cap {
                    push(
                        "vault_over_capacity",
                        format!("balance {} > capacity {}", account.stored_balance, cap),
                    );
                }
            }
            if let Some(min) = rules.min_balance {
                if account.stored_balance < min {
                    push(
                        "vault_below_minimum",
                        format!("balance {} < minimum {}", account.stored_balance, min),
                    );
                }
            }
            if let Some(limit) = rules.daily_withdrawal_limit {
                if rules.withdrawn_today > limit {
                    push(
                        "usage_over_limit",
                        format!("withdrawn today {} > {}", rules.withdrawn_today, limit),
                    );
                }
            }
        }
        AccountDetails::CreditCard(line) => {
            if line.current_balance < Decimal::ZERO || line.current_balance > line.credit_limit {
                push(
                    "credit_out_of_range",
                    format!("owed {} outside 0..={}", line.current_balance, line.credit_limit),
                );
            }
        }
        AccountDetails::EWallet(limits) | AccountDetails::PrepaidCard(limits) => {
            if let Some(limit) = limits.daily_limit {
                if limits.daily_used > limit {
                    push(
                        "usage_over_limit",
                        format!("daily used {} > {}", limits.daily_used, limit),
                    );
                }
            }
            if let Some(limit) = limits.monthly_limit {
                if limits.monthly_used > limit {
                    push(
                        "usage_over_limit",
                        format!("monthly used {} > {}", limits.monthly_used, limit),
                    );
                }
            }
        }
        AccountDetails::Bank => {}
    }
}
