// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{EntryFilter, LedgerEntry, MovementKind};
use crate::models::AccountRef;
use crate::store;
use crate::utils::{fmt_money, fmt_opt_money, maybe_print_json, parse_timestamp, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn filter_from_args(sub: &clap::ArgMatches) -> Result<EntryFilter> {
    let mut filter = EntryFilter::all();
    if let Some(raw) = sub.get_one::<String>("account") {
        let account = raw
            .parse::<AccountRef>()
            .with_context(|| format!("Invalid account '{}'", raw.trim()))?;
        filter = filter.for_account(account);
    }
    if let Some(raw) = sub.get_one::<String>("kind") {
        filter = filter.of_kind(raw.parse::<MovementKind>()?);
    }
    let from = sub
        .get_one::<String>("from")
        .map(|s| parse_timestamp(s))
        .transpose()?;
    let until = sub
        .get_one::<String>("until")
        .map(|s| parse_timestamp(s))
        .transpose()?;
    Ok(filter.between(from, until))
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LedgerEntry>> {
    let filter = filter_from_args(sub)?;
    let limit = sub.get_one::<usize>("limit").copied();
    store::query_entries(conn, &filter, limit)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                    e.kind.to_string(),
                    e.source.as_ref().map(|r| r.to_string()).unwrap_or_default(),
                    e.destination.as_ref().map(|r| r.to_string()).unwrap_or_default(),
                    fmt_money(&e.amount),
                    fmt_money(&e.fee),
                    fmt_money(&e.commission),
                    fmt_opt_money(e.source_balance_after.as_ref()),
                    fmt_opt_money(e.destination_balance_after.as_ref()),
                    e.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "When", "Kind", "From", "To", "Amount", "Fee", "Comm.", "From after",
                    "To after", "Description",
                ],
                rows,
            )
        );
    }
    Ok(())
}
