// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{EngineConfig, parse_flag};
use crate::engine::{MovementOutcome, MovementRequest};
use crate::errors::Rejection;
use crate::fees::FeePolicy;
use crate::ledger::{EntryId, MovementKind};
use crate::models::AccountRef;
use crate::store;
use crate::utils::{maybe_print_json, parse_decimal, parse_opt_decimal, parse_timestamp, pretty_table};
use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("movements", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let results = import_movements(conn, path)?;
            print_results(sub, path, &results)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub entry_id: Option<EntryId>,
    pub rejection: Option<Rejection>,
}

impl ImportResult {
    pub fn is_applied(&self) -> bool {
        self.entry_id.is_some()
    }
}

fn field<'a>(rec: &'a StringRecord, idx: usize) -> &'a str {
    rec.get(idx).unwrap_or("").trim()
}

fn opt_ref(raw: &str) -> Result<Option<AccountRef>> {
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(raw.parse::<AccountRef>()?))
}

fn parse_row(rec: &StringRecord) -> Result<MovementRequest> {
    let date_raw = field(rec, 0);
    let timestamp = parse_timestamp(date_raw)
        .with_context(|| format!("Invalid movement date '{}'", date_raw))?;
    let kind: MovementKind = field(rec, 1).parse()?;
    let source = opt_ref(field(rec, 2))?;
    let destination = opt_ref(field(rec, 3))?;
    let implied = MovementKind::classify(source.as_ref(), destination.as_ref());
    if implied != Some(kind) {
        return Err(anyhow!(
            "Kind '{}' does not match from='{}' to='{}'",
            kind,
            field(rec, 2),
            field(rec, 3)
        ));
    }
    let amount_raw = field(rec, 4);
    let amount = parse_decimal(amount_raw)
        .with_context(|| format!("Invalid amount '{}'", amount_raw))?;
    let fee_policy = FeePolicy::from_parts(
        parse_opt_decimal(Some(field(rec, 5)))?,
        parse_opt_decimal(Some(field(rec, 6)))?,
    )?;
    let commission = parse_opt_decimal(Some(field(rec, 7)))?.unwrap_or(Decimal::ZERO);
    let mut request = MovementRequest::new(source, destination, amount)
        .with_fee(fee_policy)
        .with_commission(commission)
        .at(timestamp)
        .described(field(rec, 8));
    // Optional tenth column; blank keeps the stored policy.
    let override_raw = field(rec, 9);
    if !override_raw.is_empty() {
        request = request.count_destination_limits(parse_flag("destination_limits", override_raw)?);
    }
    Ok(request)
}

/// Parses the whole file first so a malformed row aborts before anything is
/// applied. Rows are then submitted one by one; a rejected row is reported
/// and the batch continues.
pub fn import_movements(conn: &mut Connection, path: &str) -> Result<Vec<ImportResult>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let mut requests = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let rec = result?;
        let request = parse_row(&rec).with_context(|| format!("Row {}", idx + 1))?;
        requests.push(request);
    }

    let config = EngineConfig::load(conn)?;
    let mut results = Vec::with_capacity(requests.len());
    for (idx, request) in requests.into_iter().enumerate() {
        let outcome = store::submit(conn, &config, request)?;
        results.push(match outcome {
            MovementOutcome::Applied(entry) => ImportResult {
                row: idx + 1,
                entry_id: Some(entry.id),
                rejection: None,
            },
            MovementOutcome::Rejected(reason) => ImportResult {
                row: idx + 1,
                entry_id: None,
                rejection: Some(reason),
            },
        });
    }
    let applied = results.iter().filter(|r| r.is_applied()).count();
    tracing::info!(path, applied, rejected = results.len() - applied, "import finished");
    Ok(results)
}

fn print_results(sub: &clap::ArgMatches, path: &str, results: &[ImportResult]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &results)? {
        return Ok(());
    }
    let rejected: Vec<Vec<String>> = results
        .iter()
        .filter_map(|r| {
            r.rejection
                .as_ref()
                .map(|reason| vec![r.row.to_string(), reason.to_string()])
        })
        .collect();
    let applied = results.len() - rejected.len();
    println!(
        "Imported movements from {}: {} applied, {} rejected",
        path,
        applied,
        rejected.len()
    );
    if !rejected.is_empty() {
        println!("{}", pretty_table(&["Row", "Reason"], rejected));
    }
    Ok(())
}
