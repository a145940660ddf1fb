// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyrail::config::EngineConfig;
use moneyrail::engine::MovementRequest;
use moneyrail::ledger::MovementKind;
use moneyrail::models::Account;
use moneyrail::utils::parse_timestamp;
use moneyrail::{cli, commands::ledger, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Three movements on consecutive days: deposit to A, A -> B, withdraw from B.
fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    store::insert_account(&conn, &Account::bank("a", "A", d("0"))).unwrap();
    store::insert_account(&conn, &Account::bank("b", "B", d("0"))).unwrap();
    let cfg = EngineConfig::default();
    let requests = [
        MovementRequest::deposit("bank:a".parse().unwrap(), d("100"))
            .at(parse_timestamp("2025-05-01").unwrap()),
        MovementRequest::transfer("bank:a".parse().unwrap(), "bank:b".parse().unwrap(), d("40"))
            .at(parse_timestamp("2025-05-02").unwrap()),
        MovementRequest::withdrawal("bank:b".parse().unwrap(), d("10"))
            .at(parse_timestamp("2025-05-03").unwrap()),
    ];
    for req in requests {
        assert!(store::submit(&mut conn, &cfg, req).unwrap().is_applied());
    }
    conn
}

fn query(conn: &Connection, args: &[&str]) -> Vec<u64> {
    let mut argv = vec!["moneyrail", "ledger", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, ledger_m) = matches.subcommand().unwrap();
    let (_, list_m) = ledger_m.subcommand().unwrap();
    ledger::query_rows(conn, list_m)
        .unwrap()
        .iter()
        .map(|e| e.id.0)
        .collect()
}

#[test]
fn filters_by_account_and_kind() {
    let conn = setup();
    assert_eq!(query(&conn, &[]), vec![1, 2, 3]);
    assert_eq!(query(&conn, &["--account", "bank:a"]), vec![1, 2]);
    assert_eq!(query(&conn, &["--account", "bank:b"]), vec![2, 3]);
    assert_eq!(query(&conn, &["--kind", "withdrawal"]), vec![3]);
}

#[test]
fn time_range_is_half_open() {
    let conn = setup();
    assert_eq!(query(&conn, &["--from", "2025-05-02"]), vec![2, 3]);
    assert_eq!(query(&conn, &["--until", "2025-05-03"]), vec![1, 2]);
    assert_eq!(
        query(&conn, &["--from", "2025-05-02", "--until", "2025-05-02T00:00:01Z"]),
        vec![2]
    );
}

#[test]
fn limit_keeps_latest_in_order() {
    let conn = setup();
    assert_eq!(query(&conn, &["--limit", "2"]), vec![2, 3]);
}

#[test]
fn entries_record_balances_after() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from(["moneyrail", "ledger", "list", "--kind", "transfer"]);
    let (_, ledger_m) = matches.subcommand().unwrap();
    let (_, list_m) = ledger_m.subcommand().unwrap();
    let rows = ledger::query_rows(&conn, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, MovementKind::Transfer);
    assert_eq!(rows[0].source_balance_after, Some(d("60")));
    assert_eq!(rows[0].destination_balance_after, Some(d("40")));
}

#[test]
fn bad_filters_are_errors() {
    let conn = setup();
    for args in [["--account", "nope"], ["--kind", "refund"], ["--from", "yesterday"]] {
        let mut argv = vec!["moneyrail", "ledger", "list"];
        argv.extend_from_slice(&args);
        let matches = cli::build_cli().get_matches_from(argv);
        let (_, ledger_m) = matches.subcommand().unwrap();
        let (_, list_m) = ledger_m.subcommand().unwrap();
        assert!(ledger::query_rows(&conn, list_m).is_err());
    }
}

#[test]
fn ledger_rows_cannot_be_rewritten() {
    let conn = setup();
    assert!(conn.execute("UPDATE ledger_entries SET amount='1' WHERE id=1", []).is_err());
    assert!(conn.execute("DELETE FROM ledger_entries WHERE id=1", []).is_err());
    assert_eq!(query(&conn, &[]).len(), 3);
}
