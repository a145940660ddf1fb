// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyrail::errors::Rejection;
use moneyrail::ledger::EntryFilter;
use moneyrail::models::{Account, VaultRules};
use moneyrail::{cli, commands::importer, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "date,kind,from,to,amount,fee_fixed,fee_percent,commission,description";

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    store::insert_account(&conn, &Account::bank("a", "A", d("100"))).unwrap();
    store::insert_account(
        &conn,
        &Account::vault(
            "v",
            "V",
            d("0"),
            VaultRules {
                max_capacity: Some(d("50")),
                ..VaultRules::default()
            },
        ),
    )
    .unwrap();
    conn
}

fn csv_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn rejected_rows_do_not_stop_the_batch() {
    let mut conn = setup();
    let file = csv_file(&[
        "2025-06-01,transfer,bank:a,vault:v,30,1,,,save",
        "2025-06-02,transfer,bank:a,vault:v,30,,,,too much",
        "2025-06-03,withdrawal,bank:a,,10,,10,,cash",
    ]);
    let path = file.path().to_str().unwrap();
    let results = importer::import_movements(&mut conn, path).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_applied());
    assert_eq!(
        results[1].rejection,
        Some(Rejection::CapacityExceeded {
            capacity: d("50"),
            requested_balance: d("60"),
        })
    );
    assert!(results[2].is_applied());

    let a = store::load_account(&conn, &"bank:a".parse().unwrap()).unwrap().unwrap();
    assert_eq!(a.stored_balance, d("58"));
    let entries = store::query_entries(&conn, &EntryFilter::all(), None).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].description, "save");
    assert_eq!(entries[1].fee, d("1"));
}

#[test]
fn malformed_row_aborts_before_anything_is_applied() {
    let mut conn = setup();
    let file = csv_file(&[
        "2025-06-01,deposit,,bank:a,10,,,,",
        "06/02/2025,deposit,,bank:a,10,,,,",
    ]);
    let err = importer::import_movements(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid movement date '06/02/2025'"));
    assert!(store::query_entries(&conn, &EntryFilter::all(), None).unwrap().is_empty());
}

#[test]
fn kind_must_match_the_sides_given() {
    let mut conn = setup();
    let file = csv_file(&["2025-06-01,deposit,bank:a,,10,,,,"]);
    let err = importer::import_movements(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("does not match"));
}

#[test]
fn cli_path_argument_is_trimmed() {
    let mut conn = setup();
    let file = csv_file(&["2025-06-01,deposit,,bank:a,5.50,,,,gift"]);
    let padded = format!("  {}  ", file.path().to_str().unwrap());
    let matches = cli::build_cli().get_matches_from([
        "moneyrail", "import", "movements", "--path", &padded, "--json",
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let a = store::load_account(&conn, &"bank:a".parse().unwrap()).unwrap().unwrap();
    assert_eq!(a.stored_balance, d("105.50"));
}

#[test]
fn destination_limits_column_overrides_the_policy_per_row() {
    let mut conn = setup();
    let limits = moneyrail::models::UsageLimits {
        transaction_limit: Some(d("20")),
        ..Default::default()
    };
    store::insert_account(&conn, &Account::ewallet("w", "W", d("0"), limits)).unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{},destination_limits", HEADER).unwrap();
    writeln!(file, "2025-06-01,transfer,bank:a,ewallet:w,30,,,,,").unwrap();
    writeln!(file, "2025-06-02,transfer,bank:a,ewallet:w,30,,,,,true").unwrap();
    writeln!(file, "2025-06-03,deposit,,ewallet:w,25,,,,,no").unwrap();
    file.flush().unwrap();

    let results = importer::import_movements(&mut conn, file.path().to_str().unwrap()).unwrap();
    assert!(results[0].is_applied());
    assert_eq!(
        results[1].rejection,
        Some(Rejection::TransactionLimitExceeded {
            allowed: d("20"),
            requested: d("30"),
        })
    );
    assert!(results[2].is_applied());
    let wallet = store::load_account(&conn, &"ewallet:w".parse().unwrap()).unwrap().unwrap();
    assert_eq!(wallet.stored_balance, d("55"));
}

#[test]
fn bad_destination_limits_value_aborts_the_import() {
    let mut conn = setup();
    let file = csv_file(&["2025-06-01,deposit,,bank:a,10,,,,,sometimes"]);
    let err = importer::import_movements(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid value 'sometimes'"));
    assert!(store::query_entries(&conn, &EntryFilter::all(), None).unwrap().is_empty());
}
