// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyrail::config::{EngineConfig, KEY_DEST_LIMITS_PAYMENT};
use moneyrail::{cli, commands::settings, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneyrail", "config"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("config", sub)) => settings::handle(conn, sub),
        _ => panic!("no config subcommand"),
    }
}

#[test]
fn list_shows_effective_defaults() {
    let conn = setup();
    let rows = settings::settings_rows(&conn).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["limits.destination.deposit".to_string(), "true".to_string()],
            vec!["limits.destination.transfer".to_string(), "false".to_string()],
            vec!["limits.destination.payment".to_string(), "false".to_string()],
        ]
    );
}

#[test]
fn set_then_get_round_trips_through_settings() {
    let conn = setup();
    run(&conn, &["set", KEY_DEST_LIMITS_PAYMENT, "on"]).unwrap();
    assert!(EngineConfig::load(&conn).unwrap().destination_limits.payment);
    run(&conn, &["get", KEY_DEST_LIMITS_PAYMENT]).unwrap();
    run(&conn, &["list"]).unwrap();
}

#[test]
fn unknown_key_or_value_is_an_error() {
    let conn = setup();
    assert!(run(&conn, &["set", "limits.source.deposit", "true"]).is_err());
    assert!(run(&conn, &["set", KEY_DEST_LIMITS_PAYMENT, "sometimes"]).is_err());
    assert!(run(&conn, &["get", "nope"]).is_err());
}
