// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneyrail::models::AccountDetails;
use moneyrail::{cli, commands::accounts, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneyrail", "account"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("account", sub)) => accounts::handle(conn, sub),
        _ => panic!("no account subcommand"),
    }
}

#[test]
fn add_each_kind_and_list_in_ref_order() {
    let mut conn = setup();
    run(&mut conn, &["add", "--kind", "bank", "--id", "main", "--name", "Main", "--balance", "1000"]).unwrap();
    run(
        &mut conn,
        &["add", "--kind", "ewallet", "--id", "pp", "--name", "PayPal", "--daily-limit", "300", "--tx-limit", "150"],
    )
    .unwrap();
    run(
        &mut conn,
        &["add", "--kind", "credit", "--id", "visa", "--name", "Visa", "--credit-limit", "10000", "--owed", "4000"],
    )
    .unwrap();
    run(
        &mut conn,
        &["add", "--kind", "vault", "--id", "safe", "--name", "Safe", "--balance", "50", "--max-capacity", "500"],
    )
    .unwrap();

    let rows = accounts::account_rows(&conn).unwrap();
    let refs: Vec<&str> = rows.iter().map(|r| r.account.as_str()).collect();
    assert_eq!(refs, vec!["bank:main", "vault:safe", "ewallet:pp", "credit:visa"]);

    let card = rows.iter().find(|r| r.account == "credit:visa").unwrap();
    assert_eq!(card.balance, "4000.00");
    assert_eq!(card.available, "6000.00");
    assert_eq!(card.headroom, "4000.00");

    let wallet = store::load_account(&conn, &"ewallet:pp".parse().unwrap())
        .unwrap()
        .unwrap();
    match wallet.details {
        AccountDetails::EWallet(limits) => {
            assert_eq!(limits.daily_limit, Some(d("300")));
            assert_eq!(limits.transaction_limit, Some(d("150")));
            assert_eq!(limits.monthly_limit, None);
        }
        other => panic!("unexpected details {:?}", other),
    }
}

#[test]
fn flags_that_do_not_apply_are_refused() {
    let mut conn = setup();
    let err = run(
        &mut conn,
        &["add", "--kind", "bank", "--id", "b", "--name", "B", "--daily-limit", "10"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("--daily-limit does not apply"));

    let err = run(&mut conn, &["add", "--kind", "credit", "--id", "c", "--name", "C"]).unwrap_err();
    assert!(err.to_string().contains("--credit-limit"));

    let err = run(&mut conn, &["add", "--kind", "bank", "--id", "a:b", "--name", "X"]).unwrap_err();
    assert!(err.to_string().contains("contain no ':'"));
    assert!(store::load_accounts(&conn).unwrap().is_empty());
}

#[test]
fn opening_state_must_respect_vault_and_card_bounds() {
    let mut conn = setup();
    assert!(
        run(
            &mut conn,
            &["add", "--kind", "vault", "--id", "v", "--name", "V", "--balance", "600", "--max-capacity", "500"],
        )
        .is_err()
    );
    assert!(
        run(
            &mut conn,
            &["add", "--kind", "credit", "--id", "c", "--name", "C", "--credit-limit", "100", "--owed", "150"],
        )
        .is_err()
    );
}

#[test]
fn duplicate_refs_are_rejected_but_ids_may_repeat_across_kinds() {
    let mut conn = setup();
    run(&mut conn, &["add", "--kind", "bank", "--id", "main", "--name", "Main"]).unwrap();
    assert!(run(&mut conn, &["add", "--kind", "bank", "--id", "main", "--name", "Again"]).is_err());
    run(&mut conn, &["add", "--kind", "vault", "--id", "main", "--name", "Main vault"]).unwrap();
    assert_eq!(store::load_accounts(&conn).unwrap().len(), 2);
}

#[test]
fn deactivate_activate_and_remove() {
    let mut conn = setup();
    run(&mut conn, &["add", "--kind", "bank", "--id", "main", "--name", "Main"]).unwrap();
    run(&mut conn, &["deactivate", "--account", "bank:main"]).unwrap();
    let acc = store::load_account(&conn, &"bank:main".parse().unwrap()).unwrap().unwrap();
    assert!(!acc.is_active);

    run(&mut conn, &["activate", "--account", "bank:main"]).unwrap();
    let acc = store::load_account(&conn, &"bank:main".parse().unwrap()).unwrap().unwrap();
    assert!(acc.is_active);

    run(&mut conn, &["rm", "--account", "bank:main"]).unwrap();
    assert!(run(&mut conn, &["rm", "--account", "bank:main"]).is_err());
    assert!(run(&mut conn, &["balance", "--account", "bank:nope"]).is_err());
}

#[test]
fn reset_usage_needs_a_period() {
    let mut conn = setup();
    assert!(run(&mut conn, &["reset-usage"]).is_err());
    run(&mut conn, &["reset-usage", "--daily", "--monthly"]).unwrap();
}

#[test]
fn negative_limits_and_floors_are_refused() {
    let mut conn = setup();
    let cases: [&[&str]; 7] = [
        &["add", "--kind", "vault", "--id", "v", "--name", "V", "--balance", "10", "--min-balance=-100"],
        &["add", "--kind", "vault", "--id", "v", "--name", "V", "--max-capacity=-1"],
        &["add", "--kind", "vault", "--id", "v", "--name", "V", "--daily-withdrawal-limit=-5"],
        &["add", "--kind", "ewallet", "--id", "w", "--name", "W", "--daily-limit=-1"],
        &["add", "--kind", "ewallet", "--id", "w", "--name", "W", "--monthly-limit=-1"],
        &["add", "--kind", "prepaid", "--id", "p", "--name", "P", "--tx-limit=-1"],
        &["add", "--kind", "credit", "--id", "c", "--name", "C", "--credit-limit=-100"],
    ];
    for args in cases {
        let err = run(&mut conn, args).unwrap_err();
        assert!(err.to_string().contains("cannot be negative"), "{:?}: {}", args, err);
    }
    assert!(store::load_accounts(&conn).unwrap().is_empty());
}

#[test]
fn sub_cent_figures_are_refused() {
    let mut conn = setup();
    let cases: [&[&str]; 3] = [
        &["add", "--kind", "bank", "--id", "b", "--name", "B", "--balance", "10.005"],
        &["add", "--kind", "ewallet", "--id", "w", "--name", "W", "--daily-limit", "0.001"],
        &["add", "--kind", "credit", "--id", "c", "--name", "C", "--credit-limit", "100", "--owed", "1.234"],
    ];
    for args in cases {
        let err = run(&mut conn, args).unwrap_err();
        assert!(err.to_string().contains("more than 2 decimal places"), "{:?}: {}", args, err);
    }
    run(&mut conn, &["add", "--kind", "bank", "--id", "b", "--name", "B", "--balance", "10.50"]).unwrap();
}

#[test]
fn vault_with_floor_cannot_be_withdrawn_below_it() {
    use moneyrail::config::EngineConfig;
    use moneyrail::engine::MovementRequest;

    let mut conn = setup();
    run(
        &mut conn,
        &["add", "--kind", "vault", "--id", "v", "--name", "V", "--balance", "10", "--min-balance", "0"],
    )
    .unwrap();
    let outcome = store::submit(
        &mut conn,
        &EngineConfig::default(),
        MovementRequest::withdrawal("vault:v".parse().unwrap(), d("60")),
    )
    .unwrap();
    assert!(!outcome.is_applied());
    let vault = store::load_account(&conn, &"vault:v".parse().unwrap()).unwrap().unwrap();
    assert_eq!(vault.stored_balance, d("10"));
}
