// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, EngineConfig, KNOWN_KEYS};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = EngineConfig::load(conn)?.get(key)?;
            println!("{} = {}", key, value);
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            config::store(conn, key, value)?;
            tracing::info!(key, "setting updated");
            println!("{} = {}", key, EngineConfig::load(conn)?.get(key)?);
        }
        Some(("list", _)) => {
            let rows = settings_rows(conn)?;
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}

/// Every known key with its effective value.
pub fn settings_rows(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let cfg = EngineConfig::load(conn)?;
    KNOWN_KEYS
        .iter()
        .map(|key| Ok(vec![key.to_string(), cfg.get(key)?.to_string()]))
        .collect()
}
