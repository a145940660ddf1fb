// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let midnight = parse_date(s)?
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date '{}'", s))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parses an optional money column; empty text means "not set".
pub fn parse_opt_decimal(s: Option<&str>) -> Result<Option<Decimal>> {
    match s.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(parse_decimal(v)?)),
        None => Ok(None),
    }
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn fmt_opt_money(d: Option<&Decimal>) -> String {
    d.map(fmt_money).unwrap_or_else(|| "-".to_string())
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_accept_dates_and_rfc3339() {
        let day = parse_timestamp("2025-04-02").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-04-02T00:00:00+00:00");
        let exact = parse_timestamp("2025-04-02T10:15:00+02:00").unwrap();
        assert_eq!(exact.to_rfc3339(), "2025-04-02T08:15:00+00:00");
        assert!(parse_timestamp("02/04/2025").is_err());
    }

    #[test]
    fn optional_decimals_treat_blank_as_unset() {
        assert_eq!(parse_opt_decimal(Some("  ")).unwrap(), None);
        assert_eq!(parse_opt_decimal(None).unwrap(), None);
        assert_eq!(
            parse_opt_decimal(Some(" 12.50 ")).unwrap(),
            Some(Decimal::new(1250, 2))
        );
        assert!(parse_opt_decimal(Some("abc")).is_err());
    }

    #[test]
    fn money_formats_with_two_places() {
        assert_eq!(fmt_money(&Decimal::from(5)), "5.00");
        assert_eq!(fmt_opt_money(None), "-");
    }
}
