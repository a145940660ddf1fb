// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite host for the engine: account rows, the ledger table, and
//! transactional submission.

use crate::config::EngineConfig;
use crate::engine::{Engine, MovementOutcome, MovementRequest};
use crate::ledger::{EntryFilter, EntryId, Ledger, LedgerEntry, MovementKind};
use crate::models::{
    Account, AccountDetails, AccountKind, AccountRef, CreditLine, UsageLimits, VaultRules,
};
use crate::registry::Registry;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;

const ACCOUNT_COLUMNS: &str = "kind, id, display_name, stored_balance, is_active, \
     max_capacity, min_balance, daily_withdrawal_limit, withdrawn_today, \
     daily_limit, daily_used, monthly_limit, monthly_used, transaction_limit, \
     credit_limit, current_balance";

const ENTRY_COLUMNS: &str = "id, kind, source_ref, destination_ref, amount, fee, commission, \
     total_debited, total_credited, source_balance_after, destination_balance_after, \
     timestamp, description";

/// Fixed-width UTC form so timestamps compare correctly as text.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn dec(field: &str, raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}' in database", field, raw))
}

fn opt_dec(field: &str, raw: Option<String>) -> Result<Option<Decimal>> {
    raw.map(|s| dec(field, &s)).transpose()
}

struct AccountRow {
    kind: String,
    id: String,
    display_name: String,
    stored_balance: String,
    is_active: bool,
    max_capacity: Option<String>,
    min_balance: Option<String>,
    daily_withdrawal_limit: Option<String>,
    withdrawn_today: String,
    daily_limit: Option<String>,
    daily_used: String,
    monthly_limit: Option<String>,
    monthly_used: String,
    transaction_limit: Option<String>,
    credit_limit: Option<String>,
    current_balance: String,
}

impl AccountRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            kind: r.get(0)?,
            id: r.get(1)?,
            display_name: r.get(2)?,
            stored_balance: r.get(3)?,
            is_active: r.get(4)?,
            max_capacity: r.get(5)?,
            min_balance: r.get(6)?,
            daily_withdrawal_limit: r.get(7)?,
            withdrawn_today: r.get(8)?,
            daily_limit: r.get(9)?,
            daily_used: r.get(10)?,
            monthly_limit: r.get(11)?,
            monthly_used: r.get(12)?,
            transaction_limit: r.get(13)?,
            credit_limit: r.get(14)?,
            current_balance: r.get(15)?,
        })
    }

    fn into_account(self) -> Result<Account> {
        let kind: AccountKind = self.kind.parse()?;
        let usage = || -> Result<UsageLimits> {
            Ok(UsageLimits {
                daily_limit: opt_dec("daily_limit", self.daily_limit.clone())?,
                daily_used: dec("daily_used", &self.daily_used)?,
                monthly_limit: opt_dec("monthly_limit", self.monthly_limit.clone())?,
                monthly_used: dec("monthly_used", &self.monthly_used)?,
                transaction_limit: opt_dec("transaction_limit", self.transaction_limit.clone())?,
            })
        };
        let details = match kind {
            AccountKind::Bank => AccountDetails::Bank,
            AccountKind::Vault => AccountDetails::Vault(VaultRules {
                max_capacity: opt_dec("max_capacity", self.max_capacity.clone())?,
                min_balance: opt_dec("min_balance", self.min_balance.clone())?,
                daily_withdrawal_limit: opt_dec(
                    "daily_withdrawal_limit",
                    self.daily_withdrawal_limit.clone(),
                )?,
                withdrawn_today: dec("withdrawn_today", &self.withdrawn_today)?,
            }),
            AccountKind::EWallet => AccountDetails::EWallet(usage()?),
            AccountKind::PrepaidCard => AccountDetails::PrepaidCard(usage()?),
            AccountKind::CreditCard => AccountDetails::CreditCard(CreditLine {
                credit_limit: opt_dec("credit_limit", self.credit_limit.clone())?
                    .ok_or_else(|| anyhow!("Credit card '{}' has no credit_limit", self.id))?,
                current_balance: dec("current_balance", &self.current_balance)?,
            }),
        };
        Ok(Account {
            stored_balance: dec("stored_balance", &self.stored_balance)?,
            id: self.id,
            display_name: self.display_name,
            is_active: self.is_active,
            details,
        })
    }
}

/// Column values for the kind-specific part of an account, in
/// `ACCOUNT_COLUMNS` order starting at `max_capacity`.
fn detail_columns(account: &Account) -> [Option<String>; 11] {
    let s = |d: &Decimal| Some(d.to_string());
    let o = |d: &Option<Decimal>| d.as_ref().map(|v| v.to_string());
    let zero = || Some("0".to_string());
    match &account.details {
        AccountDetails::Bank => [
            None, None, None, zero(), None, zero(), None, zero(), None, None, zero(),
        ],
        AccountDetails::Vault(v) => [
            o(&v.max_capacity),
            o(&v.min_balance),
            o(&v.daily_withdrawal_limit),
            s(&v.withdrawn_today),
            None,
            zero(),
            None,
            zero(),
            None,
            None,
            zero(),
        ],
        AccountDetails::EWallet(l) | AccountDetails::PrepaidCard(l) => [
            None,
            None,
            None,
            zero(),
            o(&l.daily_limit),
            s(&l.daily_used),
            o(&l.monthly_limit),
            s(&l.monthly_used),
            o(&l.transaction_limit),
            None,
            zero(),
        ],
        AccountDetails::CreditCard(c) => [
            None,
            None,
            None,
            zero(),
            None,
            zero(),
            None,
            zero(),
            None,
            s(&c.credit_limit),
            s(&c.current_balance),
        ],
    }
}

pub fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    let c = detail_columns(account);
    conn.execute(
        &format!(
            "INSERT INTO accounts({}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            ACCOUNT_COLUMNS
        ),
        params![
            account.kind().as_str(),
            account.id,
            account.display_name,
            account.stored_balance.to_string(),
            account.is_active,
            c[0],
            c[1],
            c[2],
            c[3],
            c[4],
            c[5],
            c[6],
            c[7],
            c[8],
            c[9],
            c[10],
        ],
    )
    .with_context(|| format!("Add account {}", account.account_ref()))?;
    Ok(())
}

/// Writes back every mutable field of an existing account.
pub fn save_account(conn: &Connection, account: &Account) -> Result<()> {
    let c = detail_columns(account);
    let changed = conn.execute(
        "UPDATE accounts SET display_name=?3, stored_balance=?4, is_active=?5,
            max_capacity=?6, min_balance=?7, daily_withdrawal_limit=?8, withdrawn_today=?9,
            daily_limit=?10, daily_used=?11, monthly_limit=?12, monthly_used=?13,
            transaction_limit=?14, credit_limit=?15, current_balance=?16
         WHERE kind=?1 AND id=?2",
        params![
            account.kind().as_str(),
            account.id,
            account.display_name,
            account.stored_balance.to_string(),
            account.is_active,
            c[0],
            c[1],
            c[2],
            c[3],
            c[4],
            c[5],
            c[6],
            c[7],
            c[8],
            c[9],
            c[10],
        ],
    )?;
    if changed == 0 {
        return Err(anyhow!("Account {} not found", account.account_ref()));
    }
    Ok(())
}

pub fn load_account(conn: &Connection, account: &AccountRef) -> Result<Option<Account>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {} FROM accounts WHERE kind=?1 AND id=?2",
                ACCOUNT_COLUMNS
            ),
            params![account.kind.as_str(), account.id],
            AccountRow::read,
        )
        .optional()?;
    row.map(AccountRow::into_account).transpose()
}

/// Every account, in `AccountRef` order.
pub fn load_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM accounts", ACCOUNT_COLUMNS))?;
    let rows = stmt.query_map([], AccountRow::read)?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?.into_account()?);
    }
    accounts.sort_by_key(|a| a.account_ref());
    Ok(accounts)
}

pub fn delete_account(conn: &Connection, account: &AccountRef) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM accounts WHERE kind=?1 AND id=?2",
        params![account.kind.as_str(), account.id],
    )?;
    Ok(n > 0)
}

pub fn set_active(conn: &Connection, account: &AccountRef, active: bool) -> Result<bool> {
    let n = conn.execute(
        "UPDATE accounts SET is_active=?3 WHERE kind=?1 AND id=?2",
        params![account.kind.as_str(), account.id, active],
    )?;
    Ok(n > 0)
}

/// Clears usage counters through the engine and writes them back.
pub fn reset_usage(conn: &mut Connection, daily: bool, monthly: bool) -> Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let engine = Engine::with_accounts(EngineConfig::default(), load_accounts(&tx)?);
    if daily {
        engine.reset_daily_usage();
    }
    if monthly {
        engine.reset_monthly_usage();
    }
    let accounts = engine.accounts();
    for account in &accounts {
        save_account(&tx, account)?;
    }
    tx.commit()?;
    Ok(accounts.len())
}

pub fn last_entry_id(conn: &Connection) -> Result<EntryId> {
    let id: Option<i64> = conn.query_row("SELECT MAX(id) FROM ledger_entries", [], |r| r.get(0))?;
    Ok(EntryId(id.unwrap_or(0).max(0) as u64))
}

pub fn append_entry(conn: &Connection, entry: &LedgerEntry) -> Result<()> {
    let money = |d: &Decimal| d.to_string();
    conn.execute(
        &format!(
            "INSERT INTO ledger_entries({}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
            ENTRY_COLUMNS
        ),
        params![
            entry.id.0 as i64,
            entry.kind.as_str(),
            entry.source.as_ref().map(|r| r.to_string()),
            entry.destination.as_ref().map(|r| r.to_string()),
            money(&entry.amount),
            money(&entry.fee),
            money(&entry.commission),
            money(&entry.total_debited),
            money(&entry.total_credited),
            entry.source_balance_after.as_ref().map(money),
            entry.destination_balance_after.as_ref().map(money),
            format_timestamp(&entry.timestamp),
            entry.description,
        ],
    )
    .with_context(|| format!("Record ledger entry {}", entry.id))?;
    Ok(())
}

type EntryRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn read_entry(r: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
        r.get(10)?,
        r.get(11)?,
        r.get(12)?,
    ))
}

fn entry_from_row(row: EntryRow) -> Result<LedgerEntry> {
    let (id, kind, src, dst, amount, fee, commission, debited, credited, src_after, dst_after, ts, description) =
        row;
    let parse_ref = |s: Option<String>| -> Result<Option<AccountRef>> {
        Ok(s.map(|v| v.parse::<AccountRef>()).transpose()?)
    };
    Ok(LedgerEntry {
        id: EntryId(id as u64),
        kind: kind.parse::<MovementKind>()?,
        source: parse_ref(src)?,
        destination: parse_ref(dst)?,
        amount: dec("amount", &amount)?,
        fee: dec("fee", &fee)?,
        commission: dec("commission", &commission)?,
        total_debited: dec("total_debited", &debited)?,
        total_credited: dec("total_credited", &credited)?,
        source_balance_after: opt_dec("source_balance_after", src_after)?,
        destination_balance_after: opt_dec("destination_balance_after", dst_after)?,
        timestamp: DateTime::parse_from_rfc3339(&ts)
            .with_context(|| format!("Invalid timestamp '{}' in ledger", ts))?
            .with_timezone(&Utc),
        description,
    })
}

/// Entries matching `filter` in insertion order. With `limit`, only the most
/// recent `limit` matches are returned.
pub fn query_entries(
    conn: &Connection,
    filter: &EntryFilter,
    limit: Option<usize>,
) -> Result<Vec<LedgerEntry>> {
    let mut sql = format!("SELECT {} FROM ledger_entries WHERE 1=1", ENTRY_COLUMNS);
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(account) = &filter.account {
        sql.push_str(" AND (source_ref=? OR destination_ref=?)");
        params_vec.push(account.to_string());
        params_vec.push(account.to_string());
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind=?");
        params_vec.push(kind.as_str().into());
    }
    if let Some(from) = &filter.from {
        sql.push_str(" AND timestamp>=?");
        params_vec.push(format_timestamp(from));
    }
    if let Some(until) = &filter.until {
        sql.push_str(" AND timestamp<?");
        params_vec.push(format_timestamp(until));
    }
    sql.push_str(" ORDER BY id DESC");
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), read_entry)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(entry_from_row(row?)?);
    }
    entries.reverse();
    Ok(entries)
}

/// Runs one movement inside an IMMEDIATE transaction: the involved accounts
/// are read under the write lock, validated and applied by the engine, and
/// written back with the ledger row before commit. Rejections roll back.
pub fn submit(
    conn: &mut Connection,
    config: &EngineConfig,
    request: MovementRequest,
) -> Result<MovementOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut accounts = Vec::new();
    for account in request.source.iter().chain(request.destination.iter()) {
        if let Some(loaded) = load_account(&tx, account)? {
            accounts.push(loaded);
        }
    }
    let engine = Engine::from_parts(
        *config,
        Registry::from_accounts(accounts),
        Ledger::starting_after(last_entry_id(&tx)?),
    );
    let outcome = engine.submit(request);
    if let MovementOutcome::Applied(entry) = &outcome {
        for account in entry.source.iter().chain(entry.destination.iter()) {
            let updated = engine
                .account(account)
                .with_context(|| format!("Account {} vanished during movement", account))?;
            save_account(&tx, &updated)?;
        }
        append_entry(&tx, entry)?;
        tx.commit()?;
    }
    Ok(outcome)
}
