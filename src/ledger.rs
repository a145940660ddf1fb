// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Append-only record of applied movements.

use crate::errors::ParseError;
use crate::models::{AccountKind, AccountRef};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    Payment,
    Transfer,
}

impl MovementKind {
    /// Derives the kind from which sides are present. Paying into a credit
    /// card is a payment; any other two-sided movement is a transfer.
    pub fn classify(source: Option<&AccountRef>, destination: Option<&AccountRef>) -> Option<Self> {
        match (source, destination) {
            (None, None) => None,
            (None, Some(_)) => Some(MovementKind::Deposit),
            (Some(_), None) => Some(MovementKind::Withdrawal),
            (Some(_), Some(dst)) if dst.kind == AccountKind::CreditCard => {
                Some(MovementKind::Payment)
            }
            (Some(_), Some(_)) => Some(MovementKind::Transfer),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Deposit => "deposit",
            MovementKind::Withdrawal => "withdrawal",
            MovementKind::Payment => "payment",
            MovementKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(MovementKind::Deposit),
            "withdrawal" | "withdraw" => Ok(MovementKind::Withdrawal),
            "payment" | "pay" => Ok(MovementKind::Payment),
            "transfer" => Ok(MovementKind::Transfer),
            other => Err(ParseError::UnknownMovementKind(other.to_string())),
        }
    }
}

/// One applied movement. Balances after are post-mutation figures; for a
/// credit card that is the amount owed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub kind: MovementKind,
    #[serde(rename = "source_ref")]
    pub source: Option<AccountRef>,
    #[serde(rename = "destination_ref")]
    pub destination: Option<AccountRef>,
    pub amount: Decimal,
    pub fee: Decimal,
    pub commission: Decimal,
    pub total_debited: Decimal,
    pub total_credited: Decimal,
    pub source_balance_after: Option<Decimal>,
    pub destination_balance_after: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl LedgerEntry {
    pub fn touches(&self, account: &AccountRef) -> bool {
        self.source.as_ref() == Some(account) || self.destination.as_ref() == Some(account)
    }
}

/// Read filter for reporting. `from` is inclusive, `until` exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub account: Option<AccountRef>,
    pub kind: Option<MovementKind>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EntryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, account: AccountRef) -> Self {
        self.account = Some(account);
        self
    }

    pub fn of_kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.until = until;
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(account) = &self.account {
            if !entry.touches(account) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp >= until {
                return false;
            }
        }
        true
    }
}

/// In-memory append log. Ids are assigned on [`Ledger::record`] and strictly
/// increase; there is no update or delete.
#[derive(Debug, Clone)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::starting_after(EntryId(0))
    }

    /// Empty ledger continuing an externally stored sequence.
    pub fn starting_after(last: EntryId) -> Self {
        Self {
            entries: Vec::new(),
            next_id: last.0 + 1,
        }
    }

    pub fn next_id(&self) -> EntryId {
        EntryId(self.next_id)
    }

    /// Appends `entry`, stamping it with the next id.
    pub fn record(&mut self, mut entry: LedgerEntry) -> EntryId {
        let id = self.next_id();
        entry.id = id;
        self.entries.push(entry);
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn list(&self, filter: &EntryFilter) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn r(s: &str) -> AccountRef {
        s.parse().unwrap()
    }

    fn entry(kind: MovementKind, source: Option<&str>, dest: Option<&str>, day: u32) -> LedgerEntry {
        LedgerEntry {
            id: EntryId(0),
            kind,
            source: source.map(r),
            destination: dest.map(r),
            amount: Decimal::TEN,
            fee: Decimal::ZERO,
            commission: Decimal::ZERO,
            total_debited: Decimal::TEN,
            total_credited: Decimal::TEN,
            source_balance_after: None,
            destination_balance_after: None,
            timestamp: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            description: String::new(),
        }
    }

    #[test]
    fn classify_by_shape() {
        let bank = r("bank:a");
        let card = r("credit:c");
        assert_eq!(MovementKind::classify(None, None), None);
        assert_eq!(MovementKind::classify(None, Some(&bank)), Some(MovementKind::Deposit));
        assert_eq!(MovementKind::classify(Some(&bank), None), Some(MovementKind::Withdrawal));
        assert_eq!(
            MovementKind::classify(Some(&bank), Some(&card)),
            Some(MovementKind::Payment)
        );
        assert_eq!(
            MovementKind::classify(Some(&card), Some(&bank)),
            Some(MovementKind::Transfer)
        );
    }

    #[test]
    fn record_assigns_increasing_ids() {
        let mut ledger = Ledger::starting_after(EntryId(41));
        let a = ledger.record(entry(MovementKind::Deposit, None, Some("bank:a"), 1));
        let b = ledger.record(entry(MovementKind::Deposit, None, Some("bank:a"), 2));
        assert_eq!(a, EntryId(42));
        assert_eq!(b, EntryId(43));
        assert_eq!(ledger.get(b).unwrap().timestamp.format("%d").to_string(), "02");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn list_filters_by_account_kind_and_time() {
        let mut ledger = Ledger::new();
        ledger.record(entry(MovementKind::Deposit, None, Some("bank:a"), 1));
        ledger.record(entry(MovementKind::Transfer, Some("bank:a"), Some("vault:v"), 2));
        ledger.record(entry(MovementKind::Withdrawal, Some("vault:v"), None, 3));

        let vault = ledger.list(&EntryFilter::all().for_account(r("vault:v")));
        assert_eq!(vault.len(), 2);

        let transfers = ledger.list(&EntryFilter::all().of_kind(MovementKind::Transfer));
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].id, EntryId(2));

        let window = ledger.list(&EntryFilter::all().between(
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap()),
        ));
        assert_eq!(window.iter().map(|e| e.id).collect::<Vec<_>>(), vec![EntryId(2)]);
    }

    #[test]
    fn persisted_shape_uses_ref_field_names() {
        let mut ledger = Ledger::new();
        ledger.record(entry(MovementKind::Transfer, Some("bank:a"), Some("vault:v"), 2));
        let v = serde_json::to_value(&ledger.entries()[0]).unwrap();
        assert_eq!(v["source_ref"], "bank:a");
        assert_eq!(v["destination_ref"], "vault:v");
        assert_eq!(v["kind"], "transfer");
        assert_eq!(v["amount"], "10");
    }
}
