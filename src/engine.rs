// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Movement orchestration.
//!
//! A request is validated and applied as one step while the locks of every
//! involved account are held, so no other movement can validate against a
//! balance that is about to change. Two-account movements lock in
//! `AccountRef` order. A rejection leaves every account and the ledger
//! untouched.

use crate::balance::{self, Role};
use crate::config::EngineConfig;
use crate::errors::Rejection;
use crate::fees::{FeePolicy, compute_fee, has_money_scale, round_money};
use crate::ledger::{EntryFilter, Ledger, LedgerEntry, MovementKind};
use crate::limits;
use crate::models::{Account, AccountDetails, AccountRef};
use crate::registry::{AccountCell, Registry};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MovementRequest {
    pub source: Option<AccountRef>,
    pub destination: Option<AccountRef>,
    pub amount: Decimal,
    pub fee_policy: FeePolicy,
    /// Added to the destination only; never taken from the source.
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Overrides [`EngineConfig::destination_limits`] for this request.
    pub destination_limits: Option<bool>,
}

impl MovementRequest {
    pub fn new(source: Option<AccountRef>, destination: Option<AccountRef>, amount: Decimal) -> Self {
        Self {
            source,
            destination,
            amount,
            fee_policy: FeePolicy::None,
            commission: Decimal::ZERO,
            timestamp: Utc::now(),
            description: String::new(),
            destination_limits: None,
        }
    }

    pub fn deposit(destination: AccountRef, amount: Decimal) -> Self {
        Self::new(None, Some(destination), amount)
    }

    pub fn withdrawal(source: AccountRef, amount: Decimal) -> Self {
        Self::new(Some(source), None, amount)
    }

    pub fn transfer(source: AccountRef, destination: AccountRef, amount: Decimal) -> Self {
        Self::new(Some(source), Some(destination), amount)
    }

    pub fn with_fee(mut self, policy: FeePolicy) -> Self {
        self.fee_policy = policy;
        self
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn count_destination_limits(mut self, count: bool) -> Self {
        self.destination_limits = Some(count);
        self
    }

    pub fn kind(&self) -> Option<MovementKind> {
        MovementKind::classify(self.source.as_ref(), self.destination.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovementOutcome {
    Applied(LedgerEntry),
    Rejected(Rejection),
}

impl MovementOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MovementOutcome::Applied(_))
    }

    pub fn entry(&self) -> Option<&LedgerEntry> {
        match self {
            MovementOutcome::Applied(entry) => Some(entry),
            MovementOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            MovementOutcome::Applied(_) => None,
            MovementOutcome::Rejected(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<LedgerEntry, Rejection> {
        match self {
            MovementOutcome::Applied(entry) => Ok(entry),
            MovementOutcome::Rejected(reason) => Err(reason),
        }
    }
}

/// Amounts derived from a request once its shape has been validated.
struct Totals {
    kind: MovementKind,
    amount: Decimal,
    fee: Decimal,
    commission: Decimal,
    total_debit: Decimal,
    total_credit: Decimal,
}

#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    registry: Registry,
    ledger: Mutex<Ledger>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_parts(config, Registry::new(), Ledger::new())
    }

    pub fn from_parts(config: EngineConfig, registry: Registry, ledger: Ledger) -> Self {
        Self {
            config,
            registry,
            ledger: Mutex::new(ledger),
        }
    }

    pub fn with_accounts(config: EngineConfig, accounts: impl IntoIterator<Item = Account>) -> Self {
        Self::from_parts(config, Registry::from_accounts(accounts), Ledger::new())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a new account or replaces an existing one.
    pub fn open_account(&self, account: Account) -> Option<Account> {
        self.registry.insert(account)
    }

    pub fn close_account(&self, account: &AccountRef) -> Option<Account> {
        self.registry.remove(account)
    }

    pub fn account(&self, account: &AccountRef) -> Option<Account> {
        self.registry.snapshot(account)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.registry.snapshots()
    }

    pub fn get_usable_balance(&self, account: &AccountRef) -> Result<Decimal, Rejection> {
        let snapshot = self
            .registry
            .snapshot(account)
            .ok_or_else(|| Rejection::UnknownAccount {
                account: account.clone(),
            })?;
        Ok(balance::usable_balance(&snapshot, Role::Source))
    }

    pub fn list_entries(&self, filter: &EntryFilter) -> Vec<LedgerEntry> {
        self.ledger.lock().list(filter)
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.lock().len()
    }

    pub fn reset_daily_usage(&self) {
        self.registry.for_each_mut(limits::reset_daily);
        info!("daily usage counters reset");
    }

    pub fn reset_monthly_usage(&self) {
        self.registry.for_each_mut(limits::reset_monthly);
        info!("monthly usage counters reset");
    }

    /// Validates and, if every check passes, applies one movement.
    pub fn submit(&self, request: MovementRequest) -> MovementOutcome {
        match self.execute(&request) {
            Ok(entry) => {
                info!(
                    id = entry.id.0,
                    kind = %entry.kind,
                    source = ?request.source.as_ref().map(|r| r.to_string()),
                    destination = ?request.destination.as_ref().map(|r| r.to_string()),
                    amount = %entry.amount,
                    fee = %entry.fee,
                    commission = %entry.commission,
                    "movement applied"
                );
                MovementOutcome::Applied(entry)
            }
            Err(reason) => {
                warn!(
                    source = ?request.source.as_ref().map(|r| r.to_string()),
                    destination = ?request.destination.as_ref().map(|r| r.to_string()),
                    amount = %request.amount,
                    %reason,
                    "movement rejected"
                );
                MovementOutcome::Rejected(reason)
            }
        }
    }

    fn execute(&self, request: &MovementRequest) -> Result<LedgerEntry, Rejection> {
        let totals = validate_shape(request)?;

        let source_cell = request
            .source
            .as_ref()
            .map(|r| self.resolve(r))
            .transpose()?;
        let destination_cell = request
            .destination
            .as_ref()
            .map(|r| self.resolve(r))
            .transpose()?;

        let source_first = match (&request.source, &request.destination) {
            (Some(src), Some(dst)) => src < dst,
            _ => true,
        };
        let (mut source, mut destination) =
            lock_in_order(source_cell.as_ref(), destination_cell.as_ref(), source_first);

        if let Some(acc) = source.as_deref() {
            ensure_active(acc)?;
        }
        if let Some(acc) = destination.as_deref() {
            ensure_active(acc)?;
        }

        let count_destination = request
            .destination_limits
            .unwrap_or_else(|| self.config.destination_limits.applies_to(totals.kind));

        if let Some(acc) = source.as_deref() {
            let available = balance::usable_balance(acc, Role::Source);
            if available < totals.total_debit {
                return Err(Rejection::InsufficientBalance {
                    available,
                    required: totals.total_debit,
                });
            }
            limits::check(acc, Role::Source, totals.total_debit)?;
        }
        if let Some(acc) = destination.as_deref() {
            balance::check_credit(acc, totals.total_credit)?;
            if count_destination {
                limits::check(acc, Role::Destination, totals.total_credit)?;
            }
        }

        debug!(
            total_debit = %totals.total_debit,
            total_credit = %totals.total_credit,
            count_destination,
            "checks passed, applying"
        );

        // Both post-movement figures are computed before either account
        // changes, so an unrepresentable result rejects with nothing applied.
        let source_after = source
            .as_deref()
            .map(|acc| settled_figure(acc, Role::Source, totals.total_debit))
            .transpose()?;
        let destination_after = destination
            .as_deref()
            .map(|acc| settled_figure(acc, Role::Destination, totals.total_credit))
            .transpose()?;

        let source_balance_after = source.as_deref_mut().zip(source_after).map(|(acc, after)| {
            if limits::tracks_usage(acc, Role::Source) {
                limits::record_usage(acc, Role::Source, totals.total_debit);
            }
            set_figure(acc, after);
            acc.balance_figure()
        });
        let destination_balance_after = destination
            .as_deref_mut()
            .zip(destination_after)
            .map(|(acc, after)| {
                if count_destination && limits::tracks_usage(acc, Role::Destination) {
                    limits::record_usage(acc, Role::Destination, totals.total_credit);
                }
                set_figure(acc, after);
                acc.balance_figure()
            });

        let mut ledger = self.ledger.lock();
        let entry = LedgerEntry {
            id: ledger.next_id(),
            kind: totals.kind,
            source: request.source.clone(),
            destination: request.destination.clone(),
            amount: totals.amount,
            fee: totals.fee,
            commission: totals.commission,
            total_debited: totals.total_debit,
            total_credited: totals.total_credit,
            source_balance_after,
            destination_balance_after,
            timestamp: request.timestamp,
            description: request.description.clone(),
        };
        ledger.record(entry.clone());
        Ok(entry)
    }

    fn resolve(&self, account: &AccountRef) -> Result<AccountCell, Rejection> {
        self.registry
            .cell(account)
            .ok_or_else(|| Rejection::UnknownAccount {
                account: account.clone(),
            })
    }
}

fn validate_shape(request: &MovementRequest) -> Result<Totals, Rejection> {
    if request.amount <= Decimal::ZERO || !has_money_scale(request.amount) {
        return Err(Rejection::InvalidAmount {
            amount: request.amount,
        });
    }
    if !request.fee_policy.is_valid() {
        return Err(Rejection::InvalidFee);
    }
    if request.commission.is_sign_negative() || !has_money_scale(request.commission) {
        return Err(Rejection::InvalidCommission {
            commission: request.commission,
        });
    }
    let kind = request.kind().ok_or(Rejection::MissingAccounts)?;
    if let (Some(src), Some(dst)) = (&request.source, &request.destination) {
        if src == dst {
            return Err(Rejection::SameAccount {
                account: src.clone(),
            });
        }
    }

    let amount = round_money(request.amount);
    let out_of_range = || Rejection::AmountOutOfRange { amount };
    let fee = compute_fee(amount, &request.fee_policy).ok_or_else(out_of_range)?;
    let commission = round_money(request.commission);
    Ok(Totals {
        kind,
        amount,
        fee,
        commission,
        total_debit: amount.checked_add(fee).ok_or_else(out_of_range)?,
        total_credit: amount.checked_add(commission).ok_or_else(out_of_range)?,
    })
}

fn lock_in_order<'a>(
    source: Option<&'a AccountCell>,
    destination: Option<&'a AccountCell>,
    source_first: bool,
) -> (
    Option<MutexGuard<'a, Account>>,
    Option<MutexGuard<'a, Account>>,
) {
    if source_first {
        let s = source.map(|cell| cell.lock());
        let d = destination.map(|cell| cell.lock());
        (s, d)
    } else {
        let d = destination.map(|cell| cell.lock());
        let s = source.map(|cell| cell.lock());
        (s, d)
    }
}

fn ensure_active(account: &Account) -> Result<(), Rejection> {
    if account.is_active {
        Ok(())
    } else {
        Err(Rejection::AccountInactive {
            account: account.account_ref(),
        })
    }
}

/// The balance figure `account` ends on once `gross` is debited (source) or
/// credited (destination). A credit card funding a movement takes on more
/// debt; paying into one reduces it.
fn settled_figure(account: &Account, role: Role, gross: Decimal) -> Result<Decimal, Rejection> {
    let figure = account.balance_figure();
    let is_card = matches!(account.details, AccountDetails::CreditCard(_));
    let after = match (role, is_card) {
        (Role::Source, false) | (Role::Destination, true) => figure.checked_sub(gross),
        (Role::Source, true) | (Role::Destination, false) => figure.checked_add(gross),
    };
    after.ok_or(Rejection::AmountOutOfRange { amount: gross })
}

fn set_figure(account: &mut Account, figure: Decimal) {
    match &mut account.details {
        AccountDetails::CreditCard(line) => line.current_balance = figure,
        _ => account.stored_balance = figure,
    }
}
