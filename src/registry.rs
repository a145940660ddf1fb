// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account registry: every account keyed by its [`AccountRef`], each behind
//! its own lock so movements on disjoint accounts never contend.

use crate::models::{Account, AccountRef};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type AccountCell = Arc<Mutex<Account>>;

#[derive(Debug, Default)]
pub struct Registry {
    accounts: RwLock<BTreeMap<AccountRef, AccountCell>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let registry = Self::new();
        for account in accounts {
            registry.insert(account);
        }
        registry
    }

    /// Adds or replaces an account, returning the previous snapshot if any.
    pub fn insert(&self, account: Account) -> Option<Account> {
        let key = account.account_ref();
        let previous = self
            .accounts
            .write()
            .insert(key, Arc::new(Mutex::new(account)));
        previous.map(|cell| cell.lock().clone())
    }

    pub fn remove(&self, account: &AccountRef) -> Option<Account> {
        let removed = self.accounts.write().remove(account);
        removed.map(|cell| cell.lock().clone())
    }

    pub fn contains(&self, account: &AccountRef) -> bool {
        self.accounts.read().contains_key(account)
    }

    /// Shared handle to the account's lock. Callers holding two handles must
    /// lock them in `AccountRef` order.
    pub fn cell(&self, account: &AccountRef) -> Option<AccountCell> {
        self.accounts.read().get(account).cloned()
    }

    pub fn snapshot(&self, account: &AccountRef) -> Option<Account> {
        self.cell(account).map(|cell| cell.lock().clone())
    }

    /// Snapshots of every account in `AccountRef` order.
    pub fn snapshots(&self) -> Vec<Account> {
        self.cells()
            .into_iter()
            .map(|cell| cell.lock().clone())
            .collect()
    }

    pub fn refs(&self) -> Vec<AccountRef> {
        self.accounts.read().keys().cloned().collect()
    }

    /// Runs `f` on every account, one lock at a time.
    pub fn for_each_mut(&self, mut f: impl FnMut(&mut Account)) {
        for cell in self.cells() {
            f(&mut cell.lock());
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    fn cells(&self) -> Vec<AccountCell> {
        self.accounts.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountKind;
    use rust_decimal::Decimal;

    #[test]
    fn insert_lookup_remove() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        registry.insert(Account::bank("main", "Main", Decimal::from(10)));
        let key = AccountRef::new(AccountKind::Bank, "main");
        assert!(registry.contains(&key));
        assert_eq!(registry.snapshot(&key).unwrap().stored_balance, Decimal::from(10));

        let previous = registry.insert(Account::bank("main", "Main", Decimal::from(20)));
        assert_eq!(previous.unwrap().stored_balance, Decimal::from(10));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&key).is_some());
        assert!(registry.snapshot(&key).is_none());
    }

    #[test]
    fn same_id_in_different_kinds_are_distinct() {
        let registry = Registry::from_accounts([
            Account::bank("x", "Bank X", Decimal::ONE),
            Account::credit_card("x", "Card X", Decimal::from(100), Decimal::ZERO),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.refs().iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            vec!["bank:x", "credit:x"]
        );
    }

    #[test]
    fn for_each_mut_touches_every_account() {
        let registry = Registry::from_accounts([
            Account::bank("a", "A", Decimal::ONE),
            Account::bank("b", "B", Decimal::ONE),
        ]);
        registry.for_each_mut(|acc| acc.is_active = false);
        assert!(registry.snapshots().iter().all(|acc| !acc.is_active));
    }
}
