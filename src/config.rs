// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::MovementKind;
use crate::utils::{get_setting, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const KEY_DEST_LIMITS_DEPOSIT: &str = "limits.destination.deposit";
pub const KEY_DEST_LIMITS_TRANSFER: &str = "limits.destination.transfer";
pub const KEY_DEST_LIMITS_PAYMENT: &str = "limits.destination.payment";

pub const KNOWN_KEYS: [&str; 3] = [
    KEY_DEST_LIMITS_DEPOSIT,
    KEY_DEST_LIMITS_TRANSFER,
    KEY_DEST_LIMITS_PAYMENT,
];

/// Whether crediting an account with consumption limits counts against
/// those limits, per movement kind. Withdrawals have no destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationLimitPolicy {
    pub deposit: bool,
    pub transfer: bool,
    pub payment: bool,
}

impl Default for DestinationLimitPolicy {
    fn default() -> Self {
        Self {
            deposit: true,
            transfer: false,
            payment: false,
        }
    }
}

impl DestinationLimitPolicy {
    pub fn applies_to(&self, kind: MovementKind) -> bool {
        match kind {
            MovementKind::Deposit => self.deposit,
            MovementKind::Transfer => self.transfer,
            MovementKind::Payment => self.payment,
            MovementKind::Withdrawal => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub destination_limits: DestinationLimitPolicy,
}

impl EngineConfig {
    /// Reads overrides from the `settings` table; missing keys keep defaults.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = EngineConfig::default();
        let policy = &mut cfg.destination_limits;
        if let Some(v) = get_setting(conn, KEY_DEST_LIMITS_DEPOSIT)? {
            policy.deposit = parse_flag(KEY_DEST_LIMITS_DEPOSIT, &v)?;
        }
        if let Some(v) = get_setting(conn, KEY_DEST_LIMITS_TRANSFER)? {
            policy.transfer = parse_flag(KEY_DEST_LIMITS_TRANSFER, &v)?;
        }
        if let Some(v) = get_setting(conn, KEY_DEST_LIMITS_PAYMENT)? {
            policy.payment = parse_flag(KEY_DEST_LIMITS_PAYMENT, &v)?;
        }
        Ok(cfg)
    }

    pub fn get(&self, key: &str) -> Result<bool> {
        let policy = &self.destination_limits;
        match key {
            KEY_DEST_LIMITS_DEPOSIT => Ok(policy.deposit),
            KEY_DEST_LIMITS_TRANSFER => Ok(policy.transfer),
            KEY_DEST_LIMITS_PAYMENT => Ok(policy.payment),
            other => Err(unknown_key(other)),
        }
    }
}

/// Validates and stores one setting.
pub fn store(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(unknown_key(key));
    }
    let flag = parse_flag(key, value)?;
    set_setting(conn, key, if flag { "true" } else { "false" })
}

pub fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(anyhow!("Invalid value '{}' for {} (use true|false)", other, key)),
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown setting '{}' (known: {})",
        key,
        KNOWN_KEYS.join(", ")
    )
}
