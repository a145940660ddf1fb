// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Funds-movement engine for bank, vault, e-wallet, prepaid and credit card
//! accounts, with a SQLite-backed CLI host.

pub mod balance;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod fees;
pub mod ledger;
pub mod limits;
pub mod logging;
pub mod models;
pub mod registry;
pub mod store;
pub mod utils;

pub use engine::{Engine, MovementOutcome, MovementRequest};
pub use errors::Rejection;
pub use models::{Account, AccountKind, AccountRef};
