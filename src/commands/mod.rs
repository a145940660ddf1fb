// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod doctor;
pub mod importer;
pub mod ledger;
pub mod movements;
pub mod settings;
