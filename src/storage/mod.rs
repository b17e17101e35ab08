// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! # Donation Storage Module
//!
//! Durable state lives in a single embedded redb database under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/donations.redb
//!   projects                project_id → Project
//!   donations               donation_id → Donation
//!   donations_by_tx         canonical tx id → donation_id (idempotency key)
//!   project_donation_index  project|!timestamp|donation_id → donation_id
//! ```
//!
//! ## Important Notes
//!
//! - The donation row and the project aggregate are only ever mutated
//!   together, inside one write transaction
//!   ([`DonationLedger::apply_settlement`](ledger::DonationLedger::apply_settlement)).
//! - redb serializes write transactions, which is the single-writer
//!   serialization point for concurrent submissions of one identifier.

pub mod donations;
pub mod ledger;
pub mod projects;

pub use donations::{Donation, DonationStatus, RecordOutcome, SettlementRecord};
pub use ledger::{DonationLedger, PersistenceError, PersistenceResult};
pub use projects::{NewProject, Project};
