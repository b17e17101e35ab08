// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Donation records.
//!
//! A donation row is written exactly once per transaction identifier; the
//! identifier (canonical `-` encoding) is the idempotency key across the
//! whole settlement pipeline. Rows are only ever mutated by the donation
//! ledger's single write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ledger::transfer::{Settlement, SubmittedTransfer};

/// Donation status.
///
/// `Pending` exists only within a single settlement operation; the persisted
/// write always carries the classified outcome. `Failed` may later be
/// corrected to `Completed` when the same identifier resurfaces with a
/// successful classification; `Completed` is never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

/// Stored donation record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Donation {
    pub donation_id: Uuid,
    pub project_id: Uuid,
    pub donor_id: Uuid,
    /// Donated amount in tinybars.
    pub amount_tinybars: i64,
    /// Canonical transaction identifier. `None` only when the submission
    /// itself was rejected before the network assigned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The classified outcome of one settlement attempt, ready to persist.
#[derive(Debug, Clone)]
pub struct SettlementRecord {
    pub project_id: Uuid,
    pub donor_id: Uuid,
    pub amount_tinybars: i64,
    /// Canonical transaction identifier (idempotency key).
    pub transaction_id: String,
    /// `Completed` or `Failed`, as decided by the submission receipt.
    pub status: DonationStatus,
}

impl SettlementRecord {
    /// Build a record from a submitted transfer and its classification.
    pub fn from_submission(
        project_id: Uuid,
        donor_id: Uuid,
        amount_tinybars: i64,
        submitted: &SubmittedTransfer,
    ) -> Self {
        let status = match submitted.settlement {
            Settlement::Settled => DonationStatus::Completed,
            Settlement::Rejected { .. } => DonationStatus::Failed,
        };
        Self {
            project_id,
            donor_id,
            amount_tinybars,
            transaction_id: submitted.transaction_id.canonical(),
            status,
        }
    }
}

/// What the ledger did with a settlement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new donation row was written.
    Created,
    /// An existing `Failed` row for the same identifier was promoted to
    /// `Completed` and the project aggregate credited.
    Corrected,
    /// An existing row already covered this identifier; nothing changed.
    AlreadyRecorded,
}
