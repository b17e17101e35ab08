// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Project records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored project record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Fundraising goal in tinybars.
    pub target_amount_tinybars: i64,
    /// Aggregate of completed donations, in tinybars. Monotonically
    /// non-decreasing; credited only by the donation ledger, exactly once per
    /// donation that first reaches `completed`.
    pub amount_raised_tinybars: i64,
    pub location: String,
    pub verified: bool,
    /// Ledger account receiving this project's donations. Immutable.
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the creator; everything else is assigned at creation.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_amount_tinybars: i64,
    pub location: String,
}

impl Project {
    /// Build a fresh project around its provisioned wallet.
    pub fn create(draft: NewProject, wallet_address: String) -> Self {
        let now = Utc::now();
        Self {
            project_id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            target_amount_tinybars: draft.target_amount_tinybars,
            amount_raised_tinybars: 0,
            location: draft.location,
            verified: false,
            wallet_address,
            created_at: now,
            updated_at: now,
        }
    }
}
