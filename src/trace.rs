// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Transfer auditing.
//!
//! A trace combines the mirror node's view of a transaction with the matching
//! donation row, if any. Purely read-only: safe to call arbitrarily often,
//! used by the public trace endpoint and project transparency views.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ledger::tx_id::TransactionIdentifier;
use crate::ledger::units::format_hbar;
use crate::mirror::{MirrorApi, MirrorVerifier, VerificationCache, VerificationResult};
use crate::storage::{Donation, DonationLedger, DonationStatus, PersistenceResult};

/// Donation fields exposed alongside a trace.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationSummary {
    pub donation_id: Uuid,
    pub project_id: Uuid,
    pub donor_id: Uuid,
    pub amount: String,
    pub status: DonationStatus,
}

impl From<&Donation> for DonationSummary {
    fn from(donation: &Donation) -> Self {
        Self {
            donation_id: donation.donation_id,
            project_id: donation.project_id,
            donor_id: donation.donor_id,
            amount: format_hbar(donation.amount_tinybars),
            status: donation.status,
        }
    }
}

/// Mirror verification joined with the local donation record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TraceReport {
    pub transaction_id: String,
    pub valid: bool,
    pub amount: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub consensus_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation: Option<DonationSummary>,
}

/// Read-only composition of the mirror verifier and the donation ledger.
pub struct TraceService<'a, A: MirrorApi> {
    verifier: &'a MirrorVerifier<A>,
    cache: &'a VerificationCache,
    ledger: &'a DonationLedger,
}

impl<'a, A: MirrorApi> TraceService<'a, A> {
    pub fn new(
        verifier: &'a MirrorVerifier<A>,
        cache: &'a VerificationCache,
        ledger: &'a DonationLedger,
    ) -> Self {
        Self {
            verifier,
            cache,
            ledger,
        }
    }

    /// Verify an identifier, serving from the cache when possible.
    pub async fn verify_cached(&self, id_text: &str) -> VerificationResult {
        let key = canonical_key(id_text);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let result = self.verifier.verify(id_text).await;
        self.cache.put(&key, result.clone());
        result
    }

    /// Audit a transfer by identifier.
    pub async fn trace(&self, id_text: &str) -> PersistenceResult<TraceReport> {
        let verification = self.verify_cached(id_text).await;
        let donation = self.ledger.donation_by_tx(&canonical_key(id_text))?;

        Ok(TraceReport {
            transaction_id: verification.transaction_id,
            valid: verification.valid,
            amount: verification.amount,
            from_account: verification.from_account,
            to_account: verification.to_account,
            consensus_timestamp: verification.consensus_timestamp,
            donation: donation.as_ref().map(DonationSummary::from),
        })
    }
}

/// Reduce any accepted identifier encoding to the canonical persisted key.
fn canonical_key(id_text: &str) -> String {
    TransactionIdentifier::parse(id_text)
        .map(|id| id.canonical())
        .unwrap_or_else(|| id_text.to_string())
}
