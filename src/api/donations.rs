// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Donation endpoints: the settlement pipeline entry point.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::ApiError,
    ledger::{
        format_hbar, parse_hbar, HederaGateway, Settlement, SettlementError, TransferExecutor,
        TransferRequest,
    },
    state::AppState,
    storage::{Donation, DonationStatus, SettlementRecord},
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to donate to a project.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DonationRequest {
    /// Target project.
    pub project_id: Uuid,
    /// Donor's platform identity.
    pub donor_id: Uuid,
    /// Donor's ledger account (`0.0.x`).
    pub donor_wallet: String,
    /// DER-encoded donor private key. Used to sign the debit, never stored.
    pub donor_private_key: String,
    /// Amount in HBAR (e.g. "5.0").
    pub amount: String,
}

/// A recorded donation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationResponse {
    pub donation_id: Uuid,
    pub project_id: Uuid,
    pub donor_id: Uuid,
    /// Amount in HBAR.
    pub amount: String,
    /// Canonical transaction identifier, absent when the submission itself
    /// was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Donation> for DonationResponse {
    fn from(donation: Donation) -> Self {
        Self {
            donation_id: donation.donation_id,
            project_id: donation.project_id,
            donor_id: donation.donor_id,
            amount: format_hbar(donation.amount_tinybars),
            transaction_id: donation.transaction_id,
            status: donation.status,
            created_at: donation.created_at,
            updated_at: donation.updated_at,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Process a donation to a project.
///
/// Submits the transfer, trusts the network's receipt status for the
/// completed/failed decision, and records the outcome idempotently. Mirror
/// node confirmation runs best-effort in the background — it never gates the
/// response.
#[utoipa::path(
    post,
    path = "/v1/donations",
    tag = "Donations",
    request_body = DonationRequest,
    responses(
        (status = 201, description = "Donation settled and recorded", body = DonationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Project not found"),
        (status = 422, description = "Transfer rejected by the ledger network"),
        (status = 500, description = "Donation ledger write failed")
    )
)]
pub async fn make_donation(
    State(state): State<AppState>,
    Json(request): Json<DonationRequest>,
) -> Result<(StatusCode, Json<DonationResponse>), ApiError> {
    let amount_tinybars = parse_hbar(&request.amount)
        .map_err(|e| ApiError::bad_request(format!("Invalid amount: {e}")))?;

    let project = state
        .ledger
        .get_project(&request.project_id)
        .map_err(|e| ApiError::internal(format!("Failed to access storage: {e}")))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let gateway = HederaGateway::connect(&state.settings.ledger)
        .map_err(|e| ApiError::internal(format!("Ledger client misconfigured: {e}")))?;

    let transfer = TransferRequest {
        donor_account: request.donor_wallet.clone(),
        recipient_account: project.wallet_address.clone(),
        amount_tinybars,
        donor_key: request.donor_private_key.clone(),
    };

    let executor = TransferExecutor::new(&gateway);
    let submitted = match executor.submit_transfer(&transfer).await {
        Ok(submitted) => submitted,
        Err(e) => {
            // No transaction identifier exists; record the failure so it is
            // never silently dropped, then surface it.
            if let Err(db_err) = state.ledger.record_failed_submission(
                request.project_id,
                request.donor_id,
                amount_tinybars,
            ) {
                tracing::error!(error = %db_err, "Failed to record rejected submission");
            }
            return Err(match e {
                SettlementError::InvalidAddress(_)
                | SettlementError::InvalidKey(_)
                | SettlementError::InvalidAmount => ApiError::bad_request(e.to_string()),
                SettlementError::Submission(_) => {
                    ApiError::unprocessable(format!("Transfer submission failed: {e}"))
                }
            });
        }
    };

    let record = SettlementRecord::from_submission(
        request.project_id,
        request.donor_id,
        amount_tinybars,
        &submitted,
    );

    // The transfer already reached the ledger; a write failure here must never
    // resubmit it. Surface for manual reconciliation keyed by the identifier.
    let (donation, outcome) = state.ledger.apply_settlement(&record).map_err(|e| {
        tracing::error!(
            transaction_id = %record.transaction_id,
            error = %e,
            "Donation write failed after settlement; manual reconciliation required"
        );
        ApiError::internal(format!("Failed to record donation: {e}"))
    })?;

    tracing::info!(
        donation_id = %donation.donation_id,
        transaction_id = %record.transaction_id,
        status = ?donation.status,
        outcome = ?outcome,
        amount = %request.amount,
        "Donation settlement recorded"
    );

    if donation.status == DonationStatus::Completed {
        spawn_verification(&state, record.transaction_id.clone());
    }

    match submitted.settlement {
        Settlement::Settled => Ok((StatusCode::CREATED, Json(donation.into()))),
        Settlement::Rejected { reason } => {
            Err(ApiError::unprocessable(format!("Transfer failed: {reason}")))
        }
    }
}

/// Get a donation by id.
#[utoipa::path(
    get,
    path = "/v1/donations/{donation_id}",
    tag = "Donations",
    params(
        ("donation_id" = Uuid, Path, description = "Donation ID")
    ),
    responses(
        (status = 200, description = "Donation details", body = DonationResponse),
        (status = 404, description = "Donation not found")
    )
)]
pub async fn get_donation(
    State(state): State<AppState>,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, ApiError> {
    let donation = state
        .ledger
        .get_donation(&donation_id)
        .map_err(|e| ApiError::internal(format!("Failed to access storage: {e}")))?
        .ok_or_else(|| ApiError::not_found("Donation not found"))?;

    Ok(Json(donation.into()))
}

/// Kick off a detached best-effort mirror verification for a settled
/// transfer, pre-warming the cache consumed by trace and transparency reads.
fn spawn_verification(state: &AppState, transaction_id: String) {
    let verifier = state.verifier.clone();
    let cache = state.verify_cache.clone();

    tokio::spawn(async move {
        let result = verifier.verify(&transaction_id).await;
        cache.put(&transaction_id, result.clone());

        if result.valid {
            tracing::info!(
                transaction_id = %transaction_id,
                amount = %result.amount,
                "Mirror node confirmed settled transfer"
            );
        } else if result.is_not_found() {
            tracing::warn!(
                transaction_id = %transaction_id,
                "Mirror node has not indexed the transfer yet"
            );
        } else {
            tracing::warn!(
                transaction_id = %transaction_id,
                "Mirror node reports a non-success result for a settled transfer"
            );
        }
    });
}
