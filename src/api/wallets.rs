// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Donor wallet provisioning.
//!
//! Creates a funded ledger account for a donor. The private key is returned
//! exactly once; encrypted custody of it is the caller's collaborator, not
//! this service — nothing secret is persisted here.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    ledger::{HederaGateway, ProvisioningError, WalletProvisioner},
    state::AppState,
};

/// Request to provision a donor wallet.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Optional on-chain memo for the new account.
    #[serde(default)]
    pub memo: Option<String>,
}

/// Response after provisioning a wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateWalletResponse {
    /// Ledger-assigned account id (`0.0.x`).
    pub address: String,
    /// Private key for the new account. Returned exactly once, for handoff to
    /// encrypted key custody.
    pub private_key: String,
}

/// Provision a new donor wallet on the ledger.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = CreateWalletResponse),
        (status = 502, description = "Wallet provisioning failed"),
        (status = 503, description = "Ledger network unavailable")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    let gateway = HederaGateway::connect(&state.settings.ledger)
        .map_err(|e| ApiError::internal(format!("Ledger client misconfigured: {e}")))?;

    let memo = request.memo.as_deref().unwrap_or("Donor wallet");

    let provisioner = WalletProvisioner::new(&gateway);
    let account = provisioner
        .create_account(state.settings.ledger.wallet_funding_tinybars, memo)
        .await
        .map_err(|e| {
            let message = format!("Wallet provisioning failed: {e}");
            match &e {
                ProvisioningError::Client(_) => ApiError::internal(message),
                _ if e.is_retryable() => ApiError::service_unavailable(message),
                _ => ApiError::bad_gateway(message),
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            address: account.address,
            private_key: account.private_key,
        }),
    ))
}
