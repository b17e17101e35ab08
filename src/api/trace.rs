// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Transfer trace endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::ApiError, state::AppState, trace::TraceService};

/// Audit a transfer by transaction identifier.
///
/// Accepts either identifier encoding. Read-only; an unverifiable transfer is
/// reported with `valid: false`, never as an error.
#[utoipa::path(
    get,
    path = "/v1/trace/{transaction_id}",
    tag = "Trace",
    params(
        ("transaction_id" = String, Path, description = "Transaction identifier in either encoding")
    ),
    responses(
        (status = 200, description = "Trace report", body = crate::trace::TraceReport)
    )
)]
pub async fn trace_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<crate::trace::TraceReport>, ApiError> {
    let service = TraceService::new(&state.verifier, &state.verify_cache, &state.ledger);

    let report = service
        .trace(&transaction_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read donation ledger: {e}")))?;

    Ok(Json(report))
}
