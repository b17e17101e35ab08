// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Project endpoints.
//!
//! Creating a project provisions its donation wallet on the ledger first; a
//! project without a wallet address cannot exist.

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
    ledger::{format_hbar, parse_hbar, HederaGateway, ProvisioningError, WalletProvisioner},
    state::AppState,
    storage::{DonationStatus, NewProject, Project},
    trace::TraceService,
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create a project.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    /// Fundraising goal in HBAR (e.g. "1000").
    pub target_amount: String,
    pub location: String,
}

/// Project details returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Goal in HBAR.
    pub target_amount: String,
    /// Aggregate of completed donations, in HBAR.
    pub amount_raised: String,
    pub location: String,
    pub verified: bool,
    /// Ledger account receiving donations.
    pub wallet_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            project_id: project.project_id,
            title: project.title,
            description: project.description,
            category: project.category,
            target_amount: format_hbar(project.target_amount_tinybars),
            amount_raised: format_hbar(project.amount_raised_tinybars),
            location: project.location,
            verified: project.verified,
            wallet_address: project.wallet_address,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Response after creating a project.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateProjectResponse {
    pub project: ProjectResponse,
    /// Private key of the project wallet. Returned exactly once, for handoff
    /// to encrypted key custody; the service keeps no copy.
    pub wallet_private_key: String,
}

/// List of projects.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub total: usize,
}

/// One donation in a transparency view, joined with its mirror verification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransparencyDonation {
    /// Amount in HBAR as recorded locally.
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub status: DonationStatus,
    /// Whether the mirror node confirms the transfer.
    pub valid: bool,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
}

/// Public audit view of a project's funds.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransparencyResponse {
    pub project_id: Uuid,
    pub wallet_address: String,
    /// Aggregate raised in HBAR.
    pub amount_raised: String,
    pub donations: Vec<TransparencyDonation>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a project, provisioning its donation wallet on the ledger.
#[utoipa::path(
    post,
    path = "/v1/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = CreateProjectResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Wallet provisioning failed"),
        (status = 503, description = "Ledger network unavailable")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<CreateProjectResponse>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Project title must not be empty"));
    }
    let target_amount_tinybars = parse_hbar(&request.target_amount)
        .map_err(|e| ApiError::bad_request(format!("Invalid target amount: {e}")))?;

    let gateway = HederaGateway::connect(&state.settings.ledger)
        .map_err(|e| ApiError::internal(format!("Ledger client misconfigured: {e}")))?;

    let provisioner = WalletProvisioner::new(&gateway);
    let account = provisioner
        .create_account(
            state.settings.ledger.wallet_funding_tinybars,
            "Project donation wallet",
        )
        .await
        .map_err(|e| {
            let message = format!("Wallet provisioning failed: {e}");
            match &e {
                ProvisioningError::Client(_) => ApiError::internal(message),
                _ if e.is_retryable() => ApiError::service_unavailable(message),
                _ => ApiError::bad_gateway(message),
            }
        })?;

    let project = Project::create(
        NewProject {
            title: request.title,
            description: request.description,
            category: request.category,
            target_amount_tinybars,
            location: request.location,
        },
        account.address,
    );

    state
        .ledger
        .create_project(&project)
        .map_err(|e| ApiError::internal(format!("Failed to store project: {e}")))?;

    tracing::info!(
        project_id = %project.project_id,
        wallet_address = %project.wallet_address,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            project: project.into(),
            wallet_private_key: account.private_key,
        }),
    ))
}

/// List verified projects.
#[utoipa::path(
    get,
    path = "/v1/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "Verified projects", body = ProjectListResponse)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let projects = state
        .ledger
        .list_projects(true)
        .map_err(|e| ApiError::internal(format!("Failed to list projects: {e}")))?;

    let projects: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
    let total = projects.len();

    Ok(Json(ProjectListResponse { projects, total }))
}

/// Get a project by id.
#[utoipa::path(
    get,
    path = "/v1/projects/{project_id}",
    tag = "Projects",
    params(
        ("project_id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .ledger
        .get_project(&project_id)
        .map_err(|e| ApiError::internal(format!("Failed to access storage: {e}")))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(project.into()))
}

/// Mark a project as verified.
#[utoipa::path(
    post,
    path = "/v1/projects/{project_id}/verify",
    tag = "Projects",
    params(
        ("project_id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project verified", body = ProjectResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn verify_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state.ledger.mark_verified(&project_id).map_err(|e| match e {
        crate::storage::PersistenceError::ProjectNotFound(_) => {
            ApiError::not_found("Project not found")
        }
        _ => ApiError::internal(format!("Failed to update project: {e}")),
    })?;

    Ok(Json(project.into()))
}

/// Public transparency view: every donation with its mirror verification.
#[utoipa::path(
    get,
    path = "/v1/projects/{project_id}/transparency",
    tag = "Projects",
    params(
        ("project_id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Donations with verification", body = TransparencyResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn project_transparency(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<TransparencyResponse>, ApiError> {
    let project = state
        .ledger
        .get_project(&project_id)
        .map_err(|e| ApiError::internal(format!("Failed to access storage: {e}")))?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let donations = state
        .ledger
        .donations_for_project(&project_id)
        .map_err(|e| ApiError::internal(format!("Failed to list donations: {e}")))?;

    let service = TraceService::new(&state.verifier, &state.verify_cache, &state.ledger);

    let mut entries = Vec::with_capacity(donations.len());
    for donation in &donations {
        let verification = match &donation.transaction_id {
            Some(tx) => Some(service.verify_cached(tx).await),
            None => None,
        };

        entries.push(TransparencyDonation {
            amount: format_hbar(donation.amount_tinybars),
            transaction_id: donation.transaction_id.clone(),
            status: donation.status,
            valid: verification.as_ref().is_some_and(|v| v.valid),
            from_account: verification.as_ref().and_then(|v| v.from_account.clone()),
            to_account: verification.and_then(|v| v.to_account),
        });
    }

    Ok(Json(TransparencyResponse {
        project_id,
        wallet_address: project.wallet_address,
        amount_raised: format_hbar(project.amount_raised_tinybars),
        donations: entries,
    }))
}
