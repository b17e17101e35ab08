// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod donations;
pub mod health;
pub mod projects;
pub mod trace;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/{project_id}", get(projects::get_project))
        .route("/projects/{project_id}/verify", post(projects::verify_project))
        .route(
            "/projects/{project_id}/transparency",
            get(projects::project_transparency),
        )
        .route("/wallets", post(wallets::create_wallet))
        .route(
            "/donations",
            post(donations::make_donation),
        )
        .route("/donations/{donation_id}", get(donations::get_donation))
        .route("/trace/{transaction_id}", get(trace::trace_transaction))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        projects::create_project,
        projects::list_projects,
        projects::get_project,
        projects::verify_project,
        projects::project_transparency,
        wallets::create_wallet,
        donations::make_donation,
        donations::get_donation,
        trace::trace_transaction
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            projects::CreateProjectRequest,
            projects::CreateProjectResponse,
            projects::ProjectResponse,
            projects::ProjectListResponse,
            projects::TransparencyResponse,
            projects::TransparencyDonation,
            wallets::CreateWalletRequest,
            wallets::CreateWalletResponse,
            donations::DonationRequest,
            donations::DonationResponse,
            crate::trace::TraceReport,
            crate::trace::DonationSummary,
            crate::mirror::VerificationResult,
            crate::storage::DonationStatus
        )
    ),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Projects", description = "Project lifecycle and transparency"),
        (name = "Wallets", description = "Ledger account provisioning"),
        (name = "Donations", description = "Donation settlement"),
        (name = "Trace", description = "Transfer auditing")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
