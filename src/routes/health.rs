//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub manifests: i64,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let manifests = state.store().count_manifests(None).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "demetsiiify",
        manifests,
    }))
}
