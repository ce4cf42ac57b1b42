//! Inspection-due maintenance scan

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use chrono::Utc;
use fleet_core::maintenance::{vessels_due_for_inspection, InspectionDue, INSPECTION_INTERVAL_DAYS};
use serde::Serialize;

use crate::{auth::require_admin, error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    ok: bool,
    message: String,
    vessels_due_for_inspection: Vec<InspectionDue>,
}

async fn maintenance_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScanResponse>, ApiError> {
    let principal = require_admin(&state, &headers)?;
    let due = vessels_due_for_inspection(state.store(), Utc::now()).await?;
    tracing::info!(
        requested_by = %principal.id,
        due = due.len(),
        "Maintenance scan complete"
    );

    Ok(Json(ScanResponse {
        ok: true,
        message: format!(
            "{} vessel(s) not inspected in the last {} days",
            due.len(),
            INSPECTION_INTERVAL_DAYS
        ),
        vessels_due_for_inspection: due,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/maintenance-scan", post(maintenance_scan))
}
