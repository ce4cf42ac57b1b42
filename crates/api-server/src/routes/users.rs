//! Crew directory and quota lookups for admins

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use fleet_core::quota::{can_assign_more_vessels, can_report_more_issues, AssignmentQuota, IssueQuota};
use fleet_core::user::Role;
use fleet_core::vessel::VesselStatus;
use serde::Serialize;
use uuid::Uuid;

use crate::{auth::require_admin, error::ApiError, routes::parse_id, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CrewMemberResponse {
    id: Uuid,
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotaResponse {
    user_id: Uuid,
    role: Role,
    assignments: AssignmentQuota,
    issues: IssueQuota,
}

/// Crew members available for assignment
async fn list_crew(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CrewMemberResponse>>, ApiError> {
    require_admin(&state, &headers)?;
    let crew = state
        .store()
        .list_users_by_role(Role::CrewMember)
        .await?
        .into_iter()
        .map(|user| CrewMemberResponse {
            id: user.id,
            email: user.email,
        })
        .collect();
    Ok(Json(crew))
}

async fn user_quotas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<QuotaResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let user_id = parse_id(&id, "User")?;
    let user = state
        .store()
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let assignments = can_assign_more_vessels(state.store(), user.id, VesselStatus::Active).await?;
    let issues = can_report_more_issues(state.store(), user.id).await?;

    Ok(Json(QuotaResponse {
        user_id: user.id,
        role: user.role,
        assignments,
        issues,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_crew))
        .route("/api/users/{id}/quotas", get(user_quotas))
}
