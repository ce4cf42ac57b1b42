//! Vessel CRUD and crew assignment

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use fleet_core::access::{can_access_vessel, Principal};
use fleet_core::quota::can_assign_more_vessels;
use fleet_core::vessel::{Vessel, VesselStatus, VesselUpdate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{require_admin, require_auth},
    error::ApiError,
    routes::{nullable, parse_id, parse_inspection_date, required, required_opt},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VesselResponse {
    #[serde(flatten)]
    vessel: Vessel,
    open_issue_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_crew_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVesselRequest {
    name: String,
    imo: String,
    flag: String,
    #[serde(rename = "type")]
    vessel_type: String,
    #[serde(default)]
    status: Option<VesselStatus>,
    #[serde(default)]
    last_inspection_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateVesselRequest {
    name: Option<String>,
    imo: Option<String>,
    flag: Option<String>,
    #[serde(rename = "type")]
    vessel_type: Option<String>,
    status: Option<VesselStatus>,
    #[serde(default, deserialize_with = "nullable")]
    last_inspection_date: Option<Option<String>>,
    assigned_crew_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    ok: bool,
}

impl UpdateVesselRequest {
    fn into_update(self) -> Result<VesselUpdate, ApiError> {
        let last_inspection_date = match self.last_inspection_date {
            None => None,
            Some(raw) => Some(parse_inspection_date(raw.as_deref())?),
        };
        Ok(VesselUpdate {
            name: required_opt(self.name, "Name is required")?,
            imo: required_opt(self.imo, "IMO is required")?,
            flag: required_opt(self.flag, "Flag is required")?,
            vessel_type: required_opt(self.vessel_type, "Type is required")?,
            status: self.status,
            last_inspection_date,
            assigned_crew_ids: self.assigned_crew_ids,
        })
    }
}

async fn to_response(
    state: &AppState,
    vessel: Vessel,
    with_crew: bool,
) -> Result<VesselResponse, ApiError> {
    let open_issue_count = state.store().count_open_issues_for_vessel(vessel.id).await?;
    let assigned_crew_ids = if with_crew {
        Some(
            state
                .store()
                .list_assignments_for_vessel(vessel.id)
                .await?
                .into_iter()
                .map(|assignment| assignment.user_id)
                .collect(),
        )
    } else {
        None
    };
    Ok(VesselResponse {
        vessel,
        open_issue_count,
        assigned_crew_ids,
    })
}

/// Load a vessel the principal may see. Access is checked before existence
/// so crew cannot probe for vessels outside their assignments.
async fn accessible_vessel(
    state: &AppState,
    principal: &Principal,
    vessel_id: Uuid,
) -> Result<Vessel, ApiError> {
    if !can_access_vessel(state.store(), principal, vessel_id).await? {
        return Err(ApiError::forbidden("You do not have access to this vessel"));
    }
    state
        .store()
        .get_vessel(vessel_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vessel not found"))
}

async fn list_vessels(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<VesselResponse>>, ApiError> {
    let principal = require_auth(&state, &headers)?;
    let vessels = if principal.is_admin() {
        state.store().list_vessels().await?
    } else {
        state.store().list_vessels_for_user(principal.id).await?
    };

    let mut response = Vec::with_capacity(vessels.len());
    for vessel in vessels {
        response.push(to_response(&state, vessel, false).await?);
    }
    Ok(Json(response))
}

async fn create_vessel(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateVesselRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VesselResponse>), ApiError> {
    require_admin(&state, &headers)?;
    let Json(req) = body?;

    let mut vessel = Vessel::new(
        required(&req.name, "Name is required")?,
        required(&req.imo, "IMO is required")?,
        required(&req.flag, "Flag is required")?,
        required(&req.vessel_type, "Type is required")?,
    )
    .with_status(req.status.unwrap_or_default());
    vessel.last_inspection_date = parse_inspection_date(req.last_inspection_date.as_deref())?;

    let vessel = state.store().create_vessel(vessel).await?;
    tracing::info!(vessel_id = %vessel.id, imo = %vessel.imo, "Created vessel");

    Ok((
        StatusCode::CREATED,
        Json(to_response(&state, vessel, true).await?),
    ))
}

async fn get_vessel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<VesselResponse>, ApiError> {
    let principal = require_auth(&state, &headers)?;
    let vessel_id = parse_id(&id, "Vessel")?;
    let vessel = accessible_vessel(&state, &principal, vessel_id).await?;
    Ok(Json(to_response(&state, vessel, true).await?))
}

/// Log crew members who would go over the active-assignment cap. Used when
/// the store is not enforcing caps itself.
async fn warn_on_assignment_caps(
    state: &AppState,
    vessel: &Vessel,
    update: &VesselUpdate,
) -> Result<(), ApiError> {
    let new_status = update.status.unwrap_or(vessel.status);
    if new_status != VesselStatus::Active {
        return Ok(());
    }
    let current: Vec<Uuid> = state
        .store()
        .list_assignments_for_vessel(vessel.id)
        .await?
        .into_iter()
        .map(|assignment| assignment.user_id)
        .collect();
    let crew = update.assigned_crew_ids.as_ref().unwrap_or(&current);

    for user_id in crew {
        let already_counted = vessel.status == VesselStatus::Active && current.contains(user_id);
        if already_counted {
            continue;
        }
        let decision = can_assign_more_vessels(state.store(), *user_id, new_status).await?;
        if !decision.allowed {
            tracing::warn!(
                user_id = %user_id,
                vessel_id = %vessel.id,
                active_count = decision.active_count,
                "Assignment exceeds the active vessel cap"
            );
        }
    }
    Ok(())
}

async fn update_vessel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateVesselRequest>, JsonRejection>,
) -> Result<Json<VesselResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let vessel_id = parse_id(&id, "Vessel")?;
    let Json(req) = body?;
    let update = req.into_update()?;

    let mode = state.config().quota_mode;
    if !mode.is_enforced() {
        let existing = state
            .store()
            .get_vessel(vessel_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Vessel not found"))?;
        warn_on_assignment_caps(&state, &existing, &update).await?;
    }

    let vessel = state.store().update_vessel(vessel_id, update, mode).await?;
    tracing::info!(vessel_id = %vessel.id, "Updated vessel");
    Ok(Json(to_response(&state, vessel, true).await?))
}

async fn delete_vessel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let vessel_id = parse_id(&id, "Vessel")?;
    if !state.store().delete_vessel(vessel_id).await? {
        return Err(ApiError::not_found("Vessel not found"));
    }
    tracing::info!(vessel_id = %vessel_id, "Deleted vessel");
    Ok(Json(DeleteResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vessels", get(list_vessels).post(create_vessel))
        .route(
            "/api/vessels/{id}",
            get(get_vessel).patch(update_vessel).delete(delete_vessel),
        )
}
