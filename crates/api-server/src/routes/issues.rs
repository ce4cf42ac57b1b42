//! Issue reporting and review

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use fleet_core::access::can_access_vessel;
use fleet_core::issue::{Issue, IssueFilter, IssuePriority, IssueStatus, IssueUpdate};
use fleet_core::quota::can_report_more_issues;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{require_admin, require_auth},
    error::ApiError,
    routes::{nullable, parse_id, required},
    state::AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VesselSummary {
    id: Uuid,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueResponse {
    #[serde(flatten)]
    issue: Issue,
    vessel: Option<VesselSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIssuesQuery {
    vessel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIssueRequest {
    vessel_id: Uuid,
    category: String,
    description: String,
    priority: IssuePriority,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIssueRequest {
    status: Option<IssueStatus>,
    #[serde(default, deserialize_with = "nullable")]
    recommendation: Option<Option<String>>,
}

impl UpdateIssueRequest {
    fn into_update(self) -> IssueUpdate {
        // Blank recommendations clear the field
        let recommendation = self.recommendation.map(|value| {
            value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        });
        IssueUpdate {
            status: self.status,
            recommendation,
        }
    }
}

async fn vessel_summaries(state: &AppState) -> Result<HashMap<Uuid, VesselSummary>, ApiError> {
    Ok(state
        .store()
        .list_vessels()
        .await?
        .into_iter()
        .map(|vessel| {
            (
                vessel.id,
                VesselSummary {
                    id: vessel.id,
                    name: vessel.name,
                },
            )
        })
        .collect())
}

async fn with_vessel(state: &AppState, issue: Issue) -> Result<IssueResponse, ApiError> {
    let vessel = state
        .store()
        .get_vessel(issue.vessel_id)
        .await?
        .map(|vessel| VesselSummary {
            id: vessel.id,
            name: vessel.name,
        });
    Ok(IssueResponse { issue, vessel })
}

/// With `vesselId`, issues on that vessel if the caller may access it.
/// Otherwise admins get everything and crew get their own reports.
async fn list_issues(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListIssuesQuery>,
) -> Result<Json<Vec<IssueResponse>>, ApiError> {
    let principal = require_auth(&state, &headers)?;

    let filter = match query.vessel_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        // Unknown or malformed vessel ids match no issues
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(vessel_id) => {
                if !can_access_vessel(state.store(), &principal, vessel_id).await? {
                    return Err(ApiError::forbidden("You do not have access to this vessel"));
                }
                IssueFilter::for_vessel(vessel_id)
            }
            Err(_) if principal.is_admin() => return Ok(Json(Vec::new())),
            Err(_) => return Err(ApiError::forbidden("You do not have access to this vessel")),
        },
        None if principal.is_admin() => IssueFilter::default(),
        None => IssueFilter::for_reporter(principal.id),
    };

    let issues = state.store().list_issues(filter).await?;
    let vessels = vessel_summaries(&state).await?;
    let response = issues
        .into_iter()
        .map(|issue| {
            let vessel = vessels.get(&issue.vessel_id).cloned();
            IssueResponse { issue, vessel }
        })
        .collect();
    Ok(Json(response))
}

async fn create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateIssueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueResponse>), ApiError> {
    let principal = require_auth(&state, &headers)?;
    if principal.is_admin() {
        return Err(ApiError::forbidden("Only crew members can report issues"));
    }
    let Json(req) = body?;
    let category = required(&req.category, "Category is required")?;
    let description = required(&req.description, "Description is required")?;

    if !can_access_vessel(state.store(), &principal, req.vessel_id).await? {
        return Err(ApiError::forbidden("You are not assigned to this vessel"));
    }

    let mode = state.config().quota_mode;
    if !mode.is_enforced() {
        let decision = can_report_more_issues(state.store(), principal.id).await?;
        if !decision.allowed {
            tracing::warn!(
                user_id = %principal.id,
                open_issue_count = decision.open_issue_count,
                "Issue report exceeds the open issue cap"
            );
        }
    }

    let issue = Issue::new(req.vessel_id, category, description, req.priority)
        .reported_by(principal.id);
    let issue = state.store().create_issue(issue, mode).await?;
    tracing::info!(issue_id = %issue.id, vessel_id = %issue.vessel_id, "Issue reported");

    Ok((StatusCode::CREATED, Json(with_vessel(&state, issue).await?)))
}

async fn get_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<IssueResponse>, ApiError> {
    let principal = require_auth(&state, &headers)?;
    let issue_id = parse_id(&id, "Issue")?;
    let issue = state
        .store()
        .get_issue(issue_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue not found"))?;

    let is_reporter = issue.reported_by_id == Some(principal.id);
    if !is_reporter && !can_access_vessel(state.store(), &principal, issue.vessel_id).await? {
        return Err(ApiError::forbidden("You do not have access to this issue"));
    }
    Ok(Json(with_vessel(&state, issue).await?))
}

async fn update_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateIssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let issue_id = parse_id(&id, "Issue")?;
    let Json(req) = body?;

    let issue = state
        .store()
        .update_issue(issue_id, req.into_update())
        .await?;
    tracing::info!(issue_id = %issue.id, status = ?issue.status, "Issue updated");
    Ok(Json(with_vessel(&state, issue).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/issues", get(list_issues).post(create_issue))
        .route("/api/issues/{id}", get(get_issue).patch(update_issue))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use fleet_core::issue::{Issue, IssuePriority};
    use fleet_core::quota::QuotaMode;
    use fleet_core::store::FleetRepository;
    use fleet_core::user::{Role, User};
    use fleet_core::vessel::{Vessel, VesselStatus};
    use serde_json::{json, Value};

    use crate::routes::test_support::{
        app, build_state_with, create_user, create_vessel, send, token_for,
    };
    use crate::state::AppState;

    struct Fixture {
        state: AppState,
        admin: User,
        crew: User,
        vessel: Vessel,
        _tmp: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        fixture_with(QuotaMode::Enforced).await
    }

    async fn fixture_with(mode: QuotaMode) -> Fixture {
        let (state, tmp) = build_state_with(|config| config.quota_mode = mode).await;
        let admin = create_user(&state, "admin@fleet.com", "admin123", Role::FleetAdmin).await;
        let crew = create_user(&state, "crew@vessel.com", "crew123", Role::CrewMember).await;
        let vessel = create_vessel(&state, "Pacific Dawn", "IMO9012345", VesselStatus::Active).await;
        state.store().assign(crew.id, vessel.id).await.unwrap();
        Fixture {
            state,
            admin,
            crew,
            vessel,
            _tmp: tmp,
        }
    }

    fn report(vessel: &Vessel, description: &str) -> Value {
        json!({
            "vesselId": vessel.id,
            "category": "Engine",
            "description": description,
            "priority": "High"
        })
    }

    #[tokio::test]
    async fn crew_reports_issue_on_assigned_vessel() {
        let fx = fixture().await;
        let app = app(&fx.state);
        let token = token_for(&fx.state, &fx.crew);

        let (status, created) = send(
            &app,
            "POST",
            "/api/issues",
            Some(&token),
            Some(report(&fx.vessel, "Oil leak")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "Open");
        assert_eq!(created["priority"], "High");
        assert_eq!(created["reportedById"], json!(fx.crew.id));
        assert_eq!(created["vessel"]["name"], "Pacific Dawn");

        let (status, fetched) = send(
            &app,
            "GET",
            &format!("/api/issues/{}", created["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "Open");
        assert_eq!(fetched["priority"], "High");
    }

    #[tokio::test]
    async fn reporting_requires_crew_and_assignment() {
        let fx = fixture().await;
        let other = create_vessel(&fx.state, "Nordic Explorer", "IMO9034567", VesselStatus::Active).await;
        let app = app(&fx.state);

        let (status, _) = send(
            &app,
            "POST",
            "/api/issues",
            Some(&token_for(&fx.state, &fx.admin)),
            Some(report(&fx.vessel, "Admin report")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, payload) = send(
            &app,
            "POST",
            "/api/issues",
            Some(&token_for(&fx.state, &fx.crew)),
            Some(report(&other, "Not my ship")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(payload["code"], "FORBIDDEN");

        let (status, _) = send(&app, "POST", "/api/issues", None, Some(report(&fx.vessel, "x"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn open_issue_cap_blocks_fourth_report_until_resolved() {
        let fx = fixture().await;
        let app = app(&fx.state);
        let crew_token = token_for(&fx.state, &fx.crew);
        let admin_token = token_for(&fx.state, &fx.admin);

        let mut first_id = String::new();
        for n in 0..3 {
            let (status, created) = send(
                &app,
                "POST",
                "/api/issues",
                Some(&crew_token),
                Some(report(&fx.vessel, &format!("Issue {}", n))),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            if n == 0 {
                first_id = created["id"].as_str().unwrap().to_string();
            }
        }

        let (status, payload) = send(
            &app,
            "POST",
            "/api/issues",
            Some(&crew_token),
            Some(report(&fx.vessel, "One too many")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["code"], "QUOTA_EXCEEDED");

        let (status, resolved) = send(
            &app,
            "PATCH",
            &format!("/api/issues/{}", first_id),
            Some(&admin_token),
            Some(json!({"status": "Resolved", "recommendation": "Replace gasket"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["status"], "Resolved");
        assert_eq!(resolved["recommendation"], "Replace gasket");

        let (status, _) = send(
            &app,
            "POST",
            "/api/issues",
            Some(&crew_token),
            Some(report(&fx.vessel, "Now allowed")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn listing_scopes_by_role_and_vessel() {
        let fx = fixture().await;
        let other_crew = create_user(&fx.state, "two@vessel.com", "crew123", Role::CrewMember).await;
        let other_vessel =
            create_vessel(&fx.state, "Nordic Explorer", "IMO9034567", VesselStatus::Active).await;
        fx.state.store().assign(other_crew.id, fx.vessel.id).await.unwrap();
        for (reporter, description) in [(fx.crew.id, "Mine"), (other_crew.id, "Theirs")] {
            fx.state
                .store()
                .create_issue(
                    Issue::new(fx.vessel.id, "Hull", description, IssuePriority::Low)
                        .reported_by(reporter),
                    QuotaMode::Enforced,
                )
                .await
                .unwrap();
        }
        let app = app(&fx.state);
        let crew_token = token_for(&fx.state, &fx.crew);

        let (_, own) = send(&app, "GET", "/api/issues", Some(&crew_token), None).await;
        assert_eq!(own.as_array().unwrap().len(), 1);
        assert_eq!(own[0]["description"], "Mine");

        let (status, on_vessel) = send(
            &app,
            "GET",
            &format!("/api/issues?vesselId={}", fx.vessel.id),
            Some(&crew_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(on_vessel.as_array().unwrap().len(), 2);
        assert_eq!(on_vessel[0]["description"], "Theirs");

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/issues?vesselId={}", other_vessel.id),
            Some(&crew_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, all) = send(
            &app,
            "GET",
            "/api/issues",
            Some(&token_for(&fx.state, &fx.admin)),
            None,
        )
        .await;
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn crew_cannot_update_and_null_clears_recommendation() {
        let fx = fixture().await;
        let issue = fx
            .state
            .store()
            .create_issue(
                Issue::new(fx.vessel.id, "Deck", "Rust", IssuePriority::Med)
                    .reported_by(fx.crew.id)
                    .with_recommendation("Repaint"),
                QuotaMode::Enforced,
            )
            .await
            .unwrap();
        let app = app(&fx.state);
        let uri = format!("/api/issues/{}", issue.id);

        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&token_for(&fx.state, &fx.crew)),
            Some(json!({"status": "Resolved"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = send(
            &app,
            "PATCH",
            &uri,
            Some(&token_for(&fx.state, &fx.admin)),
            Some(json!({"recommendation": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["recommendation"].is_null());
        assert_eq!(updated["status"], "Open");
    }

    #[tokio::test]
    async fn unrelated_crew_cannot_read_issue() {
        let fx = fixture().await;
        let outsider = create_user(&fx.state, "out@vessel.com", "crew123", Role::CrewMember).await;
        let issue = fx
            .state
            .store()
            .create_issue(
                Issue::new(fx.vessel.id, "Deck", "Rust", IssuePriority::Med).reported_by(fx.crew.id),
                QuotaMode::Enforced,
            )
            .await
            .unwrap();

        let (status, _) = send(
            &app(&fx.state),
            "GET",
            &format!("/api/issues/{}", issue.id),
            Some(&token_for(&fx.state, &outsider)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn advisory_mode_lets_fourth_report_through() {
        let fx = fixture_with(QuotaMode::Advisory).await;
        let app = app(&fx.state);
        let crew_token = token_for(&fx.state, &fx.crew);

        for n in 0..4 {
            let (status, _) = send(
                &app,
                "POST",
                "/api/issues",
                Some(&crew_token),
                Some(report(&fx.vessel, &format!("Issue {}", n))),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, quotas) = send(
            &app,
            "GET",
            &format!("/api/users/{}/quotas", fx.crew.id),
            Some(&token_for(&fx.state, &fx.admin)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quotas["issues"]["allowed"], false);
        assert_eq!(quotas["issues"]["openIssueCount"], 4);
    }

    #[tokio::test]
    async fn admin_filter_on_unknown_vessel_lists_nothing() {
        let fx = fixture().await;
        fx.state
            .store()
            .create_issue(
                Issue::new(fx.vessel.id, "Deck", "Rust", IssuePriority::Med).reported_by(fx.crew.id),
                QuotaMode::Enforced,
            )
            .await
            .unwrap();
        let app = app(&fx.state);
        let admin_token = token_for(&fx.state, &fx.admin);

        for filter in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
            let (status, payload) = send(
                &app,
                "GET",
                &format!("/api/issues?vesselId={}", filter),
                Some(&admin_token),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(payload, json!([]));
        }

        let (status, _) = send(
            &app,
            "GET",
            "/api/issues?vesselId=not-a-uuid",
            Some(&token_for(&fx.state, &fx.crew)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
