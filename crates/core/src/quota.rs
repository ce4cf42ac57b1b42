//! Per-crew-member caps on active vessel assignments and open issues.
//!
//! The `evaluate` constructors are pure; the async checkers count through a
//! [`FleetRepository`] and then decide. A count read followed by a separate
//! write is best-effort under concurrency. The store's enforced paths
//! (`create_issue` and `update_vessel` with [`QuotaMode::Enforced`]) call the
//! same `evaluate` functions while holding their write lock.

use serde::Serialize;
use uuid::Uuid;

use crate::store::FleetRepository;
use crate::vessel::VesselStatus;
use crate::Result;

/// Maximum concurrent assignments to `Active` vessels per crew member
pub const MAX_ACTIVE_VESSEL_ASSIGNMENTS: usize = 3;

/// Maximum `Open` issues reported by one crew member
pub const MAX_OPEN_ISSUES: usize = 3;

/// Whether the store rejects writes that would exceed a cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaMode {
    /// Caps are only reported, never enforced on write
    Advisory,
    /// Count and write happen atomically; over-cap writes fail
    Enforced,
}

impl QuotaMode {
    pub fn is_enforced(self) -> bool {
        matches!(self, Self::Enforced)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuota {
    pub allowed: bool,
    pub active_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AssignmentQuota {
    pub fn evaluate(active_count: usize, new_vessel_status: VesselStatus) -> Self {
        if new_vessel_status == VesselStatus::Active
            && active_count >= MAX_ACTIVE_VESSEL_ASSIGNMENTS
        {
            return Self {
                allowed: false,
                active_count,
                message: Some(format!(
                    "Crew member already has {} active vessel assignments (maximum {})",
                    active_count, MAX_ACTIVE_VESSEL_ASSIGNMENTS
                )),
            };
        }
        Self {
            allowed: true,
            active_count,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueQuota {
    pub allowed: bool,
    pub open_issue_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IssueQuota {
    pub fn evaluate(open_issue_count: usize) -> Self {
        if open_issue_count >= MAX_OPEN_ISSUES {
            return Self {
                allowed: false,
                open_issue_count,
                message: Some(format!(
                    "You already have {} open issues (maximum {}). Wait for one to be resolved before reporting another.",
                    open_issue_count, MAX_OPEN_ISSUES
                )),
            };
        }
        Self {
            allowed: true,
            open_issue_count,
            message: None,
        }
    }
}

/// Decide whether `user_id` may take one more assignment to a vessel in
/// `new_vessel_status`.
pub async fn can_assign_more_vessels<R>(
    repo: &R,
    user_id: Uuid,
    new_vessel_status: VesselStatus,
) -> Result<AssignmentQuota>
where
    R: FleetRepository + ?Sized,
{
    let active_count = repo.count_active_assignments(user_id, None).await?;
    Ok(AssignmentQuota::evaluate(active_count, new_vessel_status))
}

/// Decide whether `user_id` may report one more issue.
pub async fn can_report_more_issues<R>(repo: &R, user_id: Uuid) -> Result<IssueQuota>
where
    R: FleetRepository + ?Sized,
{
    let open_issue_count = repo.count_open_issues_by_reporter(user_id).await?;
    Ok(IssueQuota::evaluate(open_issue_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssuePriority, IssueStatus, IssueUpdate};
    use crate::store::FileFleetStore;
    use crate::user::{Role, User};
    use crate::vessel::{Vessel, VesselUpdate};
    use tempfile::TempDir;

    async fn create_test_store() -> (FileFleetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileFleetStore::new(temp_dir.path().join("fleet.json"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    async fn add_vessel(store: &FileFleetStore, imo: &str, status: VesselStatus) -> Vessel {
        store
            .create_vessel(Vessel::new(imo, imo, "Panama", "Tanker").with_status(status))
            .await
            .unwrap()
    }

    #[test]
    fn assignment_cap_only_applies_to_active_vessels() {
        for count in 0..MAX_ACTIVE_VESSEL_ASSIGNMENTS {
            assert!(AssignmentQuota::evaluate(count, VesselStatus::Active).allowed);
        }
        let blocked = AssignmentQuota::evaluate(3, VesselStatus::Active);
        assert!(!blocked.allowed);
        assert_eq!(blocked.active_count, 3);
        assert!(blocked.message.is_some());

        assert!(AssignmentQuota::evaluate(3, VesselStatus::InPort).allowed);
        assert!(AssignmentQuota::evaluate(7, VesselStatus::UnderMaintenance).allowed);
    }

    #[test]
    fn issue_cap_blocks_at_three() {
        assert!(IssueQuota::evaluate(0).allowed);
        assert!(IssueQuota::evaluate(2).allowed);
        let blocked = IssueQuota::evaluate(3);
        assert!(!blocked.allowed);
        assert_eq!(blocked.open_issue_count, 3);
        assert!(!IssueQuota::evaluate(4).allowed);
    }

    #[tokio::test]
    async fn fourth_active_assignment_is_blocked_until_a_vessel_leaves_active() {
        let (store, _temp) = create_test_store().await;
        let crew = store
            .create_user(User::new("crew@vessel.com", "hash", Role::CrewMember))
            .await
            .unwrap();

        let a = add_vessel(&store, "IMO-A", VesselStatus::Active).await;
        let b = add_vessel(&store, "IMO-B", VesselStatus::Active).await;
        let c = add_vessel(&store, "IMO-C", VesselStatus::Active).await;
        for vessel in [&a, &b, &c] {
            store.assign(crew.id, vessel.id).await.unwrap();
        }

        let decision = can_assign_more_vessels(&store, crew.id, VesselStatus::Active)
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.active_count, 3);

        let in_port = can_assign_more_vessels(&store, crew.id, VesselStatus::InPort)
            .await
            .unwrap();
        assert!(in_port.allowed);

        store
            .update_vessel(
                a.id,
                VesselUpdate {
                    status: Some(VesselStatus::InPort),
                    ..Default::default()
                },
                QuotaMode::Enforced,
            )
            .await
            .unwrap();

        let decision = can_assign_more_vessels(&store, crew.id, VesselStatus::Active)
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.active_count, 2);
    }

    #[tokio::test]
    async fn resolving_an_issue_frees_the_open_issue_quota() {
        let (store, _temp) = create_test_store().await;
        let crew = store
            .create_user(User::new("crew@vessel.com", "hash", Role::CrewMember))
            .await
            .unwrap();
        let vessel = add_vessel(&store, "IMO-A", VesselStatus::Active).await;
        store.assign(crew.id, vessel.id).await.unwrap();

        for n in 0..2 {
            store
                .create_issue(
                    Issue::new(vessel.id, "Engine", format!("issue {}", n), IssuePriority::Low)
                        .reported_by(crew.id),
                    QuotaMode::Enforced,
                )
                .await
                .unwrap();
        }
        let decision = can_report_more_issues(&store, crew.id).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.open_issue_count, 2);

        let third = store
            .create_issue(
                Issue::new(vessel.id, "Hull", "issue 2", IssuePriority::High).reported_by(crew.id),
                QuotaMode::Enforced,
            )
            .await
            .unwrap();
        let decision = can_report_more_issues(&store, crew.id).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.open_issue_count, 3);

        store
            .update_issue(
                third.id,
                IssueUpdate {
                    status: Some(IssueStatus::Resolved),
                    recommendation: None,
                },
            )
            .await
            .unwrap();
        let decision = can_report_more_issues(&store, crew.id).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.open_issue_count, 2);
    }
}
