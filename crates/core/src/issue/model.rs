//! Issue model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
    Open,
    Resolved,
}

impl Default for IssueStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// Issue priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuePriority {
    Low,
    Med,
    High,
}

/// An issue reported against a vessel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: Uuid,
    pub vessel_id: Uuid,
    /// `None` only for seeded records with no reporter
    pub reported_by_id: Option<Uuid>,
    pub category: String,
    pub description: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Create a new open issue
    pub fn new(
        vessel_id: Uuid,
        category: impl Into<String>,
        description: impl Into<String>,
        priority: IssuePriority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vessel_id,
            reported_by_id: None,
            category: category.into(),
            description: description.into(),
            priority,
            status: IssueStatus::default(),
            recommendation: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the reporter
    pub fn reported_by(mut self, user_id: Uuid) -> Self {
        self.reported_by_id = Some(user_id);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the recommendation
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == IssueStatus::Open
    }
}

/// Admin-side issue mutation. `recommendation: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub status: Option<IssueStatus>,
    pub recommendation: Option<Option<String>>,
}

impl IssueUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.recommendation.is_none()
    }

    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(status) = self.status {
            issue.status = status;
        }
        if let Some(recommendation) = &self.recommendation {
            issue.recommendation = recommendation.clone();
        }
        issue.updated_at = Utc::now();
    }
}

/// Listing filter; all set fields must match
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueFilter {
    pub vessel_id: Option<Uuid>,
    pub reported_by_id: Option<Uuid>,
}

impl IssueFilter {
    pub fn for_vessel(vessel_id: Uuid) -> Self {
        Self {
            vessel_id: Some(vessel_id),
            ..Default::default()
        }
    }

    pub fn for_reporter(user_id: Uuid) -> Self {
        Self {
            reported_by_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        self.vessel_id.map_or(true, |id| issue.vessel_id == id)
            && self
                .reported_by_id
                .map_or(true, |id| issue.reported_by_id == Some(id))
    }
}
