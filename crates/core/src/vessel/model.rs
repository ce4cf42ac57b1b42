//! Vessel and assignment model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselStatus {
    Active,
    #[serde(rename = "In Port")]
    InPort,
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
}

impl VesselStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::InPort => "In Port",
            Self::UnderMaintenance => "Under Maintenance",
        }
    }
}

impl Default for VesselStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A vessel in the fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    pub id: Uuid,
    pub name: String,
    pub imo: String,
    pub flag: String,
    #[serde(rename = "type")]
    pub vessel_type: String,
    pub status: VesselStatus,
    pub last_inspection_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vessel {
    /// Create a new vessel
    pub fn new(
        name: impl Into<String>,
        imo: impl Into<String>,
        flag: impl Into<String>,
        vessel_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            imo: imo.into(),
            flag: flag.into(),
            vessel_type: vessel_type.into(),
            status: VesselStatus::default(),
            last_inspection_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: VesselStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the last inspection date
    pub fn with_last_inspection(mut self, date: DateTime<Utc>) -> Self {
        self.last_inspection_date = Some(date);
        self
    }
}

/// Grants one crew member visibility and report rights on one vessel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub user_id: Uuid,
    pub vessel_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(user_id: Uuid, vessel_id: Uuid) -> Self {
        Self {
            user_id,
            vessel_id,
            assigned_at: Utc::now(),
        }
    }
}

/// Partial vessel update applied by an admin.
///
/// `last_inspection_date` distinguishes "leave as is" (`None`) from
/// "clear" (`Some(None)`). `assigned_crew_ids`, when present, replaces the
/// vessel's full crew list.
#[derive(Debug, Clone, Default)]
pub struct VesselUpdate {
    pub name: Option<String>,
    pub imo: Option<String>,
    pub flag: Option<String>,
    pub vessel_type: Option<String>,
    pub status: Option<VesselStatus>,
    pub last_inspection_date: Option<Option<DateTime<Utc>>>,
    pub assigned_crew_ids: Option<Vec<Uuid>>,
}

impl VesselUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.imo.is_none()
            && self.flag.is_none()
            && self.vessel_type.is_none()
            && self.status.is_none()
            && self.last_inspection_date.is_none()
            && self.assigned_crew_ids.is_none()
    }

    /// Apply the scalar fields to a vessel, leaving assignments alone
    pub fn apply_to(&self, vessel: &mut Vessel) {
        if let Some(name) = &self.name {
            vessel.name = name.clone();
        }
        if let Some(imo) = &self.imo {
            vessel.imo = imo.clone();
        }
        if let Some(flag) = &self.flag {
            vessel.flag = flag.clone();
        }
        if let Some(vessel_type) = &self.vessel_type {
            vessel.vessel_type = vessel_type.clone();
        }
        if let Some(status) = self.status {
            vessel.status = status;
        }
        if let Some(date) = self.last_inspection_date {
            vessel.last_inspection_date = date;
        }
        vessel.updated_at = Utc::now();
    }
}
