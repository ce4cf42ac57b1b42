//! Inspection-due scan over the fleet

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::store::FleetRepository;
use crate::vessel::Vessel;
use crate::Result;

/// Vessels not inspected within this many days are due
pub const INSPECTION_INTERVAL_DAYS: i64 = 90;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionDue {
    pub id: Uuid,
    pub name: String,
    pub imo: String,
    pub last_inspection_date: Option<DateTime<Utc>>,
}

impl From<&Vessel> for InspectionDue {
    fn from(vessel: &Vessel) -> Self {
        Self {
            id: vessel.id,
            name: vessel.name.clone(),
            imo: vessel.imo.clone(),
            last_inspection_date: vessel.last_inspection_date,
        }
    }
}

pub fn is_due_for_inspection(vessel: &Vessel, now: DateTime<Utc>) -> bool {
    let cutoff = now - Duration::days(INSPECTION_INTERVAL_DAYS);
    vessel
        .last_inspection_date
        .map_or(true, |inspected| inspected < cutoff)
}

/// Vessels never inspected or last inspected before the cutoff
pub async fn vessels_due_for_inspection<R>(repo: &R, now: DateTime<Utc>) -> Result<Vec<InspectionDue>>
where
    R: FleetRepository + ?Sized,
{
    let vessels = repo.list_vessels().await?;
    Ok(vessels
        .iter()
        .filter(|vessel| is_due_for_inspection(vessel, now))
        .map(InspectionDue::from)
        .collect())
}
