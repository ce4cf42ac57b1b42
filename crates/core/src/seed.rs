//! Demo fleet used for local development

use chrono::{NaiveDate, TimeZone, Utc};

use crate::issue::{Issue, IssuePriority, IssueStatus};
use crate::quota::QuotaMode;
use crate::store::FleetRepository;
use crate::user::{Role, User};
use crate::vessel::{Vessel, VesselStatus};
use crate::{Error, Result};

pub const DEMO_ADMIN_EMAIL: &str = "admin@fleet.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_CREW_EMAIL: &str = "crew@vessel.com";
pub const DEMO_CREW_PASSWORD: &str = "crew123";

fn inspection_date(year: i32, month: u32, day: u32) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| Error::InvalidInput(format!("Invalid date {}-{}-{}", year, month, day)))
}

/// Populate an empty store with the demo fleet.
///
/// Returns `false` without writing anything when users already exist.
/// `hash_password` turns the demo plaintext passwords into stored hashes.
pub async fn seed_demo_fleet<R, F>(repo: &R, hash_password: F) -> Result<bool>
where
    R: FleetRepository + ?Sized,
    F: Fn(&str) -> String,
{
    if repo.count_users().await? > 0 {
        return Ok(false);
    }

    repo.create_user(User::new(
        DEMO_ADMIN_EMAIL,
        hash_password(DEMO_ADMIN_PASSWORD),
        Role::FleetAdmin,
    ))
    .await?;
    let crew = repo
        .create_user(User::new(
            DEMO_CREW_EMAIL,
            hash_password(DEMO_CREW_PASSWORD),
            Role::CrewMember,
        ))
        .await?;

    let pacific = repo
        .create_vessel(
            Vessel::new("Pacific Dawn", "IMO9012345", "Liberia", "Container Ship")
                .with_status(VesselStatus::Active)
                .with_last_inspection(inspection_date(2024, 6, 15)?),
        )
        .await?;
    let atlantic = repo
        .create_vessel(
            Vessel::new("Atlantic Star", "IMO9023456", "Panama", "Bulk Carrier")
                .with_status(VesselStatus::InPort)
                .with_last_inspection(inspection_date(2024, 5, 20)?),
        )
        .await?;
    let nordic = repo
        .create_vessel(
            Vessel::new("Nordic Explorer", "IMO9034567", "Norway", "Tanker")
                .with_status(VesselStatus::UnderMaintenance)
                .with_last_inspection(inspection_date(2024, 3, 10)?),
        )
        .await?;

    repo.assign(crew.id, pacific.id).await?;
    repo.assign(crew.id, atlantic.id).await?;

    let issues = [
        Issue::new(
            pacific.id,
            "Engine",
            "Unusual noise from main engine at high RPM.",
            IssuePriority::High,
        )
        .reported_by(crew.id),
        Issue::new(
            pacific.id,
            "Safety",
            "Life jacket stock low in forward section.",
            IssuePriority::Med,
        )
        .reported_by(crew.id)
        .with_status(IssueStatus::Resolved)
        .with_recommendation("Life jackets replenished."),
        Issue::new(
            atlantic.id,
            "Navigation",
            "GPS intermittent signal in specific area.",
            IssuePriority::Low,
        )
        .reported_by(crew.id),
        Issue::new(
            atlantic.id,
            "Electrical",
            "Port-side deck lights flickering.",
            IssuePriority::Med,
        )
        .reported_by(crew.id),
        Issue::new(
            nordic.id,
            "Hull",
            "Rust spots on starboard hull near waterline.",
            IssuePriority::High,
        )
        .with_status(IssueStatus::Resolved)
        .with_recommendation("Inspection completed; minor repairs scheduled."),
        Issue::new(
            pacific.id,
            "Other",
            "Galley exhaust fan not operating correctly.",
            IssuePriority::Low,
        )
        .reported_by(crew.id)
        .with_status(IssueStatus::Resolved)
        .with_recommendation("Resolved during routine check."),
    ];
    for issue in issues {
        repo.create_issue(issue, QuotaMode::Advisory).await?;
    }

    tracing::info!(
        admin = DEMO_ADMIN_EMAIL,
        crew = DEMO_CREW_EMAIL,
        vessels = 3,
        issues = 6,
        "Seeded demo fleet"
    );
    Ok(true)
}
