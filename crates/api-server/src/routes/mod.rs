//! Route handlers

pub mod auth;
pub mod health;
pub mod issues;
pub mod maintenance;
pub mod users;
pub mod vessels;

#[cfg(test)]
mod test_support;

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// All HTTP routes, without state
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(vessels::router())
        .merge(issues::router())
        .merge(maintenance::router())
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Ids that don't parse can't resolve to anything
fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(format!("{} not found", entity)))
}

fn required(value: &str, message: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(trimmed.to_string())
}

fn required_opt(value: Option<String>, message: &str) -> Result<Option<String>, ApiError> {
    value.map(|value| required(&value, message)).transpose()
}

/// Accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates; blank means none
fn parse_inspection_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| ApiError::validation("Invalid lastInspectionDate"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspection_dates_accept_both_formats() {
        let day = parse_inspection_date(Some("2024-06-15")).unwrap().unwrap();
        assert_eq!(day.to_rfc3339(), "2024-06-15T00:00:00+00:00");

        let stamp = parse_inspection_date(Some("2024-06-15T12:30:00+02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(stamp.to_rfc3339(), "2024-06-15T10:30:00+00:00");

        assert!(parse_inspection_date(Some("  ")).unwrap().is_none());
        assert!(parse_inspection_date(None).unwrap().is_none());
        assert!(parse_inspection_date(Some("15/06/2024")).is_err());
    }

    #[test]
    fn nullable_distinguishes_missing_from_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "nullable")]
            note: Option<Option<String>>,
        }

        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.note, None);
        let cleared: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(cleared.note, Some(None));
        let set: Patch = serde_json::from_str(r#"{"note": "x"}"#).unwrap();
        assert_eq!(set.note, Some(Some("x".to_string())));
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_id("abc", "Vessel"), Err(ApiError::NotFound(_))));
        assert!(parse_id(&Uuid::new_v4().to_string(), "Vessel").is_ok());
    }
}
