use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::Los_Angeles;
use serde::{Deserialize, Serialize};

/// Zone attached to every event body sent to the provider.
pub const EVENT_TIME_ZONE: &str = "America/Los_Angeles";

/// Logical event before provider-specific encoding. Identity is assigned by
/// the provider and comes back as an opaque id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// Partial update: only supplied fields are overlaid onto the stored event.
#[derive(Debug, Clone, Default)]
pub struct EventUpdates {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimes {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parses start/end for a write operation, naming the offending field on
/// failure. Start/end ordering is not checked here; the provider rejects
/// ranges it cannot store.
pub fn validate_times(start_time: &str, end_time: &str) -> Result<EventTimes, String> {
    let start =
        parse_event_time(start_time).ok_or_else(|| format!("Invalid start time: {start_time}"))?;
    let end = parse_event_time(end_time).ok_or_else(|| format!("Invalid end time: {end_time}"))?;
    Ok(EventTimes { start, end })
}

/// Accepts RFC3339, a handful of naive formats (read in the event zone), and
/// bare dates (all-day events come back from the provider as `YYYY-MM-DD`).
pub fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return local_to_utc(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return local_to_utc(date.and_hms_opt(0, 0, 0)?);
    }
    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Los_Angeles
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
