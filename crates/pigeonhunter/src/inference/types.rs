//! Typed results of inference, validated at the backend boundary.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// Timezone assumed when a candidate carries none.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Outcome of translation inference for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Subject and body rewritten in the target language.
    Translated { subject: String, body: String },
    /// Source language is already acceptable.
    Skipped,
    /// No usable answer; the message stays eligible for the next pass.
    Failed { reason: String },
}

impl Decision {
    pub fn failed(reason: impl Into<String>) -> Self {
        Decision::Failed {
            reason: reason.into(),
        }
    }

    /// Short label for logs and counters.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Translated { .. } => "translated",
            Decision::Skipped => "skipped",
            Decision::Failed { .. } => "failed",
        }
    }
}

/// A deadline or event found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
    /// IANA zone name hint, e.g. `Europe/Zurich`.
    pub timezone: String,
}

impl EventCandidate {
    /// An all-day event on `date`.
    pub fn all_day(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date,
            start_time: None,
            end_time: None,
            all_day: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Whether the event should be encoded as a whole-day entry.
    pub fn is_all_day(&self) -> bool {
        self.all_day || self.start_time.is_none()
    }
}

/// Event entry as the backend sends it, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl TryFrom<RawEvent> for EventCandidate {
    type Error = String;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "missing title".to_string())?;

        let date_str = raw.date.ok_or_else(|| format!("event '{}' has no date", title))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|e| format!("event '{}' has invalid date '{}': {}", title, date_str, e))?;

        let start_time = parse_time(raw.start_time.as_deref())
            .map_err(|e| format!("event '{}' has invalid start_time: {}", title, e))?;
        let end_time = parse_time(raw.end_time.as_deref())
            .map_err(|e| format!("event '{}' has invalid end_time: {}", title, e))?;

        let timezone = raw
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        Ok(Self {
            title,
            description: raw.description.unwrap_or_default(),
            date,
            start_time,
            end_time,
            all_day: raw.all_day.unwrap_or(false),
            timezone,
        })
    }
}

/// Parses `HH:MM` (seconds tolerated). Blank means "not given".
fn parse_time(value: Option<&str>) -> Result<Option<NaiveTime>, String> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(Some)
        .map_err(|e| format!("'{}': {}", value, e))
}
