//! iCalendar (RFC 5545) encoding of detected events.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::types::EventCandidate;

pub const PRODUCT_ID: &str = "-//PigeonHunter Email Deadline//EN";

/// Characters of the original body copied into the event description.
pub const BODY_EXCERPT_CHARS: usize = 500;

const MAX_LINE_OCTETS: usize = 75;

/// A single event could not be encoded.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{date} {time} does not exist in timezone {timezone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        time: NaiveTime,
        timezone: String,
    },

    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),
}

/// Encodes `event` as a VCALENDAR with one VEVENT. `now` stamps DTSTAMP.
pub fn encode_event(
    event: &EventCandidate,
    email_subject: &str,
    email_body: &str,
    now: DateTime<Utc>,
) -> Result<String, EncodeError> {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODUCT_ID),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@pigeonhunter", Uuid::new_v4()),
        format!("DTSTAMP:{}", utc_stamp(now)),
        format!("SUMMARY:{}", escape_text(&event.title)),
    ];

    match (event.is_all_day(), event.start_time) {
        (false, Some(start)) => {
            let (start, end) = timed_span(event, start)?;
            lines.push(format!("DTSTART:{}", utc_stamp(start)));
            lines.push(format!("DTEND:{}", utc_stamp(end)));
        }
        _ => {
            let next_day = event
                .date
                .succ_opt()
                .ok_or(EncodeError::DateOutOfRange(event.date))?;
            lines.push(format!("DTSTART;VALUE=DATE:{}", event.date.format("%Y%m%d")));
            lines.push(format!("DTEND;VALUE=DATE:{}", next_day.format("%Y%m%d")));
        }
    }

    lines.push(format!(
        "DESCRIPTION:{}",
        escape_text(&description(event, email_subject, email_body))
    ));
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in &lines {
        out.push_str(&fold_line(line));
        out.push_str("\r\n");
    }
    Ok(out)
}

fn description(event: &EventCandidate, email_subject: &str, email_body: &str) -> String {
    let excerpt: String = email_body.chars().take(BODY_EXCERPT_CHARS).collect();
    format!(
        "{}\n\n--- Original Email ---\nSubject: {}\nContent: {}...",
        event.description, email_subject, excerpt
    )
}

/// Resolves the event's wall-clock span in its zone to UTC.
fn timed_span(
    event: &EventCandidate,
    start: NaiveTime,
) -> Result<(DateTime<Utc>, DateTime<Utc>), EncodeError> {
    let tz = resolve_timezone(&event.timezone);
    let start_utc = to_utc(tz, event.date, start, &event.timezone)?;

    let end_utc = match event.end_time {
        Some(end) => {
            // An end before the start means the event runs past midnight
            let end_date = if end <= start {
                event
                    .date
                    .succ_opt()
                    .ok_or(EncodeError::DateOutOfRange(event.date))?
            } else {
                event.date
            };
            to_utc(tz, end_date, end, &event.timezone)?
        }
        None => start_utc + Duration::hours(1),
    };

    Ok((start_utc, end_utc))
}

fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!("Invalid timezone '{}', using UTC", name);
            Tz::UTC
        }
    }
}

fn to_utc(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
    tz_name: &str,
) -> Result<DateTime<Utc>, EncodeError> {
    tz.from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| EncodeError::NonexistentLocalTime {
            date,
            time,
            timezone: tz_name.to_string(),
        })
}

fn utc_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escapes a TEXT value.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Folds a content line at 75 octets without splitting a UTF-8 sequence.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // The leading space counts toward the continuation line
            used = 1;
        }
        out.push(c);
        used += width;
    }
    out
}
