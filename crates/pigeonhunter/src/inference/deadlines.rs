//! Deadline and event extraction.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::calendar;
use super::error::InferenceError;
use super::openai::{extract_json, ChatClient, ChatRequest};
use super::types::{EventCandidate, RawEvent};
use crate::config::OpenAiConfig;

/// Finds calendar-worthy events in a message and encodes them.
#[async_trait]
pub trait DeadlineExtractor: Send + Sync {
    /// Returns every valid event found. Failures yield an empty list.
    async fn extract(&self, subject: &str, body: &str, target_language: &str)
        -> Vec<EventCandidate>;

    /// Encodes one event as a calendar payload; `None` drops just that event.
    fn encode(&self, event: &EventCandidate, subject: &str, body: &str) -> Option<Vec<u8>> {
        match calendar::encode_event(event, subject, body, Utc::now()) {
            Ok(ics) => Some(ics.into_bytes()),
            Err(e) => {
                warn!("Could not encode event '{}': {}", event.title, e);
                None
            }
        }
    }
}

/// Accepts `{"events": [...]}`, `{"deadlines": [...]}` or a bare array, and
/// keeps the entries that validate.
pub fn parse_events(reply: &str) -> Result<Vec<EventCandidate>, InferenceError> {
    let value: Value = serde_json::from_str(extract_json(reply))
        .map_err(|e| InferenceError::ResponseParse(e.to_string()))?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events").or_else(|| map.remove("deadlines")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let events = entries
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value::<RawEvent>(entry)
                .map_err(|e| e.to_string())
                .and_then(EventCandidate::try_from)
                .map_err(|reason| warn!("Dropping invalid event entry: {}", reason))
                .ok()
        })
        .collect();

    Ok(events)
}

fn extraction_prompt(target_language: &str) -> String {
    format!(
        r#"You find deadlines, appointments, invitations and other dated events in emails.
Reply with a JSON object {{"events": [...]}}; the list is empty when nothing is found.
Each event has:
  "title": short title in {target_language}
  "description": relevant context from the email
  "date": "YYYY-MM-DD"
  "start_time": "HH:MM" or null
  "end_time": "HH:MM" or null
  "all_day": true when no time is given
  "timezone": IANA zone name, "UTC" when unknown
A deadline without a time ends at "23:59"."#
    )
}

/// Deadline extractor backed by an OpenAI-compatible chat model.
pub struct OpenAiDeadlineExtractor {
    client: ChatClient,
    model: String,
}

impl OpenAiDeadlineExtractor {
    pub fn new(client: ChatClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self, InferenceError> {
        Ok(Self::new(
            ChatClient::from_config(config)?,
            config.deadline_model.clone(),
        ))
    }
}

#[async_trait]
impl DeadlineExtractor for OpenAiDeadlineExtractor {
    async fn extract(
        &self,
        subject: &str,
        body: &str,
        target_language: &str,
    ) -> Vec<EventCandidate> {
        let system_prompt = extraction_prompt(target_language);
        let user_prompt = format!("Subject: {}\n\nBody:\n{}", subject, body);

        let reply = match self
            .client
            .complete(ChatRequest {
                model: &self.model,
                system_prompt: &system_prompt,
                user_prompt: &user_prompt,
                json_mode: true,
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Deadline detection request failed: {}", e);
                return Vec::new();
            }
        };

        match parse_events(&reply) {
            Ok(events) => {
                info!("Detected {} deadline(s)/event(s) in email", events.len());
                events
            }
            Err(e) => {
                debug!("Unparseable deadline reply: {}", reply);
                warn!("Deadline detection failed: {}", e);
                Vec::new()
            }
        }
    }
}
