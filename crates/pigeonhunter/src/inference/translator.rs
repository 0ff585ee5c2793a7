//! Translation decisions.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::InferenceError;
use super::openai::{extract_json, ChatClient, ChatRequest};
use super::types::Decision;
use crate::config::OpenAiConfig;

/// Decides whether a message needs translation and produces it.
#[async_trait]
pub trait TranslationDecider: Send + Sync {
    /// Classifies and, if needed, translates one message. Never errors:
    /// backend trouble comes back as [`Decision::Failed`].
    async fn decide(
        &self,
        subject: &str,
        body: &str,
        target_language: &str,
        acceptable_languages: &[String],
    ) -> Decision;

    /// Translates free text, e.g. a system notification.
    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, InferenceError>;
}

/// Reply shape expected from the backend.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum DecisionReply {
    Skip,
    Translated { subject: String, body: String },
}

/// Turns a raw backend reply into a [`Decision`].
pub fn parse_decision(reply: &str) -> Decision {
    match serde_json::from_str::<DecisionReply>(extract_json(reply)) {
        Ok(DecisionReply::Skip) => Decision::Skipped,
        Ok(DecisionReply::Translated { subject, body }) => {
            if body.trim().is_empty() {
                Decision::failed("translation reply has an empty body")
            } else {
                Decision::Translated { subject, body }
            }
        }
        Err(e) => Decision::failed(format!("unexpected translation reply: {}", e)),
    }
}

fn decision_prompt(target_language: &str, acceptable_languages: &[String]) -> String {
    let accepted = acceptable_languages.join(", ");
    format!(
        r#"You classify and translate emails. Reply with a single JSON object and nothing else.

If the email is written in one of these languages: [{accepted}], or contains a version in one of them, reply:
{{"status": "skip"}}

Otherwise translate the subject and the body into '{target_language}' and reply:
{{"status": "translated", "subject": "<translated subject>", "body": "<translated body>"}}"#
    )
}

fn email_prompt(subject: &str, body: &str) -> String {
    format!("Subject: {}\n\nBody:\n{}", subject, body)
}

/// Translation decider backed by an OpenAI-compatible chat model.
pub struct OpenAiTranslator {
    client: ChatClient,
    model: String,
    text_model: String,
}

impl OpenAiTranslator {
    pub fn new(client: ChatClient, model: impl Into<String>, text_model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            text_model: text_model.into(),
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> Result<Self, InferenceError> {
        Ok(Self::new(
            ChatClient::from_config(config)?,
            config.translation_model.clone(),
            config.notification_model.clone(),
        ))
    }
}

#[async_trait]
impl TranslationDecider for OpenAiTranslator {
    async fn decide(
        &self,
        subject: &str,
        body: &str,
        target_language: &str,
        acceptable_languages: &[String],
    ) -> Decision {
        let system_prompt = decision_prompt(target_language, acceptable_languages);
        let user_prompt = email_prompt(subject, body);

        let request = ChatRequest {
            model: &self.model,
            system_prompt: &system_prompt,
            user_prompt: &user_prompt,
            json_mode: true,
        };

        match self.client.complete(request).await {
            Ok(reply) => {
                let decision = parse_decision(&reply);
                debug!(outcome = decision.label(), "Translation decision received");
                decision
            }
            Err(e) => {
                warn!("Translation request failed: {}", e);
                Decision::failed(e.to_string())
            }
        }
    }

    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, InferenceError> {
        let system_prompt = format!(
            "Translate the following text to {}. Reply with the translated text only.",
            target_language
        );
        self.client
            .complete(ChatRequest {
                model: &self.text_model,
                system_prompt: &system_prompt,
                user_prompt: text,
                json_mode: false,
            })
            .await
    }
}
