//! Minimal client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::error::InferenceError;
use crate::config::OpenAiConfig;

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(serde::Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One system + user exchange.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    /// Ask the backend to constrain output to a JSON object.
    pub json_mode: bool,
}

/// HTTP client bound to one backend and API key.
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl ChatClient {
    /// Builds a client from config, resolving the API key.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, InferenceError> {
        let api_key = crate::secrets::resolve_secret(
            config.api_key.as_deref(),
            config.api_key_file.as_deref(),
            config.api_key_env_var.as_deref(),
        )
        .map_err(|e| InferenceError::CredentialsNotFound(e.to_string()))?;

        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: completions_endpoint(base_url),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends the request and returns the first choice's content.
    pub async fn complete(&self, request: ChatRequest<'_>) -> Result<String, InferenceError> {
        debug!(model = request.model, json = request.json_mode, "Sending chat completion");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body(&request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| InferenceError::ResponseParse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(InferenceError::EmptyResponse)
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn request_body(request: &ChatRequest<'_>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.user_prompt }
        ]
    });
    if request.json_mode {
        body["response_format"] = serde_json::json!({ "type": "json_object" });
    }
    body
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Cuts the first JSON object or array out of a model reply, tolerating
/// code fences and chatter around it. Returns the input unchanged when no
/// opening bracket is found.
pub(crate) fn extract_json(response: &str) -> &str {
    let start = match response.find(&['{', '['][..]) {
        Some(idx) => idx,
        None => return response,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &response[start..start + i + 1];
                }
            }
            _ => {}
        }
    }

    &response[start..]
}
