//! Raw RFC 822 parsing into pipeline messages.

use log::{debug, warn};
use mail_parser::{Message, MessageParser, PartType};

use super::error::{EmailError, Result};
use super::types::MailMessage;

/// Placeholder used when neither an HTML nor a text part could be read.
pub const UNPARSEABLE_BODY: &str = "[Could not parse email body]";

/// Line width for HTML rendering; wide enough that paragraphs never wrap.
const RENDER_WIDTH: usize = 10_000;

/// Parser turning fetched messages into [`MailMessage`]s.
#[derive(Debug, Clone, Default)]
pub struct EmailParser {
    own_address: Option<String>,
}

impl EmailParser {
    /// Creates a parser that skips messages sent from `own_address`.
    pub fn new(own_address: Option<String>) -> Self {
        Self {
            own_address: own_address.map(|a| a.to_lowercase()),
        }
    }

    /// Parses a raw message. Returns `Ok(None)` for messages this account sent itself.
    pub fn parse(&self, uid: u32, raw_email: &[u8]) -> Result<Option<MailMessage>> {
        let message = MessageParser::default()
            .parse(raw_email)
            .ok_or_else(|| EmailError::ParseError(format!("UID {} is not a valid message", uid)))?;

        if self.is_own_message(&message) {
            debug!("Skipping UID {} sent by this account", uid);
            return Ok(None);
        }

        let subject = message
            .subject()
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No Subject".to_string());

        let message_id = message.message_id().and_then(normalize_message_id);
        if message_id.is_none() {
            warn!(
                "Email UID {} has no valid Message-ID. It will be processed but not linked or tracked.",
                uid
            );
        }

        let (rendered_text, original_markup) = extract_bodies(&message);

        Ok(Some(MailMessage {
            uid,
            message_id,
            subject,
            rendered_text,
            original_markup,
            is_debug_tagged: false,
        }))
    }

    fn is_own_message(&self, message: &Message<'_>) -> bool {
        let Some(own) = self.own_address.as_deref() else {
            return false;
        };
        message
            .from()
            .and_then(|from| from.first())
            .and_then(|addr| addr.address())
            .map(|addr| addr.eq_ignore_ascii_case(own))
            .unwrap_or(false)
    }
}

/// Strips whitespace and angle brackets; blank identifiers become `None`.
pub fn normalize_message_id(raw: &str) -> Option<String> {
    let id = raw.trim().trim_start_matches('<').trim_end_matches('>').trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Returns `(rendered_text, original_markup)` for a message.
fn extract_bodies(message: &Message<'_>) -> (String, String) {
    let html = message.html_bodies().find_map(|part| match &part.body {
        PartType::Html(html) => Some(html.to_string()),
        _ => None,
    });
    let text = message.text_bodies().find_map(|part| match &part.body {
        PartType::Text(text) => Some(text.to_string()),
        _ => None,
    });

    render_bodies(html.as_deref(), text.as_deref())
}

fn render_bodies(html: Option<&str>, text: Option<&str>) -> (String, String) {
    let rendered = match (html, text) {
        (Some(html), _) => match html2text::from_read(html.as_bytes(), RENDER_WIDTH) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Failed to render HTML body: {}", e);
                text.map(str::to_string)
                    .unwrap_or_else(|| UNPARSEABLE_BODY.to_string())
            }
        },
        (None, Some(text)) => text.to_string(),
        (None, None) => UNPARSEABLE_BODY.to_string(),
    };

    let markup = match html {
        Some(html) => html.to_string(),
        None => format!(
            "<pre>{}</pre>",
            html_escape::encode_text(text.unwrap_or_default())
        ),
    };

    (rendered, markup)
}
