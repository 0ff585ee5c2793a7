//! Outgoing message composition: annotated translations, calendar notices,
//! attachment naming and reply threading.

use mail_builder::MessageBuilder;
use uuid::Uuid;

use super::error::{EmailError, Result};
use super::parser::normalize_message_id;
use super::types::{Attachment, ComposedMessage, MailMessage};

/// MIME type of calendar payloads.
pub const CALENDAR_MIME: &str = "text/calendar";

/// Maximum characters of an event title kept in an attachment filename.
pub const MAX_FILENAME_TITLE_CHARS: usize = 30;

const DEFAULT_SENDER_NAME: &str = "PigeonHunter";
const FALLBACK_ID_DOMAIN: &str = "pigeonhunter.local";

const STYLE: &str = r#"<style>
    .pigeon-translation {
        font-family: sans-serif;
        margin-bottom: 20px;
        padding: 15px;
        border: 1px solid #007bff;
        background-color: #f8f9fa;
        border-radius: 5px;
    }
    .pigeon-original {
        margin-top: 20px;
        border: 1px solid #ccc;
        padding: 10px;
        opacity: 0.9;
    }
</style>"#;

/// Reply threading derived from the original's stable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadingHeaders {
    reference: String,
}

impl ThreadingHeaders {
    /// Builds threading headers for a reply; `None` when there is nothing to link to.
    pub fn for_original(message_id: Option<&str>) -> Option<Self> {
        message_id
            .and_then(normalize_message_id)
            .map(|reference| Self { reference })
    }

    /// The referenced identifier without angle brackets.
    pub fn message_id(&self) -> &str {
        &self.reference
    }

    /// `In-Reply-To` header value.
    pub fn in_reply_to(&self) -> String {
        format!("<{}>", self.reference)
    }

    /// `References` header value.
    pub fn references(&self) -> String {
        self.in_reply_to()
    }
}

/// Builds outgoing messages on behalf of the monitored account.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    sender_name: String,
    sender_address: String,
    id_domain: String,
}

impl MessageComposer {
    /// Creates a composer writing as `sender_address` (the account itself).
    pub fn new(sender_address: impl Into<String>) -> Self {
        let sender_address = sender_address.into();
        let id_domain = sender_address
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim())
            .filter(|domain| !domain.is_empty())
            .unwrap_or(FALLBACK_ID_DOMAIN)
            .to_string();
        Self {
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            sender_address,
            id_domain,
        }
    }

    /// Composes the translated reply: translation on top, original beneath.
    pub fn translation_reply(
        &self,
        original: &MailMessage,
        translated_subject: &str,
        translated_body: &str,
        attachments: Vec<Attachment>,
    ) -> ComposedMessage {
        ComposedMessage {
            message_id: self.mint_message_id(),
            subject: translated_subject.to_string(),
            html_body: translation_html(translated_body, &original.original_markup),
            threading: ThreadingHeaders::for_original(original.stable_id()),
            attachments,
        }
    }

    /// Composes the minimal notice carrying calendar files for untranslated mail.
    pub fn calendar_notice(
        &self,
        original: &MailMessage,
        attachments: Vec<Attachment>,
    ) -> ComposedMessage {
        ComposedMessage {
            message_id: self.mint_message_id(),
            subject: format!("[Calendar] {}", original.subject),
            html_body: calendar_notice_html(attachments.len()),
            threading: ThreadingHeaders::for_original(original.stable_id()),
            attachments,
        }
    }

    /// Composes a standalone plain-text notification.
    pub fn notification(&self, subject: &str, body_text: &str) -> ComposedMessage {
        ComposedMessage {
            message_id: self.mint_message_id(),
            subject: subject.to_string(),
            html_body: format!("<pre>{}</pre>", html_escape::encode_text(body_text)),
            threading: None,
            attachments: Vec::new(),
        }
    }

    /// Renders a composed message to RFC 822 bytes.
    pub fn render(&self, message: &ComposedMessage) -> Result<Vec<u8>> {
        let mut builder = MessageBuilder::new()
            .from((self.sender_name.as_str(), self.sender_address.as_str()))
            .to(self.sender_address.as_str())
            .subject(message.subject.as_str())
            .message_id(message.message_id.as_str())
            .html_body(message.html_body.as_str());

        if let Some(threading) = &message.threading {
            builder = builder
                .in_reply_to(threading.message_id())
                .references(threading.message_id());
        }

        for attachment in &message.attachments {
            builder = builder.attachment(
                attachment.content_type.as_str(),
                attachment.filename.as_str(),
                attachment.content.as_slice(),
            );
        }

        builder
            .write_to_vec()
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    fn mint_message_id(&self) -> String {
        format!("{}@{}", Uuid::new_v4(), self.id_domain)
    }
}

/// HTML body of a translated reply.
pub fn translation_html(translated_body: &str, original_markup: &str) -> String {
    let translation = html_escape::encode_text(translated_body).replace('\n', "<br>\n");
    format!(
        r#"<html>
<head>
{STYLE}
</head>
<body>
<div class="pigeon-translation">
{translation}
</div>
<hr>
<p style="font-family: sans-serif; font-weight: bold;">Original Message:</p>
<div class="pigeon-original">
{original_markup}
</div>
</body>
</html>"#
    )
}

/// HTML body of a calendar-only notice.
pub fn calendar_notice_html(event_count: usize) -> String {
    let noun = if event_count == 1 { "event" } else { "events" };
    format!(
        r#"<html>
<body>
<p style="font-family: sans-serif;">PigeonHunter detected {event_count} calendar {noun} in this email.</p>
<p style="font-family: sans-serif;">Open the attached .ics file(s) to add them to your calendar.</p>
</body>
</html>"#
    )
}

/// Derives an attachment filename from an event title.
///
/// Titles are reduced to filename-safe characters and cut to
/// [`MAX_FILENAME_TITLE_CHARS`]. Distinct long titles may collide.
pub fn attachment_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_TITLE_CHARS)
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "event.ics".to_string()
    } else {
        format!("{}.ics", cleaned)
    }
}

/// Wraps a calendar payload as an attachment.
pub fn calendar_attachment(title: &str, content: Vec<u8>) -> Attachment {
    Attachment {
        filename: attachment_filename(title),
        content_type: CALENDAR_MIME.to_string(),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original(message_id: Option<&str>) -> MailMessage {
        MailMessage {
            uid: 1,
            message_id: message_id.map(str::to_string),
            subject: "Factura".to_string(),
            rendered_text: "Pagar antes del 10".to_string(),
            original_markup: "<pre>Pagar antes del 10</pre>".to_string(),
            is_debug_tagged: false,
        }
    }

    #[test]
    fn test_threading_headers_from_stable_id() {
        let headers = ThreadingHeaders::for_original(Some("abc123")).unwrap();
        assert_eq!(headers.in_reply_to(), "<abc123>");
        assert_eq!(headers.references(), "<abc123>");
    }

    #[test]
    fn test_threading_headers_do_not_double_brackets() {
        let headers = ThreadingHeaders::for_original(Some("<abc123>")).unwrap();
        assert_eq!(headers.in_reply_to(), "<abc123>");
    }

    #[test]
    fn test_no_threading_without_stable_id() {
        assert!(ThreadingHeaders::for_original(None).is_none());
        assert!(ThreadingHeaders::for_original(Some("  ")).is_none());

        let composer = MessageComposer::new("me@example.com");
        let reply = composer.translation_reply(&original(None), "Invoice", "Pay", Vec::new());
        assert!(reply.threading.is_none());
    }

    #[test]
    fn test_translation_reply_layers_translation_over_original() {
        let composer = MessageComposer::new("me@example.com");
        let reply = composer.translation_reply(
            &original(Some("abc123")),
            "Invoice",
            "Pay before the 10th\n<now>",
            Vec::new(),
        );

        assert_eq!(reply.subject, "Invoice");
        assert!(reply.html_body.contains("Pay before the 10th<br>"));
        assert!(reply.html_body.contains("&lt;now&gt;"));
        assert!(reply.html_body.contains("<pre>Pagar antes del 10</pre>"));
        let translated_at = reply.html_body.find("Pay before").unwrap();
        let original_at = reply.html_body.find("Pagar antes").unwrap();
        assert!(translated_at < original_at);
        assert!(reply.message_id.ends_with("@example.com"));
    }

    #[test]
    fn test_calendar_notice_names_event_count() {
        let composer = MessageComposer::new("me@example.com");
        let attachments = vec![
            calendar_attachment("Pay invoice", b"A".to_vec()),
            calendar_attachment("Meeting", b"B".to_vec()),
        ];
        let notice = composer.calendar_notice(&original(Some("abc123")), attachments);

        assert!(notice.html_body.contains("2 calendar events"));
        assert_eq!(notice.attachments.len(), 2);
        assert_eq!(notice.threading.unwrap().in_reply_to(), "<abc123>");
    }

    #[test]
    fn test_minted_ids_are_unique() {
        let composer = MessageComposer::new("not-an-address");
        let a = composer.notification("s", "b");
        let b = composer.notification("s", "b");
        assert_ne!(a.message_id, b.message_id);
        assert!(a.message_id.ends_with("@pigeonhunter.local"));
    }

    #[test]
    fn test_attachment_filename_truncates_and_sanitizes() {
        assert_eq!(attachment_filename("Pay invoice"), "Pay_invoice.ics");
        assert_eq!(attachment_filename("a/b:c"), "a_b_c.ics");
        assert_eq!(attachment_filename("???"), "event.ics");

        let long = "Quarterly tax declaration deadline for the regional office";
        let name = attachment_filename(long);
        assert_eq!(name.trim_end_matches(".ics").chars().count(), MAX_FILENAME_TITLE_CHARS);
    }

    #[test]
    fn test_long_similar_titles_collide() {
        let a = attachment_filename("Quarterly tax declaration deadline - office A");
        let b = attachment_filename("Quarterly tax declaration deadline - office B");
        assert_eq!(a, b);
    }

    #[test]
    fn test_calendar_attachment_uses_calendar_mime() {
        let attachment = calendar_attachment("Meeting", b"BEGIN:VCALENDAR".to_vec());
        assert_eq!(attachment.content_type, CALENDAR_MIME);
        assert_eq!(attachment.filename, "Meeting.ics");
    }

    #[test]
    fn test_render_includes_threading_and_attachment() {
        let composer = MessageComposer::new("me@example.com");
        let reply = composer.translation_reply(
            &original(Some("abc123")),
            "Invoice",
            "Pay before the 10th",
            vec![calendar_attachment("Pay", b"BEGIN:VCALENDAR".to_vec())],
        );

        let raw = String::from_utf8(composer.render(&reply).unwrap()).unwrap();
        assert!(raw.contains("In-Reply-To: <abc123>"));
        assert!(raw.contains("References: <abc123>"));
        assert!(raw.contains("text/calendar"));
        assert!(raw.contains("Pay.ics"));
        assert!(raw.contains(&reply.message_id));
    }

    #[test]
    fn test_render_standalone_has_no_threading() {
        let composer = MessageComposer::new("me@example.com");
        let notice = composer.notification("Folder removed", "gone");
        let raw = String::from_utf8(composer.render(&notice).unwrap()).unwrap();
        assert!(!raw.contains("In-Reply-To"));
        assert!(!raw.contains("References"));
    }
}
