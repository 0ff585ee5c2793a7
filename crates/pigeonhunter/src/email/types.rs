//! Message types exchanged with the mail store.

/// A message read from a monitored folder, normalized for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    /// Folder-scoped UID. Not stable across sessions.
    pub uid: u32,
    /// `Message-ID` header without angle brackets. `None` when absent or blank.
    pub message_id: Option<String>,
    /// Decoded subject line.
    pub subject: String,
    /// Plain-text rendering of the body, fed to inference.
    pub rendered_text: String,
    /// Best-effort HTML of the original, shown beneath a translation.
    pub original_markup: String,
    /// Selected for debug override processing during this pass.
    pub is_debug_tagged: bool,
}

impl MailMessage {
    /// Returns the stable identifier if it is present and non-empty.
    pub fn stable_id(&self) -> Option<&str> {
        self.message_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    /// Full MIME type, e.g. `text/calendar`.
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An outgoing message ready to be appended to a folder.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    /// Stable identifier minted for this message (no angle brackets).
    pub message_id: String,
    pub subject: String,
    pub html_body: String,
    /// Reply threading, absent for standalone messages.
    pub threading: Option<super::composer::ThreadingHeaders>,
    pub attachments: Vec<Attachment>,
}
