//! Predicates that pick messages for debug override processing.

use super::types::MailMessage;

/// Decides whether a message is selected for override processing.
pub trait MessageSelector: Send + Sync {
    /// Optional server-side search term used to narrow the candidate set.
    fn search_hint(&self) -> Option<&str> {
        None
    }

    /// Returns true if the message is selected.
    fn matches(&self, message: &MailMessage) -> bool;
}

/// Selects messages whose subject starts with a fixed marker.
#[derive(Debug, Clone)]
pub struct SubjectPrefixSelector {
    prefix: String,
}

impl SubjectPrefixSelector {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl MessageSelector for SubjectPrefixSelector {
    fn search_hint(&self) -> Option<&str> {
        Some(&self.prefix)
    }

    fn matches(&self, message: &MailMessage) -> bool {
        !self.prefix.is_empty() && message.subject.starts_with(&self.prefix)
    }
}
