//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use pigeonhunter::email::MailMessage;
use pigeonhunter::Config;

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Scans `INBOX`, translates into English, no deadline detection.
    pub fn new() -> Self {
        let mut config = Config::template();
        config.imap.user = "me@example.com".to_string();
        config.general.run_initial_scan = false;
        Self { config }
    }

    pub fn folders(mut self, folders: &[&str]) -> Self {
        self.config.imap.source_folders = folders.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn fallback_folder(mut self, folder: &str) -> Self {
        self.config.imap.fallback_folder = folder.to_string();
        self
    }

    pub fn target_language(mut self, lang: &str) -> Self {
        self.config.translation.target_language = lang.to_string();
        self
    }

    pub fn acceptable_languages(mut self, langs: &[&str]) -> Self {
        self.config.translation.non_translate_languages =
            langs.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn deadline_detection(mut self, enabled: bool) -> Self {
        self.config.general.enable_deadline_detection = enabled;
        self
    }

    pub fn native_deadline_detection(mut self, enabled: bool) -> Self {
        self.config.general.detect_deadlines_in_native_language = enabled;
        self
    }

    pub fn debug_scan(mut self, enabled: bool) -> Self {
        self.config.general.debug_scan = enabled;
        self
    }

    pub fn debug_prefix(mut self, prefix: &str) -> Self {
        self.config.general.debug_subject_prefix = prefix.to_string();
        self
    }

    pub fn initial_scan(mut self, enabled: bool) -> Self {
        self.config.general.run_initial_scan = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating `MailMessage` instances.
pub struct MessageBuilder {
    message: MailMessage,
}

impl MessageBuilder {
    pub fn new(uid: u32) -> Self {
        Self {
            message: MailMessage {
                uid,
                message_id: Some(format!("msg-{}@example.com", uid)),
                subject: format!("Message {}", uid),
                rendered_text: String::new(),
                original_markup: String::new(),
                is_debug_tagged: false,
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.message.message_id = Some(id.to_string());
        self
    }

    pub fn no_id(mut self) -> Self {
        self.message.message_id = None;
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.message.subject = subject.to_string();
        self
    }

    /// Sets the rendered text and a `<pre>` rendering of it as the original markup.
    pub fn body(mut self, body: &str) -> Self {
        self.message.rendered_text = body.to_string();
        self.message.original_markup = format!("<pre>{}</pre>", body);
        self
    }

    pub fn build(self) -> MailMessage {
        self.message
    }
}
