//! Removal of configured folders that no longer exist on the mail store.
//!
//! Missing folders are announced right away but only removed from the
//! working configuration once the pass is over, followed by a single save.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigStore};
use crate::email::{MailSource, MessageComposer};
use crate::inference::TranslationDecider;

/// Language the notification text is written in.
pub const NOTIFICATION_LANGUAGE: &str = "en";

const NOTIFICATION_SUBJECT: &str = "PigeonHunter Warning: Folder Removed";

fn notification_body(folder: &str) -> String {
    format!(
        "The folder '{folder}' was not found on the IMAP server.\n\
         It has been automatically removed from the list of folders to scan.\n\n\
         To scan it again, recreate the folder and add it back to your config file."
    )
}

pub struct FolderHealer {
    store: Arc<dyn ConfigStore>,
    pending: Vec<String>,
    /// The in-memory config has changes the store has not accepted yet.
    dirty: bool,
}

impl FolderHealer {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            pending: Vec::new(),
            dirty: false,
        }
    }

    /// Folders recorded for removal during the current pass.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Whether an earlier save failed and is still outstanding.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Announces a missing folder in the fallback folder and records it for
    /// removal. Delivery problems are logged; the removal happens regardless.
    pub async fn handle_missing(
        &mut self,
        folder: &str,
        fallback_folder: &str,
        target_language: &str,
        source: &mut dyn MailSource,
        translator: &dyn TranslationDecider,
        composer: &MessageComposer,
    ) {
        if self.pending.iter().any(|f| f == folder) {
            debug!("Folder '{}' already scheduled for removal", folder);
            return;
        }
        warn!(
            "Monitored folder '{}' not found. It will be removed from config.",
            folder
        );
        self.pending.push(folder.to_string());

        let (subject, body) = localized_notification(folder, target_language, translator).await;
        let notice = composer.notification(&subject, &body);

        if let Err(e) = source.append(fallback_folder, &notice).await {
            error!(
                "Could not deliver missing-folder notice to '{}': {}",
                fallback_folder, e
            );
        }
    }

    /// Applies recorded removals to `config` and persists it. Retries an
    /// earlier failed save even when nothing new was removed.
    ///
    /// Returns `false` if the save failed; the in-memory config keeps the removal.
    pub fn commit(&mut self, config: &mut Config) -> bool {
        if !self.pending.is_empty() {
            let removed = std::mem::take(&mut self.pending);
            warn!("Removing missing folders from config: {:?}", removed);
            config
                .imap
                .source_folders
                .retain(|folder| !removed.contains(folder));
            self.dirty = true;
        }

        if !self.dirty {
            return true;
        }

        match self.store.save(config) {
            Ok(()) => {
                info!("Config updated with removed folders");
                self.dirty = false;
                true
            }
            Err(e) => {
                error!("Failed to persist config, will retry after the next pass: {}", e);
                false
            }
        }
    }
}

async fn localized_notification(
    folder: &str,
    target_language: &str,
    translator: &dyn TranslationDecider,
) -> (String, String) {
    let subject = NOTIFICATION_SUBJECT.to_string();
    let body = notification_body(folder);

    if target_language == NOTIFICATION_LANGUAGE {
        return (subject, body);
    }

    let translated_subject = translator.translate_text(&subject, target_language).await;
    let translated_body = translator.translate_text(&body, target_language).await;
    match (translated_subject, translated_body) {
        (Ok(s), Ok(b)) => (s, b),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Could not translate notification, sending it untranslated: {}", e);
            (subject, body)
        }
    }
}
