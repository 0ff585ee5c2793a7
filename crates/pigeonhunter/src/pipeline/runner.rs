use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{Config, ConfigStore};
use crate::email::composer::calendar_attachment;
use crate::email::{
    Attachment, EmailError, EmailTracker, MailMessage, MailSource, MessageComposer,
    MessageSelector, SubjectPrefixSelector,
};
use crate::error::ConfigError;
use crate::inference::{Decision, DeadlineExtractor, TranslationDecider};
use crate::sanitize;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::healer::FolderHealer;
use super::report::PassReport;

/// Drives scan passes over the configured folders.
pub struct Pipeline {
    config: Config,
    settings: PipelineConfig,
    tracker: EmailTracker,
    translator: Arc<dyn TranslationDecider>,
    extractor: Arc<dyn DeadlineExtractor>,
    composer: MessageComposer,
    selector: Arc<dyn MessageSelector>,
    store: Arc<dyn ConfigStore>,
    healer: FolderHealer,
}

impl Pipeline {
    pub fn new(
        config: Config,
        tracker: EmailTracker,
        translator: Arc<dyn TranslationDecider>,
        extractor: Arc<dyn DeadlineExtractor>,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        let settings = PipelineConfig::from_config(&config);
        let composer = MessageComposer::new(config.imap.user.clone());
        let selector: Arc<dyn MessageSelector> = Arc::new(SubjectPrefixSelector::new(
            config.general.debug_subject_prefix.clone(),
        ));
        let healer = FolderHealer::new(store.clone());

        Self {
            config,
            settings,
            tracker,
            translator,
            extractor,
            composer,
            selector,
            store,
            healer,
        }
    }

    /// Replaces the debug-tag predicate.
    pub fn with_selector(mut self, selector: Arc<dyn MessageSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Forces debug override mode on or off regardless of the config file.
    pub fn with_debug_mode(mut self, enabled: bool) -> Self {
        self.settings.debug_mode = enabled;
        self
    }

    /// The working configuration, including self-healed folder removals.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    pub fn tracker(&self) -> &EmailTracker {
        &self.tracker
    }

    /// Clears `run_initial_scan` and persists the change.
    pub fn clear_initial_scan(&mut self) -> Result<(), ConfigError> {
        if !self.config.general.run_initial_scan {
            return Ok(());
        }
        self.config.general.run_initial_scan = false;
        self.store.save(&self.config)
    }

    /// Connects, runs one pass and disconnects.
    pub async fn run_job(&mut self, source: &mut dyn MailSource) -> Result<PassReport, EmailError> {
        source.connect().await?;
        let report = self.run_pass(source).await;
        if let Err(e) = source.disconnect().await {
            warn!("Error while disconnecting from mail store: {}", e);
        }
        Ok(report)
    }

    /// Runs one pass over every configured folder. Per-message and
    /// per-folder failures are logged and counted, never returned.
    pub async fn run_pass(&mut self, source: &mut dyn MailSource) -> PassReport {
        let span = info_span!("pass", debug_mode = self.settings.debug_mode);
        async {
            info!("Starting email processing run");
            let mut report = PassReport::default();

            let folders = self.config.imap.source_folders.clone();
            for folder in &folders {
                self.scan_folder(source, folder, &mut report)
                    .instrument(info_span!("folder", folder = %folder))
                    .await;
            }

            self.healer.commit(&mut self.config);
            info!("Run finished: {}", report);
            report
        }
        .instrument(span)
        .await
    }

    async fn scan_folder(
        &mut self,
        source: &mut dyn MailSource,
        folder: &str,
        report: &mut PassReport,
    ) {
        debug!("Checking folder: {}", folder);
        match source.folder_exists(folder).await {
            Ok(true) => {}
            Ok(false) => {
                report.folders_missing += 1;
                self.healer
                    .handle_missing(
                        folder,
                        &self.settings.fallback_folder,
                        &self.settings.target_language,
                        source,
                        self.translator.as_ref(),
                        &self.composer,
                    )
                    .await;
                return;
            }
            Err(e) => {
                report.folders_skipped += 1;
                error!("Could not check folder '{}', skipping it this pass: {}", folder, e);
                return;
            }
        }

        let candidates = match self.collect_candidates(source, folder).await {
            Ok(candidates) => candidates,
            Err(e) => {
                report.folders_skipped += 1;
                error!("Failed to fetch emails from '{}': {}", folder, e);
                return;
            }
        };
        report.folders_scanned += 1;

        if candidates.is_empty() {
            info!("No new emails in {}", folder);
            return;
        }
        info!("Found {} candidate email(s) in {}", candidates.len(), folder);

        for message in candidates {
            report.messages_seen += 1;
            let span = info_span!(
                "message",
                uid = message.uid,
                id = %message.stable_id().map(sanitize::short_hash).unwrap_or_default(),
                debug_tagged = message.is_debug_tagged,
            );
            let uid = message.uid;
            if let Err(e) = self
                .process_message(source, folder, message, report)
                .instrument(span)
                .await
            {
                report.failed += 1;
                error!(
                    "Error processing email UID {}: {}. Will retry next time.",
                    uid, e
                );
            }
        }
    }

    /// Unread mail, plus (in debug mode) every tagged message not already in
    /// the unread set, in fetch order.
    async fn collect_candidates(
        &self,
        source: &mut dyn MailSource,
        folder: &str,
    ) -> Result<Vec<MailMessage>, EmailError> {
        let mut candidates = source.fetch_unread(folder).await?;

        if !self.settings.debug_mode {
            return Ok(candidates);
        }

        let tagged = match source.fetch_tagged(folder, self.selector.as_ref()).await {
            Ok(tagged) => tagged,
            Err(e) => {
                warn!("Could not fetch debug-tagged emails from '{}': {}", folder, e);
                Vec::new()
            }
        };

        let mut seen: HashSet<u32> = candidates.iter().map(|m| m.uid).collect();
        for message in tagged {
            if seen.insert(message.uid) {
                candidates.push(message);
            }
        }

        for message in &mut candidates {
            message.is_debug_tagged = self.selector.matches(message);
        }
        Ok(candidates)
    }

    async fn process_message(
        &self,
        source: &mut dyn MailSource,
        folder: &str,
        message: MailMessage,
        report: &mut PassReport,
    ) -> Result<(), PipelineError> {
        let stable_id = message.stable_id().map(str::to_string);

        if !message.is_debug_tagged {
            match &stable_id {
                Some(id) if self.tracker.is_processed(id) => {
                    debug!("Skipping already processed message");
                    report.deduplicated += 1;
                    return Ok(());
                }
                Some(_) => {}
                None => debug!("Message has no Message-ID; it cannot be deduplicated"),
            }
        }

        debug!("Processing email UID {} (Subject: {})", message.uid, message.subject);
        let decision = self
            .translator
            .decide(
                &message.subject,
                &message.rendered_text,
                &self.settings.target_language,
                &self.settings.acceptable_languages,
            )
            .await;

        match decision {
            Decision::Translated { subject, body } => {
                info!("Translating email (UID: {})", message.uid);
                let attachments = if self.settings.extract_for_translated(message.is_debug_tagged) {
                    self.calendar_attachments(&message).await
                } else {
                    Vec::new()
                };
                let attachment_count = attachments.len();

                let reply = self
                    .composer
                    .translation_reply(&message, &subject, &body, attachments);
                let reply_id = source.append(folder, &reply).await?;

                report.translated += 1;
                report.attachments += attachment_count;

                if message.is_debug_tagged {
                    info!("Debug-tagged email left unmarked so it is replayed next pass");
                } else {
                    self.mark(stable_id.as_deref());
                    self.mark(reply_id.as_deref());
                }
            }
            Decision::Skipped => {
                info!("Skipping email (UID: {}) - language matched", message.uid);
                report.skipped += 1;

                if self.settings.extract_for_native(message.is_debug_tagged) {
                    self.send_calendar_notice(source, folder, &message, report)
                        .await;
                }

                if !message.is_debug_tagged {
                    self.mark(stable_id.as_deref());
                }
            }
            Decision::Failed { reason } => {
                report.failed += 1;
                warn!(
                    "Translation failed for email (UID: {}): {}. Will retry next time.",
                    message.uid, reason
                );
            }
        }

        Ok(())
    }

    async fn send_calendar_notice(
        &self,
        source: &mut dyn MailSource,
        folder: &str,
        message: &MailMessage,
        report: &mut PassReport,
    ) {
        let attachments = self.calendar_attachments(message).await;
        if attachments.is_empty() {
            return;
        }
        let attachment_count = attachments.len();

        let notice = self.composer.calendar_notice(message, attachments);
        match source.append(folder, &notice).await {
            Ok(notice_id) => {
                report.calendar_notices += 1;
                report.attachments += attachment_count;
                self.mark(notice_id.as_deref());
            }
            Err(e) => error!("Could not deliver calendar notice: {}", e),
        }
    }

    /// Extracts events from the original message and encodes each one,
    /// dropping those that fail to encode.
    async fn calendar_attachments(&self, message: &MailMessage) -> Vec<Attachment> {
        let events = self
            .extractor
            .extract(
                &message.subject,
                &message.rendered_text,
                &self.settings.target_language,
            )
            .await;

        events
            .iter()
            .filter_map(|event| {
                self.extractor
                    .encode(event, &message.subject, &message.rendered_text)
                    .map(|payload| calendar_attachment(&event.title, payload))
            })
            .collect()
    }

    fn mark(&self, message_id: Option<&str>) {
        if let Some(id) = message_id {
            self.tracker.mark_processed(id);
        }
    }
}
