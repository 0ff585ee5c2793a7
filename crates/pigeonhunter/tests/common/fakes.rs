//! In-memory collaborators with scripted behavior and call recording.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use pigeonhunter::config::Config;
use pigeonhunter::db::{Database, DatabaseError};
use pigeonhunter::email::error::Result as EmailResult;
use pigeonhunter::email::{
    ComposedMessage, EmailError, LedgerStore, MailMessage, MailSource, MessageSelector,
};
use pigeonhunter::error::ConfigError;
use pigeonhunter::inference::{
    encode_event, Decision, DeadlineExtractor, EventCandidate, InferenceError,
    TranslationDecider,
};
use pigeonhunter::ConfigStore;

// ============================================
// Mail source
// ============================================

#[derive(Debug, Clone)]
struct StoredMessage {
    message: MailMessage,
    seen: bool,
}

/// A mail store held in memory.
///
/// Folders not present are reported missing. Appended messages are recorded
/// in `appended` but not delivered into folders.
#[derive(Default)]
pub struct FakeMailSource {
    folders: BTreeMap<String, Vec<StoredMessage>>,
    unreachable_folders: HashSet<String>,
    fetch_failures: HashSet<String>,
    append_failures: usize,
    scripted_ids: VecDeque<String>,
    pub appended: Vec<(String, ComposedMessage)>,
    pub connects: usize,
    pub disconnects: usize,
    pub exists_checks: Vec<String>,
    pub unread_fetches: Vec<String>,
    pub tagged_fetches: Vec<String>,
}

impl FakeMailSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, name: &str) -> Self {
        self.folders.entry(name.to_string()).or_default();
        self
    }

    /// Adds an unread message to `folder`, creating the folder if needed.
    pub fn deliver(&mut self, folder: &str, message: MailMessage) {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(StoredMessage {
                message,
                seen: false,
            });
    }

    /// Adds an already-read message to `folder`.
    pub fn deliver_read(&mut self, folder: &str, message: MailMessage) {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(StoredMessage {
                message,
                seen: true,
            });
    }

    /// Marks every message in `folder` as read, as a mail client would.
    pub fn mark_all_read(&mut self, folder: &str) {
        if let Some(messages) = self.folders.get_mut(folder) {
            messages.iter_mut().for_each(|m| m.seen = true);
        }
    }

    pub fn remove_folder(&mut self, folder: &str) {
        self.folders.remove(folder);
    }

    /// `folder_exists` for this folder fails with a transport error.
    pub fn make_unreachable(&mut self, folder: &str) {
        self.unreachable_folders.insert(folder.to_string());
    }

    /// Fetches from this folder fail with a transport error.
    pub fn fail_fetches(&mut self, folder: &str) {
        self.fetch_failures.insert(folder.to_string());
    }

    /// The next `count` appends fail.
    pub fn fail_next_appends(&mut self, count: usize) {
        self.append_failures = count;
    }

    /// Identifiers returned by upcoming appends, in order, instead of the composed one.
    pub fn script_append_ids(&mut self, ids: &[&str]) {
        self.scripted_ids = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn appended_to(&self, folder: &str) -> Vec<&ComposedMessage> {
        self.appended
            .iter()
            .filter(|(f, _)| f == folder)
            .map(|(_, m)| m)
            .collect()
    }

    fn messages(&self, folder: &str) -> EmailResult<&Vec<StoredMessage>> {
        if self.fetch_failures.contains(folder) {
            return Err(EmailError::ConnectionFailed("connection reset".to_string()));
        }
        self.folders
            .get(folder)
            .ok_or_else(|| EmailError::FolderNotFound(folder.to_string()))
    }
}

#[async_trait]
impl MailSource for FakeMailSource {
    async fn connect(&mut self) -> EmailResult<()> {
        self.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> EmailResult<()> {
        self.disconnects += 1;
        Ok(())
    }

    async fn list_folders(&mut self) -> EmailResult<Vec<String>> {
        Ok(self.folders.keys().cloned().collect())
    }

    async fn folder_exists(&mut self, folder: &str) -> EmailResult<bool> {
        self.exists_checks.push(folder.to_string());
        if self.unreachable_folders.contains(folder) {
            return Err(EmailError::Timeout("LIST".to_string()));
        }
        Ok(self.folders.contains_key(folder))
    }

    async fn fetch_unread(&mut self, folder: &str) -> EmailResult<Vec<MailMessage>> {
        self.unread_fetches.push(folder.to_string());
        Ok(self
            .messages(folder)?
            .iter()
            .filter(|m| !m.seen)
            .map(|m| m.message.clone())
            .collect())
    }

    async fn fetch_tagged(
        &mut self,
        folder: &str,
        selector: &dyn MessageSelector,
    ) -> EmailResult<Vec<MailMessage>> {
        self.tagged_fetches.push(folder.to_string());
        Ok(self
            .messages(folder)?
            .iter()
            .filter(|m| selector.matches(&m.message))
            .map(|m| m.message.clone())
            .collect())
    }

    async fn append(
        &mut self,
        folder: &str,
        message: &ComposedMessage,
    ) -> EmailResult<Option<String>> {
        if self.append_failures > 0 {
            self.append_failures -= 1;
            return Err(EmailError::ConnectionFailed("append rejected".to_string()));
        }
        self.appended.push((folder.to_string(), message.clone()));
        let id = self
            .scripted_ids
            .pop_front()
            .unwrap_or_else(|| message.message_id.clone());
        Ok(Some(id))
    }
}

// ============================================
// Translation decider
// ============================================

#[derive(Debug, Clone)]
struct Script {
    source_language: String,
    subject: String,
    body: String,
}

/// Decider answering from a script keyed by subject.
///
/// A scripted message is `Skipped` when its source language is acceptable
/// and `Translated` otherwise. Unscripted subjects fail.
#[derive(Default)]
pub struct ScriptedTranslator {
    scripts: HashMap<String, Script>,
    failing: Mutex<HashSet<String>>,
    text_translation_fails: bool,
    pub decide_calls: Mutex<Vec<String>>,
    pub text_calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `subject` as written in `language`, translating to the given pair.
    pub fn script(
        mut self,
        subject: &str,
        language: &str,
        translated_subject: &str,
        translated_body: &str,
    ) -> Self {
        self.scripts.insert(
            subject.to_string(),
            Script {
                source_language: language.to_string(),
                subject: translated_subject.to_string(),
                body: translated_body.to_string(),
            },
        );
        self
    }

    /// Scripts `subject` as already written in `language`.
    pub fn native(self, subject: &str, language: &str) -> Self {
        self.script(subject, language, subject, "")
    }

    /// Decisions for `subject` fail until [`Self::recover`] is called.
    pub fn fail_on(self, subject: &str) -> Self {
        self.failing.lock().unwrap().insert(subject.to_string());
        self
    }

    pub fn recover(&self, subject: &str) {
        self.failing.lock().unwrap().remove(subject);
    }

    pub fn fail_text_translation(mut self) -> Self {
        self.text_translation_fails = true;
        self
    }

    pub fn decide_count(&self) -> usize {
        self.decide_calls.lock().unwrap().len()
    }

    pub fn decided_subjects(&self) -> Vec<String> {
        self.decide_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationDecider for ScriptedTranslator {
    async fn decide(
        &self,
        subject: &str,
        _body: &str,
        _target_language: &str,
        acceptable_languages: &[String],
    ) -> Decision {
        self.decide_calls.lock().unwrap().push(subject.to_string());

        if self.failing.lock().unwrap().contains(subject) {
            return Decision::failed("backend unavailable");
        }
        match self.scripts.get(subject) {
            Some(script) if acceptable_languages.contains(&script.source_language) => {
                Decision::Skipped
            }
            Some(script) => Decision::Translated {
                subject: script.subject.clone(),
                body: script.body.clone(),
            },
            None => Decision::failed(format!("no script for '{}'", subject)),
        }
    }

    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, InferenceError> {
        self.text_calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_language.to_string()));
        if self.text_translation_fails {
            return Err(InferenceError::Http("connection refused".to_string()));
        }
        Ok(format!("[{}] {}", target_language, text))
    }
}

// ============================================
// Deadline extractor
// ============================================

/// Extractor returning scripted events keyed by subject.
#[derive(Default)]
pub struct ScriptedExtractor {
    events: HashMap<String, Vec<EventCandidate>>,
    unencodable: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(mut self, subject: &str, events: Vec<EventCandidate>) -> Self {
        self.events.insert(subject.to_string(), events);
        self
    }

    /// Events with this title fail to encode.
    pub fn unencodable(mut self, title: &str) -> Self {
        self.unencodable.insert(title.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DeadlineExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        subject: &str,
        _body: &str,
        _target_language: &str,
    ) -> Vec<EventCandidate> {
        self.calls.lock().unwrap().push(subject.to_string());
        self.events.get(subject).cloned().unwrap_or_default()
    }

    fn encode(&self, event: &EventCandidate, subject: &str, body: &str) -> Option<Vec<u8>> {
        if self.unencodable.contains(&event.title) {
            return None;
        }
        encode_event(event, subject, body, chrono::Utc::now())
            .ok()
            .map(String::into_bytes)
    }
}

// ============================================
// Ledger and config storage
// ============================================

/// Ledger over SQLite whose inserts can be made to fail.
pub struct FlakyLedger {
    db: Database,
    pub fail_inserts: Mutex<bool>,
    pub fail_lookups: Mutex<bool>,
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
            fail_inserts: Mutex::new(false),
            fail_lookups: Mutex::new(false),
        }
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock().unwrap() = fail;
    }
}

impl LedgerStore for FlakyLedger {
    fn contains(&self, message_id: &str) -> Result<bool, DatabaseError> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(DatabaseError::LockPoisoned);
        }
        self.db.contains(message_id)
    }

    fn insert(&self, message_id: &str) -> Result<(), DatabaseError> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(DatabaseError::LockPoisoned);
        }
        self.db.insert(message_id)
    }

    fn count(&self) -> Result<u64, DatabaseError> {
        self.db.count()
    }
}

/// Config store that rejects saves until told otherwise.
#[derive(Default)]
pub struct FailingConfigStore {
    pub healthy: Mutex<bool>,
    pub attempts: Mutex<usize>,
    pub saved: Mutex<Vec<Config>>,
}

impl FailingConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heal(&self) {
        *self.healthy.lock().unwrap() = true;
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn last_saved(&self) -> Option<Config> {
        self.saved.lock().unwrap().last().cloned()
    }
}

impl ConfigStore for FailingConfigStore {
    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        *self.attempts.lock().unwrap() += 1;
        if !*self.healthy.lock().unwrap() {
            return Err(ConfigError::Persist {
                path: "/read-only/config.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}
