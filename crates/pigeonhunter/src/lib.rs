pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod worker;

pub use config::{load_config, Config, ConfigStore, FileConfigStore};
pub use db::Database;
pub use email::{EmailTracker, ImapClient, MailSource, MessageSelector, SubjectPrefixSelector};
pub use error::{ConfigError, PigeonError, Result};
pub use inference::{
    Decision, DeadlineExtractor, EventCandidate, OpenAiDeadlineExtractor, OpenAiTranslator,
    TranslationDecider,
};
pub use pipeline::{PassReport, Pipeline, PipelineConfig};
pub use secrets::{resolve_secret, SecretError};
pub use worker::Scheduler;
