use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub imap: ImapConfig,
    pub translation: TranslationConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Mail account and the folders to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapConfig {
    pub server: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub use_tls: bool,
    pub user: String,
    /// Password stored inline. Prefer `password_file` or `password_env_var`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env_var: Option<String>,
    /// Folders scanned each pass, in order. Shrinks when a folder disappears.
    #[serde(default)]
    pub source_folders: Vec<String>,
    /// Where notifications about removed folders are delivered.
    #[serde(default = "default_fallback_folder")]
    pub fallback_folder: String,
    #[serde(default = "default_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_imap_port() -> u16 {
    993
}

fn default_true() -> bool {
    true
}

fn default_fallback_folder() -> String {
    "INBOX".to_string()
}

fn default_reconnect_attempts() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Language code replies are written in, e.g. `en`.
    pub target_language: String,
    /// Languages left untranslated. Always includes the target.
    #[serde(default)]
    pub non_translate_languages: Vec<String>,
}

/// OpenAI-compatible inference backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env_var: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_translation_model")]
    pub translation_model: String,
    #[serde(default = "default_deadline_model")]
    pub deadline_model: String,
    /// Model for short free-text translations such as folder notices.
    #[serde(default = "default_notification_model")]
    pub notification_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_translation_model() -> String {
    "gpt-5-nano".to_string()
}

fn default_deadline_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_notification_model() -> String {
    "gpt-5-nano".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_file: None,
            api_key_env_var: Some("OPENAI_API_KEY".to_string()),
            base_url: default_base_url(),
            translation_model: default_translation_model(),
            deadline_model: default_deadline_model(),
            notification_model: default_notification_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u64,
    /// Run one pass right after startup. Cleared after it has run.
    #[serde(default)]
    pub run_initial_scan: bool,
    #[serde(default)]
    pub enable_deadline_detection: bool,
    /// Also look for deadlines in mail that needed no translation.
    #[serde(default)]
    pub detect_deadlines_in_native_language: bool,
    /// Debug override mode: replay subject-tagged mail every pass.
    #[serde(default)]
    pub debug_scan: bool,
    #[serde(default = "default_debug_prefix")]
    pub debug_subject_prefix: String,
}

fn default_check_interval() -> u64 {
    15
}

fn default_debug_prefix() -> String {
    "DSPH".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: default_check_interval(),
            run_initial_scan: false,
            enable_deadline_detection: false,
            detect_deadlines_in_native_language: false,
            debug_scan: false,
            debug_subject_prefix: default_debug_prefix(),
        }
    }
}

impl Config {
    /// Starter configuration written by `--init`; the user fills in the blanks.
    pub fn template() -> Self {
        Self {
            imap: ImapConfig {
                server: "imap.example.com".to_string(),
                port: default_imap_port(),
                use_tls: true,
                user: "you@example.com".to_string(),
                password: None,
                password_file: None,
                password_env_var: Some("PIGEONHUNTER_IMAP_PASSWORD".to_string()),
                source_folders: vec!["INBOX".to_string()],
                fallback_folder: default_fallback_folder(),
                max_reconnect_attempts: default_reconnect_attempts(),
            },
            translation: TranslationConfig {
                target_language: "en".to_string(),
                non_translate_languages: vec!["en".to_string()],
            },
            openai: OpenAiConfig::default(),
            general: GeneralConfig {
                run_initial_scan: true,
                ..GeneralConfig::default()
            },
        }
    }
}
