use crate::config::Config;

/// Per-pass settings derived from the working configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_language: String,
    /// Source languages that need no translation.
    pub acceptable_languages: Vec<String>,
    pub enable_deadline_detection: bool,
    pub detect_deadlines_in_native_language: bool,
    /// Debug override mode: tagged mail bypasses dedup and is replayed every pass.
    pub debug_mode: bool,
    pub fallback_folder: String,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_language: config.translation.target_language.clone(),
            acceptable_languages: config.translation.non_translate_languages.clone(),
            enable_deadline_detection: config.general.enable_deadline_detection,
            detect_deadlines_in_native_language: config.general.detect_deadlines_in_native_language,
            debug_mode: config.general.debug_scan,
            fallback_folder: config.imap.fallback_folder.clone(),
        }
    }

    /// Whether a translated message gets deadline extraction.
    pub fn extract_for_translated(&self, debug_tagged: bool) -> bool {
        self.enable_deadline_detection || debug_tagged
    }

    /// Whether a message left untranslated gets deadline extraction.
    pub fn extract_for_native(&self, debug_tagged: bool) -> bool {
        (self.enable_deadline_detection && self.detect_deadlines_in_native_language)
            || debug_tagged
    }
}
