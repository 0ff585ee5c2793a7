use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PIGEONHUNTER_CONFIG";

const APP_DIR: &str = "PigeonHunter";
const CONFIG_FILE: &str = "config.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_json::from_str(content)?;

    normalize(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn normalize(config: &mut Config) {
    config.translation.target_language = config.translation.target_language.trim().to_lowercase();
    for lang in &mut config.translation.non_translate_languages {
        *lang = lang.trim().to_lowercase();
    }
    let mut seen = HashSet::new();
    config
        .translation
        .non_translate_languages
        .retain(|lang| !lang.is_empty() && seen.insert(lang.clone()));

    // Each folder is scanned once per pass
    let mut seen = HashSet::new();
    config
        .imap
        .source_folders
        .retain(|folder| !folder.is_empty() && seen.insert(folder.clone()));
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |message: &str| {
        Err(ConfigError::Validation {
            message: message.to_string(),
        })
    };

    if config.imap.server.trim().is_empty() {
        return invalid("imap.server must not be empty");
    }
    if config.imap.user.trim().is_empty() {
        return invalid("imap.user must not be empty");
    }
    if config.imap.fallback_folder.trim().is_empty() {
        return invalid("imap.fallback_folder must not be empty");
    }

    let target = &config.translation.target_language;
    if target.is_empty() {
        return invalid("translation.target_language must not be empty");
    }
    if !config.translation.non_translate_languages.contains(target) {
        return Err(ConfigError::Validation {
            message: format!(
                "translation.non_translate_languages must contain the target language '{}'",
                target
            ),
        });
    }

    if config.general.check_interval_minutes == 0 {
        return invalid("general.check_interval_minutes must be greater than 0");
    }
    if config.general.debug_subject_prefix.trim().is_empty() {
        return invalid("general.debug_subject_prefix must not be empty");
    }

    Ok(())
}

/// Writes the config next to its final location and renames it into place,
/// so a reader never sees a half-written file.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let persist_err = |source: std::io::Error| ConfigError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }
    }

    let payload = serde_json::to_string_pretty(config)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, payload).map_err(persist_err)?;
    fs::rename(&temp_path, path).map_err(persist_err)
}

/// `<platform config dir>/PigeonHunter/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Picks the config location: explicit path, then `PIGEONHUNTER_CONFIG`, then the platform default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    default_config_path().ok_or(ConfigError::NoConfigLocation)
}

/// Writes [`Config::template`] to `path`. Returns `false` if a file already exists.
pub fn write_template(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &Config::template())?;
    Ok(true)
}

/// Durable home of the working configuration.
pub trait ConfigStore: Send + Sync {
    fn save(&self, config: &Config) -> Result<(), ConfigError>;
}

/// Stores the configuration as a JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        save_config(&self.path, config)
    }
}

/// Keeps saved configurations in memory. Used where no file should be touched.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: Mutex<Vec<Config>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently saved configuration.
    pub fn last_saved(&self) -> Option<Config> {
        self.saved.lock().ok().and_then(|saved| saved.last().cloned())
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().map(|saved| saved.len()).unwrap_or(0)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Ok(mut saved) = self.saved.lock() {
            saved.push(config.clone());
        }
        Ok(())
    }
}
