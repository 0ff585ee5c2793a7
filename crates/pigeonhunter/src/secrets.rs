//! Credential lookup for the mail account and the inference backend.
//!
//! A credential may be configured three ways, checked in this order:
//!
//! 1. **Inline** in the config file (`password`, `api_key`)
//! 2. **File** holding the value (`password_file`, `api_key_file`)
//! 3. **Environment variable** naming where to read it (`password_env_var`, `api_key_env_var`)
//!
//! Empty strings count as "not configured" so a template with blank fields
//! falls through to the next source.

use secrecy::SecretString;
use std::fs;

/// Why a credential could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("credential not configured: set an inline value, a file, or an environment variable")]
    NoSourceProvided,

    #[error("cannot read credential file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("credential variable ${name} is not set")]
    EnvVarNotSet { name: String },

    #[error("credential variable ${name} is not valid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolves a credential from the first configured source.
pub fn resolve_secret(
    inline: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = non_empty(inline) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|source| SecretError::FileReadError {
            path: expanded.clone(),
            source,
        })?;
        return Ok(SecretString::from(content.trim().to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            // Values set from shells often carry a trailing newline
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Whether at least one source is configured, without reading it.
pub fn has_secret_source(
    inline: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    non_empty(inline).is_some() || non_empty(file_path).is_some() || non_empty(env_var).is_some()
}

fn expand_home(path: &str) -> String {
    if path != "~" && !path.starts_with("~/") {
        return path.to_string();
    }
    match dirs::home_dir() {
        Some(home) => path.replacen('~', &home.to_string_lossy(), 1),
        None => path.to_string(),
    }
}
