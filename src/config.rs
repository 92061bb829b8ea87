//! Application constants, data directory, and startup settings.
//!
//! Two credentials gate startup: the language-model API key and the search
//! API key. Either comes from the environment or from the secrets file; a
//! missing credential is fatal before any UI is usable.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Rounds";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the language-model API key.
pub const LLM_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the search API key.
pub const SEARCH_KEY_VAR: &str = "TAVILY_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default `RUST_LOG`-style filter when the env var is unset.
pub fn default_log_filter() -> &'static str {
    "info"
}

/// Get the application data directory
/// ~/Rounds/ on all platforms 
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Rounds")
}

/// Where the optional secrets file lives.
pub fn secrets_path() -> PathBuf {
    app_data_dir().join("secrets.json")
}

/// Everything the engine and console need at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub llm_api_key: String,
    pub search_api_key: String,
    pub base_url: String,
    pub model: String,
    pub answer_language: String,
    pub timeout_secs: u64,
}

/// On-disk secrets file. All fields optional; the environment wins for keys.
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    openai_api_key: Option<String>,
    tavily_api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    answer_language: Option<String>,
    timeout_secs: Option<u64>,
}

/// Startup failures. All fatal: the process reports them and halts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required credential {var}: set the environment variable or add it to {path}")]
    MissingCredential { var: &'static str, path: String },

    #[error("cannot read {path}: {source}")]
    SecretsIo {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed secrets file {path}: {source}")]
    SecretsParse {
        path: String,
        source: serde_json::Error,
    },
}

/// Load settings from the environment and the default secrets file.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&secrets_path())
}

/// Load settings with an explicit secrets-file path (tests use a temp dir).
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let file = read_secrets_file(path)?;
    resolve(
        env_var(LLM_KEY_VAR),
        env_var(SEARCH_KEY_VAR),
        file,
        path,
    )
}

/// A missing file is an empty one; anything else unreadable is fatal.
fn read_secrets_file(path: &Path) -> Result<SecretsFile, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SecretsFile::default()),
        Err(e) => {
            return Err(ConfigError::SecretsIo {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    serde_json::from_str(&raw).map_err(|e| ConfigError::SecretsParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Merge environment and file values; environment wins for credentials.
fn resolve(
    env_llm_key: Option<String>,
    env_search_key: Option<String>,
    file: SecretsFile,
    path: &Path,
) -> Result<Settings, ConfigError> {
    let missing = |var: &'static str| ConfigError::MissingCredential {
        var,
        path: path.display().to_string(),
    };

    let llm_api_key = env_llm_key
        .or(file.openai_api_key)
        .ok_or_else(|| missing(LLM_KEY_VAR))?;
    let search_api_key = env_search_key
        .or(file.tavily_api_key)
        .ok_or_else(|| missing(SEARCH_KEY_VAR))?;

    Ok(Settings {
        llm_api_key,
        search_api_key,
        base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        model: file.model.unwrap_or_else(|| DEFAULT_MODEL.into()),
        answer_language: file
            .answer_language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.into()),
        timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    })
}

/// Non-empty environment variable, or `None`.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
