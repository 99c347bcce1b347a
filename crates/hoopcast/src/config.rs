// Configuration loading and parsing (league.toml, assistant.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::serpentine::LEAGUE_SIZE;

/// Environment variable consulted when credentials.toml carries no key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub llm: LlmConfig,
    pub credentials: CredentialsConfig,
    pub port: u16,
    pub paths: AssetPaths,
    pub session: SessionConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    pub categories: Vec<String>,
}

// ---------------------------------------------------------------------------
// assistant.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire assistant.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AssistantFile {
    llm: LlmConfig,
    server: ServerSection,
    paths: AssetPaths,
    #[serde(default)]
    session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
}

/// Locations of the static reference material, relative to the working
/// directory unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPaths {
    pub resources_dir: String,
    pub rules_path: String,
    pub strategy_path: String,
    pub stats_csv: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of conversation turns retained per session.
    /// Zero keeps every turn.
    #[serde(default)]
    pub max_history: usize,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/assistant.toml`, and (optionally) `config/credentials.toml`,
/// all relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults
/// and does not consult the environment. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- assistant.toml (required) ---
    let assistant_path = config_dir.join("assistant.toml");
    let assistant_text = read_file(&assistant_path)?;
    let assistant_file: AssistantFile =
        toml::from_str(&assistant_text).map_err(|e| ConfigError::ParseError {
            path: assistant_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        league: league_file.league,
        llm: assistant_file.llm,
        credentials,
        port: assistant_file.server.port,
        paths: assistant_file.paths,
        session: assistant_file.session,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from the shipped `defaults/` templates.
///
/// Each default file missing from `config/` is copied over; files the user
/// already has are left untouched and `*.example` templates are never
/// copied. Returns the newly created files in name order. A base directory
/// with a `config/` but no `defaults/` is fine; one with neither is an error.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}; \
                 run hoopcast from the crate root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let mut copied = Vec::new();
    for template in default_templates(&defaults_dir)? {
        let Some(file_name) = template.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&template, &target)? {
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Regular files under `defaults/`, sorted, minus `*.example` templates.
fn default_templates(defaults_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let read_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", defaults_dir.display()),
    };

    let mut templates = Vec::new();
    for entry in std::fs::read_dir(defaults_dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_example = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("example"));
        if path.is_file() && !is_example {
            templates.push(path);
        }
    }
    templates.sort();
    Ok(templates)
}

/// Copy `source` to `target` unless `target` already exists. `create_new`
/// makes the existence check and the creation a single step.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    use std::io::Write;

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            })
        }
    };

    let content = std::fs::read(source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", source.display()),
    })?;
    dest.write_all(&content)
        .map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to write {}: {e}", target.display()),
        })?;
    Ok(true)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies default config files first and falls back to `ANTHROPIC_API_KEY`
/// when credentials.toml has no key.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_env_api_key(&mut config.credentials, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

/// Fill in the API key from the environment when the credentials file left it
/// unset or empty.
pub fn apply_env_api_key(credentials: &mut CredentialsConfig, env_value: Option<String>) {
    let has_key = credentials
        .anthropic_api_key
        .as_deref()
        .is_some_and(|k| !k.is_empty());
    if !has_key {
        if let Some(key) = env_value.filter(|k| !k.is_empty()) {
            credentials.anthropic_api_key = Some(key);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.num_teams != LEAGUE_SIZE as usize {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: format!(
                "only {LEAGUE_SIZE}-team serpentine drafts are supported, got {}",
                config.league.num_teams
            ),
        });
    }

    if config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".into(),
            message: "must not be empty".into(),
        });
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
