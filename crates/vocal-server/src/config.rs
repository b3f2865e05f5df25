//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use vocal_voice::{ElevenLabsConfig, OpenAiConfig, PlayHtConfig, StorageConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Transcription and response generation.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Primary speech provider.
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// Alternate speech provider.
    #[serde(default)]
    pub playht: PlayHtConfig,

    /// Object storage for synthesized audio.
    #[serde(default)]
    pub storage: StorageConfig,

    /// System instruction text.
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vocal_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Where the system instruction text comes from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptConfig {
    /// File replacing the built-in instructions. `None` keeps the built-in text.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "vocal.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOCAL_HOST` overrides `server.host`
/// - `VOCAL_PORT` overrides `server.port`
/// - `VOCAL_DB_PATH` overrides `database.path`
/// - `VOCAL_LOG_LEVEL` overrides `logging.level`
/// - `VOCAL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` overrides `openai.api_key`
/// - `ELEVENLABS_API_KEY` overrides `elevenlabs.api_key`
/// - `PLAYHT_API_KEY` and `PLAYHT_USER_ID` override `playht.api_key` and `playht.user_id`
/// - `SUPABASE_PROJECT_URL`, `SUPABASE_API_KEY` and `SUPABASE_BUCKET` override
///   `storage.project_url`, `storage.api_key` and `storage.bucket`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("VOCAL_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("VOCAL_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = lookup("VOCAL_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("VOCAL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("VOCAL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.openai.api_key = key;
    }
    if let Some(key) = lookup("ELEVENLABS_API_KEY") {
        config.elevenlabs.api_key = key;
    }
    if let Some(key) = lookup("PLAYHT_API_KEY") {
        config.playht.api_key = key;
    }
    if let Some(user_id) = lookup("PLAYHT_USER_ID") {
        config.playht.user_id = user_id;
    }
    if let Some(url) = lookup("SUPABASE_PROJECT_URL") {
        config.storage.project_url = url;
    }
    if let Some(key) = lookup("SUPABASE_API_KEY") {
        config.storage.api_key = key;
    }
    if let Some(bucket) = lookup("SUPABASE_BUCKET") {
        config.storage.bucket = bucket;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.signed_url_ttl_seconds, 600);
        assert!(config.prompt.path.is_none());
    }

    #[test]
    fn file_sections_are_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[database]
path = "/tmp/vocal-test.db"

[openai]
response_model = "gpt-4.1-mini"

[storage]
project_url = "https://demo.supabase.co"
bucket = "speech"

[prompt]
path = "prompt.txt"
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/tmp/vocal-test.db");
        assert_eq!(config.database.pool_max_size, 8);
        assert_eq!(config.openai.response_model, "gpt-4.1-mini");
        assert_eq!(config.openai.transcription_model, "gpt-4o-transcribe");
        assert_eq!(config.storage.bucket, "speech");
        assert_eq!(config.prompt.path.as_deref(), Some("prompt.txt"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(file.path().to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides_credentials_and_network() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("VOCAL_PORT", "9090"),
            ("VOCAL_HOST", "0.0.0.0"),
            ("VOCAL_LOG_JSON", "1"),
            ("OPENAI_API_KEY", "sk-env"),
            ("PLAYHT_USER_ID", "ph-user"),
            ("SUPABASE_BUCKET", "env-bucket"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.logging.json);
        assert_eq!(config.openai.api_key, "sk-env");
        assert_eq!(config.playht.user_id, "ph-user");
        assert_eq!(config.storage.bucket, "env-bucket");
    }

    #[test]
    fn unparsable_port_override_is_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |name| {
            (name == "VOCAL_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 3000);
    }
}
