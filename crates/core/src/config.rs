use std::env;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://marea.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            logging: LoggingConfig { level: "info".to_string() },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    database: FileDatabase,
    #[serde(default)]
    llm: FileLlm,
    #[serde(default)]
    logging: FileLogging,
}

#[derive(Debug, Default, Deserialize)]
struct FileDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLlm {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLogging {
    level: Option<String>,
}

impl AppConfig {
    /// Layered load: built-in defaults, then an optional TOML file, then
    /// `MAREA_*` environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| env::var("MAREA_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("marea.toml"));
        if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
            let file: FileConfig = toml::from_str(&raw)
                .map_err(|source| ConfigError::ParseFile { path: path.clone(), source })?;
            config.apply_file(file);
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(url) = file.database.url {
            self.database.url = url;
        }
        if let Some(max_connections) = file.database.max_connections {
            self.database.max_connections = max_connections;
        }
        if let Some(timeout_secs) = file.database.timeout_secs {
            self.database.timeout_secs = timeout_secs;
        }
        if let Some(provider) = file.llm.provider {
            self.llm.provider = provider;
        }
        if let Some(api_key) = file.llm.api_key {
            self.llm.api_key = Some(api_key.into());
        }
        if let Some(base_url) = file.llm.base_url {
            self.llm.base_url = Some(base_url);
        }
        if let Some(model) = file.llm.model {
            self.llm.model = model;
        }
        if let Some(timeout_secs) = file.llm.timeout_secs {
            self.llm.timeout_secs = timeout_secs;
        }
        if let Some(max_retries) = file.llm.max_retries {
            self.llm.max_retries = max_retries;
        }
        if let Some(level) = file.logging.level {
            self.logging.level = level;
        }
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("MAREA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(level) = env::var("MAREA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(model) = env::var("MAREA_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(api_key) = env::var("MAREA_LLM_API_KEY") {
            self.llm.api_key = Some(api_key.into());
        }
        if let Ok(value) = env::var("MAREA_LLM_MAX_RETRIES") {
            self.llm.max_retries = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "MAREA_LLM_MAX_RETRIES".to_string(),
                value,
            })?;
        }
        Ok(())
    }
}
