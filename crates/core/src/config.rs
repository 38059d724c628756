//! Configuration management for Recall.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - Config file (`.recall/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric; history and config live in `.recall/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Chat providers the factory knows how to build.
pub const CHAT_PROVIDERS: [&str; 2] = ["openrouter", "ollama"];

/// Embedding providers the factory knows how to build.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["openrouter", "ollama", "mock"];

/// Environment variable holding the OpenRouter key unless a provider entry
/// names a different one.
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .recall/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider ("openrouter", "ollama")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Embedding provider ("openrouter", "ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model override; providers fall back to their own default
    pub embedding_model: Option<String>,

    /// Explicit API key (RECALL_API_KEY), wins over provider key env vars
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Thresholds and limits for the history pipeline
    pub history: HistoryPolicy,

    /// Local persistence settings
    pub storage: StorageConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenRouter {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
        #[serde(rename = "siteUrl")]
        site_url: Option<String>,
        #[serde(rename = "siteName")]
        site_name: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Chat model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenRouter { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model configured for this provider, if any.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenRouter {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenRouter { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Policy knobs for the history pipeline.
///
/// The two thresholds are tunable policy rather than correctness constants.
/// The near-duplicate threshold is much stricter than the suggestion threshold
/// because its matches are fed to the model as prior conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryPolicy {
    /// Maximum number of records kept; the oldest are evicted first
    pub capacity: usize,

    /// Minimum (exclusive) similarity for a record to be injected as context
    pub near_duplicate_threshold: f32,

    /// Maximum number of records injected as context
    pub near_duplicate_limit: usize,

    /// Minimum (exclusive) similarity for a record to be suggested
    pub suggestion_threshold: f32,

    /// Maximum number of suggestions
    pub suggestion_limit: usize,

    /// Quiet period before a live suggestion request is issued
    pub debounce_ms: u64,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            capacity: 100,
            near_duplicate_threshold: 0.9,
            near_duplicate_limit: 3,
            suggestion_threshold: 0.5,
            suggestion_limit: 5,
            debounce_ms: 300,
        }
    }
}

impl HistoryPolicy {
    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> AppResult<()> {
        if self.capacity == 0 {
            return Err(AppError::Config(
                "history.capacity must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("nearDuplicateThreshold", self.near_duplicate_threshold),
            ("suggestionThreshold", self.suggestion_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "history.{} must be within [-1, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database holding the key-value store; relative paths resolve
    /// against the workspace
    pub path: Option<PathBuf>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    history: Option<HistoryPolicy>,
    storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openrouter".to_string(),
            model: "perplexity/sonar".to_string(),
            embedding_provider: "openrouter".to_string(),
            embedding_model: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            history: HistoryPolicy::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `RECALL_WORKSPACE`: Override workspace path
    /// - `RECALL_CONFIG`: Path to config file
    /// - `RECALL_PROVIDER`: Chat provider
    /// - `RECALL_MODEL`: Chat model identifier
    /// - `RECALL_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RECALL_EMBEDDING_MODEL`: Embedding model identifier
    /// - `RECALL_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RECALL_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("RECALL_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.recall_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("RECALL_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("RECALL_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("RECALL_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(model) = std::env::var("RECALL_EMBEDDING_MODEL") {
            config.embedding_model = Some(model);
        }

        config.api_key = std::env::var("RECALL_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(history) = config_file.history {
            result.history = history;
        }

        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            if let Some(embedding_model) = llm
                .providers
                .get(&llm.active_embedding_provider)
                .and_then(|pc| pc.embedding_model())
            {
                result.embedding_model = Some(embedding_model.to_string());
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(embedding_provider) = embedding_provider {
            self.embedding_provider = embedding_provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .recall directory.
    pub fn recall_dir(&self) -> PathBuf {
        self.workspace.join(".recall")
    }

    /// Ensure the .recall directory exists.
    pub fn ensure_recall_dir(&self) -> AppResult<()> {
        let recall_dir = self.recall_dir();
        if !recall_dir.exists() {
            std::fs::create_dir_all(&recall_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .recall directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path of the SQLite database backing the history store.
    pub fn history_db_path(&self) -> PathBuf {
        match self.storage.path {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.recall_dir().join("history.sqlite"),
        }
    }

    /// Get the configuration entry for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Endpoint override configured for a provider.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint().map(str::to_string))
    }

    /// Resolve the API key for a provider.
    ///
    /// `RECALL_API_KEY` wins; otherwise the provider's `apiKeyEnv` (or
    /// `OPENROUTER_API_KEY` for OpenRouter without an entry) is read.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenRouter { api_key_env, .. }) => Some(api_key_env),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openrouter" => Some(DEFAULT_API_KEY_ENV.to_string()),
            None => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        if !CHAT_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                CHAT_PROVIDERS.join(", ")
            )));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        for provider in [&self.provider, &self.embedding_provider] {
            if provider == "openrouter" && self.resolve_api_key(provider).is_none() {
                return Err(AppError::Config(format!(
                    "No API key for provider '{}'. Set RECALL_API_KEY or {}",
                    provider, DEFAULT_API_KEY_ENV
                )));
            }
        }

        self.history.validate()
    }
}
