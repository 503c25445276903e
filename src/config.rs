//! Configuration management for emailenrich
//!
//! Configuration is loaded from `./config/emailenrich.toml`. When that file is
//! missing the embedded default template is used, so the tool runs without
//! any setup. `--init` writes the template out for editing.

use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/emailenrich.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/emailenrich.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_max_redirects() -> usize {
    5
}

/// Generic web-search fallback used as a snippet source
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
}

fn default_max_snippets() -> usize {
    5
}

/// Persistent and in-memory cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub dir: PathBuf,
    #[serde(default = "default_domain_type_file")]
    pub domain_type_file: String,
    #[serde(default = "default_university_file")]
    pub university_file: String,
    #[serde(default = "default_sector_capacity")]
    pub sector_capacity: usize,
}

fn default_domain_type_file() -> String {
    "domain_cache.jsonl".to_string()
}

fn default_university_file() -> String {
    "university_cache.jsonl".to_string()
}

fn default_sector_capacity() -> usize {
    1024
}

impl CacheConfig {
    pub fn domain_type_path(&self) -> PathBuf {
        self.dir.join(&self.domain_type_file)
    }

    pub fn university_path(&self) -> PathBuf {
        self.dir.join(&self.university_file)
    }
}

/// Person-name discovery settings
#[derive(Debug, Clone, Deserialize)]
pub struct NamesConfig {
    /// Capacity of the name-extraction LRU memo
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,
    /// Site paths scraped for staff names, relative to the domain root
    #[serde(default = "default_name_pages")]
    pub pages: Vec<String>,
}

fn default_memo_capacity() -> usize {
    100
}

fn default_name_pages() -> Vec<String> {
    ["", "/about", "/team", "/leadership", "/founders", "/management"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            memo_capacity: default_memo_capacity(),
            pages: default_name_pages(),
        }
    }
}

/// Word-vector table used for the similarity fallback
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// GloVe-format text file; similarity is disabled when unset
    #[serde(default)]
    pub vectors_path: Option<PathBuf>,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_threshold() -> f32 {
    0.5
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            vectors_path: None,
            threshold: default_threshold(),
        }
    }
}

/// Location of the optional known-domain overlay files
#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_tables_dir")]
    pub dir: PathBuf,
}

fn default_tables_dir() -> PathBuf {
    PathBuf::from("./config")
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            dir: default_tables_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
                request_timeout_secs: 5,
                max_redirects: default_max_redirects(),
            },
            search: SearchConfig {
                endpoint: "https://duckduckgo.com/html".to_string(),
                max_snippets: default_max_snippets(),
            },
            cache: CacheConfig {
                dir: PathBuf::from("./cache"),
                domain_type_file: default_domain_type_file(),
                university_file: default_university_file(),
                sector_capacity: default_sector_capacity(),
            },
            names: NamesConfig::default(),
            embedding: EmbeddingConfig::default(),
            tables: TablesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load from the default path, falling back to the embedded template
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::FileNotFound(_)) => Self::from_toml(DEFAULT_CONFIG),
            other => other,
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }

        if !self.search.endpoint.starts_with("https://") && !self.search.endpoint.starts_with("http://") {
            return Err(ConfigError::InvalidUrl {
                field: "search.endpoint".to_string(),
                url: self.search.endpoint.clone(),
            });
        }
        if self.search.max_snippets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.max_snippets".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.cache.sector_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.sector_capacity".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.cache.domain_type_file.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "cache.domain_type_file".to_string(),
            });
        }
        if self.cache.university_file.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "cache.university_file".to_string(),
            });
        }

        if self.names.memo_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "names.memo_capacity".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.embedding.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "embedding.threshold".to_string(),
                reason: format!("{} is outside [0, 1]", self.embedding.threshold),
            });
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }
}
