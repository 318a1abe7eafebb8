use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Main configuration structure for Repofolio
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Account and selection rules for the portfolio listing
    #[serde(default)]
    pub portfolio: FilterConfig,

    /// GitHub API endpoint settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Repository cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ordering requested from the listing endpoint
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Updated,
    Stars,
    Created,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Updated => "updated",
            SortBy::Stars => "stars",
            SortBy::Created => "created",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository selection rules
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// GitHub account whose public repositories are listed
    #[serde(default)]
    pub username: String,

    /// Only show pinned repositories
    #[serde(default = "default_true")]
    pub show_only_pinned: bool,

    /// Topic that marks a repository as pinned
    #[serde(default = "default_featured_topic")]
    pub featured_topic: String,

    /// Repository names pinned explicitly
    #[serde(default)]
    pub manual_repo_names: BTreeSet<String>,

    /// Drop forked repositories
    #[serde(default = "default_true")]
    pub exclude_forked: bool,

    /// Drop archived repositories
    #[serde(default = "default_true")]
    pub exclude_archived: bool,

    /// Sort order passed to the API
    #[serde(default)]
    pub sort_by: SortBy,

    /// How long a cached listing stays valid, in milliseconds
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
}

/// GitHub API configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Repository cache configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// SQLite database holding the cached listing
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Return an expired listing when the fetch fails
    #[serde(default)]
    pub serve_stale_on_error: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_featured_topic() -> String {
    "portfolio-featured".to_string()
}
fn default_cache_timeout_ms() -> u64 {
    3_600_000
}
fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    format!("repofolio/{}", env!("CARGO_PKG_VERSION"))
}
fn default_database_path() -> String {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        format!("{}/repofolio/cache.db", data_home)
    } else if let Ok(home) = std::env::var("HOME") {
        format!("{}/.local/share/repofolio/cache.db", home)
    } else {
        "/tmp/repofolio-cache.db".to_string()
    }
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            show_only_pinned: default_true(),
            featured_topic: default_featured_topic(),
            manual_repo_names: BTreeSet::new(),
            exclude_forked: default_true(),
            exclude_archived: default_true(),
            sort_by: SortBy::default(),
            cache_timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            serve_stale_on_error: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = Self::default();

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repofolio").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.cache.database_path = shellexpand::full(&self.cache.database_path)
            .context("Failed to expand database_path path")?
            .into_owned();

        Ok(())
    }

    /// Check the settings the pipeline cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.portfolio.username.trim().is_empty() {
            bail!("portfolio.username is not set; run `repofolio init --username <name>` or pass --username");
        }
        if self.portfolio.cache_timeout_ms == 0 {
            bail!("portfolio.cache_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn setup_test_config_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("repofolio");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        (temp_dir, config_dir)
    }

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert!(config.portfolio.username.is_empty());
        assert!(config.portfolio.show_only_pinned);
        assert_eq!(config.portfolio.featured_topic, "portfolio-featured");
        assert!(config.portfolio.manual_repo_names.is_empty());
        assert!(config.portfolio.exclude_forked);
        assert!(config.portfolio.exclude_archived);
        assert_eq!(config.portfolio.sort_by, SortBy::Updated);
        assert_eq!(config.portfolio.cache_timeout_ms, 3_600_000);
        assert_eq!(config.github.api_base_url, "https://api.github.com");
        assert!(config.github.user_agent.starts_with("repofolio/"));
        assert!(!config.cache.serve_stale_on_error);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_sort_by_strings() {
        assert_eq!(SortBy::Updated.as_str(), "updated");
        assert_eq!(SortBy::Stars.to_string(), "stars");
        assert_eq!(SortBy::Created.as_str(), "created");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.portfolio.username = "octocat".to_string();
        assert!(config.validate().is_ok());

        config.portfolio.cache_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_REPOFOLIO_HOME", "/test/home");

        let mut config = Config::default();
        config.cache.database_path = "${TEST_REPOFOLIO_HOME}/cache.db".to_string();

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.cache.database_path, "/test/home/cache.db");

        env::remove_var("TEST_REPOFOLIO_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let nonexistent_path = Path::new("/nonexistent/path/config.yml");
        let result = Config::load(nonexistent_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let (_temp_dir, config_dir) = setup_test_config_dir();
        let config_path = config_dir.join("config.yml");

        let mut config = Config::default();
        config.portfolio.username = "testuser".to_string();
        config.portfolio.show_only_pinned = false;
        config.portfolio.manual_repo_names.insert("django-todo".to_string());
        config.portfolio.sort_by = SortBy::Stars;
        config.cache.database_path = "/custom/cache.db".to_string();

        config.save(&config_path).expect("Failed to save config");

        let loaded = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded.portfolio, config.portfolio);
        assert_eq!(loaded.cache.database_path, "/custom/cache.db");
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("repofolio"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
portfolio:
  username: "dityakp"
  show_only_pinned: false
  featured_topic: "showcase"
  manual_repo_names:
    - "strapi-blue-green"
    - "django-todo"
  exclude_forked: false
  sort_by: "created"
  cache_timeout_ms: 60000
github:
  api_base_url: "http://localhost:8080"
cache:
  database_path: "/tmp/folio.db"
  serve_stale_on_error: true
logging:
  level: "debug"
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.portfolio.username, "dityakp");
        assert!(!config.portfolio.show_only_pinned);
        assert_eq!(config.portfolio.featured_topic, "showcase");
        assert!(config.portfolio.manual_repo_names.contains("django-todo"));
        assert_eq!(config.portfolio.manual_repo_names.len(), 2);
        assert!(!config.portfolio.exclude_forked);
        // Unspecified fields keep their defaults
        assert!(config.portfolio.exclude_archived);
        assert_eq!(config.portfolio.sort_by, SortBy::Created);
        assert_eq!(config.portfolio.cache_timeout_ms, 60_000);
        assert_eq!(config.github.api_base_url, "http://localhost:8080");
        assert!(config.github.user_agent.starts_with("repofolio/"));
        assert_eq!(config.cache.database_path, "/tmp/folio.db");
        assert!(config.cache.serve_stale_on_error);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_yaml_rejects_unknown_sort() {
        let yaml_content = "portfolio:\n  sort_by: \"forks\"\n";
        let result: std::result::Result<Config, _> = serde_yaml::from_str(yaml_content);
        assert!(result.is_err());
    }
}
