use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub catalog: CatalogConfig,
  /// Custom title for header (defaults to "Products Demo")
  pub title: Option<String>,
  /// Products per page; also the "last page" threshold
  pub page_size: usize,
  /// Quiet period before a search term is sent
  pub search_debounce_ms: u64,
  /// How long a fetched page is reused without a new request
  pub stale_time_secs: u64,
  pub cart: CartConfig,
  pub log: LogConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      catalog: CatalogConfig::default(),
      title: None,
      page_size: 10,
      search_debounce_ms: 500,
      stale_time_secs: 10,
      cart: CartConfig::default(),
      log: LogConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub base_url: String,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CartConfig {
  /// Cart database location (default: $XDG_DATA_HOME/prodcat/cart.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// tracing filter directive, overridden by PRODCAT_LOG
  pub level: String,
  /// Log directory (default: $XDG_DATA_HOME/prodcat)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./prodcat.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/prodcat/config.yaml
  ///
  /// Nothing in the config is required, so a missing file yields defaults.
  /// PRODCAT_API_URL overrides the catalog base URL in either case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.with_env_overrides().validated()
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("prodcat.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("prodcat").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file deserializes to null, which should still mean "defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("PRODCAT_API_URL") {
      if !url.trim().is_empty() {
        self.catalog.base_url = url;
      }
    }
    self
  }

  fn validated(self) -> Result<Self> {
    if self.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    Ok(self)
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("Products Demo")
  }

  pub fn search_debounce(&self) -> Duration {
    Duration::from_millis(self.search_debounce_ms)
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }

  /// Base directory for the cart database and log file
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("prodcat"))
  }

  pub fn cart_path(&self) -> Result<PathBuf> {
    match &self.cart.path {
      Some(p) => Ok(p.clone()),
      None => Ok(Self::data_dir()?.join("cart.db")),
    }
  }

  pub fn log_dir(&self) -> Result<PathBuf> {
    match &self.log.dir {
      Some(p) => Ok(p.clone()),
      None => Self::data_dir(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.catalog.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.page_size, 10);
    assert_eq!(config.search_debounce(), Duration::from_millis(500));
    assert_eq!(config.stale_time(), Duration::from_secs(10));
    assert_eq!(config.title(), "Products Demo");
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml(
      "catalog:\n  base_url: http://localhost:3000\ntitle: Shop\nsearch_debounce_ms: 250\n",
    )
    .unwrap();

    assert_eq!(config.catalog.base_url, "http://localhost:3000");
    assert_eq!(config.title(), "Shop");
    assert_eq!(config.search_debounce_ms, 250);
    assert_eq!(config.page_size, 10);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_empty_yaml_is_default() {
    let config = Config::from_yaml("  \n").unwrap();
    assert_eq!(config.page_size, 10);
  }

  #[test]
  fn test_zero_page_size_rejected() {
    let config = Config::from_yaml("page_size: 0\n").unwrap();
    assert!(config.validated().is_err());
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }

  #[test]
  fn test_cart_path_override() {
    let config = Config::from_yaml("cart:\n  path: /tmp/cart.db\n").unwrap();
    assert_eq!(config.cart_path().unwrap(), PathBuf::from("/tmp/cart.db"));
  }
}
