//! File logging.
//!
//! The terminal belongs to the UI, so tracing output goes to
//! `prodcat.log` in the configured log directory. `PRODCAT_LOG` takes
//! precedence over `log.level` from the config file.

use crate::config::Config;
use color_eyre::{eyre::WrapErr, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "prodcat.log";
pub const LOG_ENV: &str = "PRODCAT_LOG";

/// Install the global subscriber. Keep the returned guard alive for the
/// whole run or buffered lines are lost on exit.
pub fn init(config: &Config) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  std::fs::create_dir_all(&dir)
    .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;

  let (writer, guard) = non_blocking(rolling::never(&dir, LOG_FILE_NAME));

  tracing_subscriber::registry()
    .with(filter(std::env::var(LOG_ENV).ok(), &config.log.level))
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true),
    )
    .try_init()
    .wrap_err("Failed to install log subscriber")?;

  Ok(guard)
}

/// The first of `from_env` and `configured` that parses, else `info`.
fn filter(from_env: Option<String>, configured: &str) -> EnvFilter {
  from_env
    .and_then(|directives| EnvFilter::try_new(directives).ok())
    .or_else(|| EnvFilter::try_new(configured).ok())
    .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_configured_level_used_without_env() {
    let filter = filter(None, "prodcat=debug,reqwest=warn");
    assert!(filter.to_string().contains("prodcat=debug"));
  }

  #[test]
  fn test_env_overrides_configured_level() {
    let filter = filter(Some("prodcat=trace".to_string()), "warn");
    assert!(filter.to_string().contains("prodcat=trace"));
  }

  #[test]
  fn test_invalid_directives_fall_back() {
    let filter = filter(Some("prodcat=loud".to_string()), "other=quiet");
    assert_eq!(filter.to_string(), "info");
  }
}
