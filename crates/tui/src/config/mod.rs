use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    pages::list::PAGE_SIZES,
};

const DEFAULT_CONFIG_PATH: &str = "config/txdesk.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend base URL, API base path included.
    pub base_url: String,
    pub page_size: u32,
    pub stale_after_secs: u64,
    pub log_file: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            page_size: 10,
            stale_after_secs: 300,
            log_file: "txdesk.log".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    fn validate(self) -> Result<Self> {
        if !PAGE_SIZES.contains(&self.page_size) {
            return Err(AppError::Setting(format!(
                "page_size must be one of {PAGE_SIZES:?}, got {}",
                self.page_size
            )));
        }
        if self.stale_after_secs == 0 {
            return Err(AppError::Setting(
                "stale_after_secs must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "txdesk_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8080/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the initial page size (10, 20, 50 or 100).
    #[arg(long)]
    page_size: Option<u32>,
    /// Override the log file path.
    #[arg(long)]
    log_file: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    resolve(Args::parse())
}

fn resolve(args: Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TXDESK"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    settings.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_config_file() {
        let settings = resolve(Args {
            config: Some("does/not/exist.toml".to_string()),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.stale_after(), Duration::from_secs(300));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn cli_flags_override_file_values() {
        let settings = resolve(Args {
            config: Some("does/not/exist.toml".to_string()),
            base_url: Some("http://backend:9000/api".to_string()),
            page_size: Some(50),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(settings.base_url, "http://backend:9000/api");
        assert_eq!(settings.page_size, 50);
    }

    #[test]
    fn rejects_unsupported_page_size() {
        let err = resolve(Args {
            config: Some("does/not/exist.toml".to_string()),
            page_size: Some(15),
            ..Args::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Setting(_)));
    }
}
