//! Runtime configuration from flags and environment.

use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::error::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Base URL of the dialogue backend.
    #[arg(
        long,
        env = "LORECHAT_API_BASE",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub api_base: String,

    /// Seconds to wait for a backend response.
    #[arg(
        long,
        env = "LORECHAT_TIMEOUT_SECS",
        default_value_t = 120,
        global = true
    )]
    pub timeout_secs: u64,

    /// Log output format. The filter comes from `RUST_LOG`.
    #[arg(
        long,
        env = "LORECHAT_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without trailing slash.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Config {
    /// Validates the raw options.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the base URL is not an `http(s)` URL
    /// or the timeout is zero.
    pub fn from_args(args: &ConfigArgs) -> Result<Self, AppError> {
        let api_base = args.api_base.trim().trim_end_matches('/').to_owned();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api base must be an http:// or https:// URL, got {:?}",
                args.api_base
            )));
        }
        if args.timeout_secs == 0 {
            return Err(AppError::Config(
                "timeout must be at least one second".to_owned(),
            ));
        }
        Ok(Self {
            api_base,
            timeout: Duration::from_secs(args.timeout_secs),
            log_format: args.log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_base: &str, timeout_secs: u64) -> ConfigArgs {
        ConfigArgs {
            api_base: api_base.to_owned(),
            timeout_secs,
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_valid_args_are_normalized() {
        let config = Config::from_args(&args(" http://localhost:8000/ ", 30)).unwrap();

        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_non_http_base_is_rejected() {
        let result = Config::from_args(&args("localhost:8000", 30));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = Config::from_args(&args("https://lore.example", 0));

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
