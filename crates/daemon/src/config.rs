//! Daemon configuration from `WALKIN_*` environment variables

use std::path::PathBuf;
use std::str::FromStr;
use walkin_api_rpc::{RateLimitConfig, RpcServerConfig};
use walkin_core::error::{AppError, Result};

const DEFAULT_DB_PATH: &str = "~/.walkin/queue.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rolling file next to stdout output
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: PathBuf,
    /// `false` keeps everything in memory
    pub persist: bool,
    pub rpc: RpcServerConfig,
    pub log: LogConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = RpcServerConfig::default();
        let rate_defaults = RateLimitConfig::default();

        let db_path = lookup("WALKIN_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let format = match lookup("WALKIN_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "WALKIN_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            db_path: expand(&db_path),
            persist: parse_bool(&lookup, "WALKIN_PERSIST", true)?,
            rpc: RpcServerConfig {
                host: lookup("WALKIN_RPC_HOST").unwrap_or(defaults.host),
                port: parse_num(&lookup, "WALKIN_RPC_PORT", defaults.port)?,
                rate_limit: RateLimitConfig {
                    burst: parse_num(&lookup, "WALKIN_RATE_LIMIT_BURST", rate_defaults.burst)?,
                    per_second: parse_num(
                        &lookup,
                        "WALKIN_RATE_LIMIT_RATE",
                        rate_defaults.per_second,
                    )?,
                },
            },
            log: LogConfig {
                format,
                file: lookup("WALKIN_LOG_FILE")
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| expand(&s)),
            },
        })
    }

    /// sqlx connection URL for `db_path`
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path.display())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn parse_num<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} is not a valid number: '{}'", key, raw))),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(AppError::Config(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}
