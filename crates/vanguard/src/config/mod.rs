use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::health::scoring::{ScoreError, ScoringConfig};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
    /// Export directory loaded into the store at startup (`VANGUARD_LEDGER_DIR`).
    pub ledger_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let scoring = load_scoring()?;
        let ledger_dir = env::var("VANGUARD_LEDGER_DIR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            scoring,
            ledger_dir,
        })
    }
}

/// Scoring defaults, overlaid by `VANGUARD_SCORING_CONFIG` (a JSON document)
/// and then by the individual `VANGUARD_*` variables.
fn load_scoring() -> Result<ScoringConfig, ConfigError> {
    let mut scoring = match env::var("VANGUARD_SCORING_CONFIG") {
        Ok(path) if !path.trim().is_empty() => scoring_from_file(Path::new(path.trim()))?,
        _ => ScoringConfig::default(),
    };

    if let Ok(raw) = env::var("VANGUARD_LOOKBACK_DAYS") {
        scoring.lookback_days = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "VANGUARD_LOOKBACK_DAYS",
                value: raw.clone(),
            })?;
    }

    if let Ok(raw) = env::var("VANGUARD_WEEKLY_BASELINE") {
        scoring.weekly_baseline = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "VANGUARD_WEEKLY_BASELINE",
                value: raw.clone(),
            })?;
    }

    scoring.validate().map_err(ConfigError::Scoring)?;
    Ok(scoring)
}

/// Read a JSON scoring document; omitted fields keep their defaults.
pub fn scoring_from_file(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ScoringFile {
        path: path.to_path_buf(),
        source,
    })?;
    let scoring: ScoringConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::ScoringJson {
            path: path.to_path_buf(),
            source,
        })?;
    scoring.validate().map_err(ConfigError::Scoring)?;
    Ok(scoring)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        key: &'static str,
        value: String,
    },
    ScoringFile {
        path: PathBuf,
        source: std::io::Error,
    },
    ScoringJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    Scoring(ScoreError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be numeric, got '{value}'")
            }
            ConfigError::ScoringFile { path, .. } => {
                write!(f, "unable to read scoring config {}", path.display())
            }
            ConfigError::ScoringJson { path, .. } => {
                write!(f, "scoring config {} is not valid JSON", path.display())
            }
            ConfigError::Scoring(err) => write!(f, "scoring config rejected: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ScoringFile { source, .. } => Some(source),
            ConfigError::ScoringJson { source, .. } => Some(source),
            ConfigError::Scoring(err) => Some(err),
        }
    }
}
