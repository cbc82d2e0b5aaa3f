use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::matching::config::{MatchPolicy, DEFAULT_RADIUS_KM};

const DEV_NATIVE_SECRET: &str = "crewmatch-dev-native-secret";
const DEV_LEGACY_SECRET: &str = "crewmatch-dev-legacy-secret";

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
    pub auth: AuthConfig,
    pub matching: MatchingConfig,
    pub directory: DirectoryConfig,
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

        let auth = AuthConfig {
            native_secret: secret(environment, "NATIVE_JWT_SECRET", DEV_NATIVE_SECRET)?,
            legacy_secret: secret(environment, "LEGACY_JWT_SECRET", DEV_LEGACY_SECRET)?,
            leeway_seconds: parsed("AUTH_LEEWAY_SECONDS", 60u64)?,
        };

        let default_radius_km = parsed("MATCH_DEFAULT_RADIUS_KM", DEFAULT_RADIUS_KM)?;
        if !default_radius_km.is_finite() || default_radius_km < 0.0 {
            return Err(ConfigError::InvalidValue {
                var: "MATCH_DEFAULT_RADIUS_KM",
                value: default_radius_km.to_string(),
            });
        }
        let matching = MatchingConfig {
            policy: MatchPolicy {
                default_radius_km,
                strict_radius: flag("MATCH_STRICT_RADIUS")?,
            },
            timeout: Duration::from_millis(parsed("MATCH_TIMEOUT_MS", 5_000u64)?),
        };

        let directory = DirectoryConfig {
            seed_path: env::var("DIRECTORY_SEED_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth,
            matching,
            directory,
        })
    }
}

fn secret(
    environment: AppEnvironment,
    var: &'static str,
    development_default: &str,
) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if environment == AppEnvironment::Production => Err(ConfigError::MissingSecret { var }),
        _ => Ok(development_default.to_string()),
    }
}

fn parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(default),
    }
}

fn flag(var: &'static str) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidValue { var, value: raw }),
        },
        Err(_) => Ok(false),
    }
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
}

/// Signing secrets for both credential generations.
#[derive(Clone)]
pub struct AuthConfig {
    pub native_secret: String,
    pub legacy_secret: String,
    pub leeway_seconds: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("native_secret", &"<redacted>")
            .field("legacy_secret", &"<redacted>")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub policy: MatchPolicy,
    pub timeout: Duration,
}

/// Where the in-process directory is seeded from.
#[derive(Debug, Clone, Default)]
pub struct DirectoryConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingSecret { var: &'static str },
    InvalidValue { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingSecret { var } => {
                write!(f, "{var} must be set in production")
            }
            ConfigError::InvalidValue { var, value } => {
                write!(f, "{var} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingSecret { .. }
            | ConfigError::InvalidValue { .. } => None,
        }
    }
}
