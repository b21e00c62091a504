use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::workflows::pulse::aggregation::{AggregationConfig, ZeroThemePolicy};
use crate::workflows::pulse::eligibility::EligibilityConfig;
use crate::workflows::pulse::statistics::IndustryBenchmark;

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
        let show_targets = env::var("APP_LOG_TARGETS")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                show_targets,
            },
            scoring: ScoringConfig::from_env()?,
        })
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
    /// Include the emitting module (`pulse_score::workflows::pulse::service`) in log lines.
    pub show_targets: bool,
}

/// Scoring policy, certification thresholds, and the industry benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub aggregation: AggregationConfig,
    pub eligibility: EligibilityConfig,
    pub benchmark: IndustryBenchmark,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationConfig::default(),
            eligibility: EligibilityConfig::default(),
            benchmark: IndustryBenchmark::overall(DEFAULT_BENCHMARK_SCORE),
        }
    }
}

pub const DEFAULT_BENCHMARK_SCORE: f64 = 78.0;

impl ScoringConfig {
    /// Reads `PULSE_*` overrides on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("PULSE_ZERO_THEME_POLICY") {
            config.aggregation.zero_theme_policy = ZeroThemePolicy::parse(&raw)
                .ok_or(ConfigError::InvalidZeroThemePolicy { value: raw })?;
        }

        if let Some(rate) = read_var::<u8>("PULSE_MIN_PARTICIPATION")? {
            config.eligibility.min_participation_rate = percentage("PULSE_MIN_PARTICIPATION", rate)?;
        }
        if let Some(score) = read_var::<u8>("PULSE_MIN_SCORE")? {
            config.eligibility.min_average_score = percentage("PULSE_MIN_SCORE", score)?;
        }
        if let Some(months) = read_var::<u32>("PULSE_COOLDOWN_MONTHS")? {
            config.eligibility.cooldown_months = months;
        }
        if let Some(months) = read_var::<u32>("PULSE_VALIDITY_MONTHS")? {
            if months == 0 {
                return Err(ConfigError::InvalidNumber {
                    key: "PULSE_VALIDITY_MONTHS",
                    value: months.to_string(),
                });
            }
            config.eligibility.validity_months = months;
        }
        if let Some(benchmark) = read_var::<f64>("PULSE_BENCHMARK_SCORE")? {
            config.benchmark.overall = benchmark;
        }

        Ok(config)
    }
}

fn read_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn percentage(key: &'static str, value: u8) -> Result<u8, ConfigError> {
    if value > 100 {
        return Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidZeroThemePolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has invalid value '{value}'")
            }
            ConfigError::InvalidZeroThemePolicy { value } => write!(
                f,
                "PULSE_ZERO_THEME_POLICY must be include_as_zero or exclude_empty, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidZeroThemePolicy { .. } => None,
        }
    }
}

/// Serialises tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_TARGETS",
            "PULSE_ZERO_THEME_POLICY",
            "PULSE_MIN_PARTICIPATION",
            "PULSE_MIN_SCORE",
            "PULSE_COOLDOWN_MONTHS",
            "PULSE_VALIDITY_MONTHS",
            "PULSE_BENCHMARK_SCORE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.show_targets);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(
            config.scoring.aggregation.zero_theme_policy,
            ZeroThemePolicy::IncludeAsZero
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn scoring_overrides_are_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PULSE_ZERO_THEME_POLICY", "exclude-empty");
        env::set_var("PULSE_MIN_PARTICIPATION", "65");
        env::set_var("PULSE_COOLDOWN_MONTHS", "6");
        env::set_var("PULSE_BENCHMARK_SCORE", "74.5");

        let scoring = ScoringConfig::from_env().expect("scoring config loads");
        assert_eq!(
            scoring.aggregation.zero_theme_policy,
            ZeroThemePolicy::ExcludeEmpty
        );
        assert_eq!(scoring.eligibility.min_participation_rate, 65);
        assert_eq!(scoring.eligibility.min_average_score, 80);
        assert_eq!(scoring.eligibility.cooldown_months, 6);
        assert_eq!(scoring.benchmark.overall, 74.5);
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PULSE_MIN_SCORE", "140");
        assert!(matches!(
            ScoringConfig::from_env(),
            Err(ConfigError::InvalidNumber {
                key: "PULSE_MIN_SCORE",
                ..
            })
        ));

        env::set_var("PULSE_MIN_SCORE", "eighty");
        assert!(ScoringConfig::from_env().is_err());

        reset_env();
        env::set_var("PULSE_ZERO_THEME_POLICY", "sometimes");
        assert!(matches!(
            ScoringConfig::from_env(),
            Err(ConfigError::InvalidZeroThemePolicy { .. })
        ));
        reset_env();
    }
}
