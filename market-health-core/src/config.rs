//! Scoring and rating configuration.
//!
//! Both structs deserialize from TOML with per-field defaults, so a config
//! file only needs the keys it changes:
//!
//! ```toml
//! sectors = ["XLK", "XLF"]
//! period = "6mo"
//!
//! [rating]
//! scheme = "quantile"
//! quantiles = [10, 30, 70, 90]
//! hysteresis = 3
//! ```

use crate::domain::SECTORS_DEFAULT;
use crate::rating::RatingScheme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown rating scheme '{0}' (expected fixed, quantile or hybrid)")]
    UnknownScheme(String),

    #[error("invalid quantiles '{0}': expected 4 ascending percentiles in [0, 100]")]
    InvalidQuantiles(String),

    #[error("sector list is empty")]
    EmptySectors,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Trim every symbol and drop the blank ones.
pub fn normalize_sectors(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_sectors() -> Vec<String> {
    SECTORS_DEFAULT.iter().map(|s| s.to_string()).collect()
}

fn default_period() -> String {
    "1y".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

fn default_ttl() -> u64 {
    300
}

fn default_delay_ms() -> u64 {
    250
}

fn default_quantiles() -> [f64; 4] {
    [10.0, 30.0, 70.0, 90.0]
}

fn default_guard() -> u32 {
    5
}

/// Inputs to a scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,

    #[serde(default = "default_period")]
    pub period: String,

    #[serde(default = "default_interval")]
    pub interval: String,

    /// Cache freshness in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u64,

    /// Pause between fetch attempts and between symbols.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
            period: default_period(),
            interval: default_interval(),
            ttl: default_ttl(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl ScoreConfig {
    /// Pause between fetch attempts and between symbols.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Reject an empty sector list, blank symbols, period or interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sectors.is_empty() {
            return Err(ConfigError::EmptySectors);
        }
        if self.sectors.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptyField("sector symbol"));
        }
        if self.period.trim().is_empty() {
            return Err(ConfigError::EmptyField("period"));
        }
        if self.interval.trim().is_empty() {
            return Err(ConfigError::EmptyField("interval"));
        }
        Ok(())
    }
}

/// How aggregate percentages become rating bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    #[serde(default)]
    pub scheme: RatingScheme,

    /// Percentiles used by the quantile and hybrid schemes.
    #[serde(default = "default_quantiles")]
    pub quantiles: [f64; 4],

    /// Maximum distance of a hybrid cut-point from its fixed counterpart.
    #[serde(default = "default_guard")]
    pub guard: u32,

    /// Points required to leave the committed band. 0 disables hysteresis.
    #[serde(default)]
    pub hysteresis: u32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            scheme: RatingScheme::default(),
            quantiles: default_quantiles(),
            guard: default_guard(),
            hysteresis: 0,
        }
    }
}

impl RatingConfig {
    /// Quantiles must be four ascending values in `[0, 100]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quantiles(&self.quantiles).map_err(|_| {
            let text: Vec<String> = self.quantiles.iter().map(|q| q.to_string()).collect();
            ConfigError::InvalidQuantiles(text.join(","))
        })
    }
}

fn check_quantiles(qs: &[f64; 4]) -> Result<(), ()> {
    let in_range = qs.iter().all(|q| q.is_finite() && (0.0..=100.0).contains(q));
    let ascending = qs.windows(2).all(|w| w[0] <= w[1]);
    if in_range && ascending {
        Ok(())
    } else {
        Err(())
    }
}

/// Parse `"10,30,70,90"` into four ascending percentiles.
pub fn parse_quantiles(text: &str) -> Result<[f64; 4], ConfigError> {
    let invalid = || ConfigError::InvalidQuantiles(text.to_string());
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| invalid())?;
    let qs: [f64; 4] = values.try_into().map_err(|_| invalid())?;
    check_quantiles(&qs).map_err(|_| invalid())?;
    Ok(qs)
}

/// Everything a config file may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub score: ScoreConfig,

    #[serde(default)]
    pub rating: RatingConfig,
}

impl AppConfig {
    /// Parse a TOML document. Sector symbols come back trimmed, blanks dropped.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.score.sectors = normalize_sectors(&config.score.sectors);
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.score.validate()?;
        self.rating.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.score.sectors.len(), 10);
        assert_eq!(cfg.score.period, "1y");
        assert_eq!(cfg.score.interval, "1d");
        assert_eq!(cfg.score.ttl, 300);
        assert_eq!(cfg.score.delay(), Duration::from_millis(250));
        assert_eq!(cfg.rating.scheme, RatingScheme::Hybrid);
        assert_eq!(cfg.rating.quantiles, [10.0, 30.0, 70.0, 90.0]);
        assert_eq!(cfg.rating.guard, 5);
        assert_eq!(cfg.rating.hysteresis, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = r#"
            sectors = ["XLK", "XLF"]
            ttl = 60

            [rating]
            scheme = "quantile"
            hysteresis = 3
        "#;
        let cfg = AppConfig::from_toml_str(text, Path::new("mh.toml")).unwrap();
        assert_eq!(cfg.score.sectors, vec!["XLK", "XLF"]);
        assert_eq!(cfg.score.ttl, 60);
        assert_eq!(cfg.score.period, "1y");
        assert_eq!(cfg.rating.scheme, RatingScheme::Quantile);
        assert_eq!(cfg.rating.hysteresis, 3);
        assert_eq!(cfg.rating.guard, 5);
    }

    #[test]
    fn toml_sectors_are_trimmed() {
        let cfg =
            AppConfig::from_toml_str("sectors = [\"\", \" XLK \", \"XLF\"]", Path::new("x.toml"))
                .unwrap();
        assert_eq!(cfg.score.sectors, vec!["XLK", "XLF"]);
        assert!(cfg.validate().is_ok());

        let cfg = AppConfig::from_toml_str("sectors = [\" \"]", Path::new("x.toml")).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptySectors)));
    }

    #[test]
    fn unknown_scheme_in_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[rating]\nscheme = \"median\"", Path::new("x.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.score.sectors = vec![];
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptySectors)));

        let mut cfg = AppConfig::default();
        cfg.score.sectors = vec!["".into(), "XLK".into()];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyField("sector symbol"))
        ));

        let mut cfg = AppConfig::default();
        cfg.score.period = " ".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyField("period"))));

        let mut cfg = AppConfig::default();
        cfg.rating.quantiles = [90.0, 70.0, 30.0, 10.0];
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidQuantiles(_))));
    }

    #[test]
    fn quantile_parsing() {
        assert_eq!(parse_quantiles("10,30,70,90").unwrap(), [10.0, 30.0, 70.0, 90.0]);
        assert_eq!(parse_quantiles(" 5, 25 ,75,95").unwrap(), [5.0, 25.0, 75.0, 95.0]);
        assert!(parse_quantiles("10,30,70").is_err());
        assert!(parse_quantiles("10,30,70,x").is_err());
        assert!(parse_quantiles("10,30,70,101").is_err());
        assert!(parse_quantiles("30,10,70,90").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/market-health.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
