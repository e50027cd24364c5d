//! Typed, validated configuration.
//!
//! Every key has a default so an absent config file is valid.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::analyzer::IndicatorParams;
use crate::domain::error::MarketlensError;
use crate::domain::request::{Interval, Period};
use crate::ports::config_port::{get_parsed, ConfigPort};

pub const MAX_WORKERS_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Yahoo,
    Csv,
}

impl DataSource {
    pub fn default_source() -> Self {
        if cfg!(feature = "yahoo") {
            DataSource::Yahoo
        } else {
            DataSource::Csv
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: DataSource,
    pub csv_dir: PathBuf,
    pub period: Period,
    pub interval: Interval,
    pub indicators: IndicatorParams,
    pub max_workers: usize,
    pub min_assets: usize,
    pub cache_ttl: Duration,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: DataSource::default_source(),
            csv_dir: PathBuf::from("data"),
            period: Period::OneYear,
            interval: Interval::D1,
            indicators: IndicatorParams::default(),
            max_workers: 4,
            min_assets: 2,
            cache_ttl: Duration::from_secs(3600),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MarketlensError> {
        let defaults = Settings::default();

        let source = match config.get_string("data", "source") {
            None => defaults.source,
            Some(s) => parse_source(&s)?,
        };
        let csv_dir = config
            .get_string("data", "csv_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.csv_dir);
        let period = get_parsed(config, "data", "period", defaults.period)
            .map_err(|e| invalid("data", "period", e))?;
        let interval = get_parsed(config, "data", "interval", defaults.interval)
            .map_err(|e| invalid("data", "interval", e))?;

        let d = &defaults.indicators;
        let indicators = IndicatorParams {
            ma_short: window(config, "ma_short", d.ma_short, 1)?,
            ma_long: window(config, "ma_long", d.ma_long, 1)?,
            rsi_window: window(config, "rsi_window", d.rsi_window, 1)?,
            volatility_window: window(config, "volatility_window", d.volatility_window, 2)?,
            annualize: config.get_bool("indicators", "annualize", d.annualize),
            bollinger_window: window(config, "bollinger_window", d.bollinger_window, 2)?,
            bollinger_std: config.get_double("indicators", "bollinger_std", d.bollinger_std),
            signal_tolerance: config.get_double(
                "indicators",
                "signal_tolerance",
                d.signal_tolerance,
            ),
        };
        validate_indicators(&indicators)?;

        let max_workers = config.get_int("portfolio", "max_workers", defaults.max_workers as i64);
        if !(1..=MAX_WORKERS_LIMIT as i64).contains(&max_workers) {
            return Err(invalid(
                "portfolio",
                "max_workers",
                format!("max_workers must be between 1 and {}", MAX_WORKERS_LIMIT),
            ));
        }
        let min_assets = config.get_int("portfolio", "min_assets", defaults.min_assets as i64);
        if min_assets < 1 {
            return Err(invalid("portfolio", "min_assets", "min_assets must be at least 1"));
        }

        let ttl = config.get_int("cache", "ttl_secs", defaults.cache_ttl.as_secs() as i64);
        if ttl < 0 {
            return Err(invalid("cache", "ttl_secs", "ttl_secs must be non-negative"));
        }

        let export_dir = config
            .get_string("export", "dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.export_dir);

        Ok(Self {
            source,
            csv_dir,
            period,
            interval,
            indicators,
            max_workers: max_workers as usize,
            min_assets: min_assets as usize,
            cache_ttl: Duration::from_secs(ttl as u64),
            export_dir,
        })
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MarketlensError {
    MarketlensError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_source(value: &str) -> Result<DataSource, MarketlensError> {
    match value.trim().to_lowercase().as_str() {
        "yahoo" if cfg!(feature = "yahoo") => Ok(DataSource::Yahoo),
        "yahoo" => Err(invalid(
            "data",
            "source",
            "built without the yahoo feature",
        )),
        "csv" => Ok(DataSource::Csv),
        other => Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected yahoo or csv", other),
        )),
    }
}

fn window(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
    minimum: i64,
) -> Result<usize, MarketlensError> {
    let value = config.get_int("indicators", key, default as i64);
    if value < minimum {
        return Err(invalid(
            "indicators",
            key,
            format!("{} must be at least {}", key, minimum),
        ));
    }
    Ok(value as usize)
}

fn validate_indicators(p: &IndicatorParams) -> Result<(), MarketlensError> {
    if p.ma_short >= p.ma_long {
        return Err(invalid(
            "indicators",
            "ma_short",
            "ma_short must be smaller than ma_long",
        ));
    }
    if !(p.bollinger_std > 0.0) {
        return Err(invalid(
            "indicators",
            "bollinger_std",
            "bollinger_std must be positive",
        ));
    }
    if !(p.signal_tolerance >= 0.0) {
        return Err(invalid(
            "indicators",
            "signal_tolerance",
            "signal_tolerance must be non-negative",
        ));
    }
    Ok(())
}
