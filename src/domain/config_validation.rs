//! Settings loaded from configuration.
//!
//! Every key is optional; absent keys fall back to the built-in defaults.
//! Present keys are checked before any builder is created.

use crate::domain::asset::{AssetDefaults, normalize_symbol};
use crate::domain::error::BuilderError;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSettings {
    pub latency: Duration,
    pub reject_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuilderSettings {
    pub defaults: AssetDefaults,
    pub submission: SubmissionSettings,
    pub poll_interval: Duration,
    /// Fixed quote table, `[quotes] prices = AAPL:189.5, NVDA:121`.
    pub quote_prices: Vec<(String, f64)>,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        BuilderSettings {
            defaults: AssetDefaults::default(),
            submission: SubmissionSettings {
                latency: Duration::ZERO,
                reject_message: None,
            },
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS as u64),
            quote_prices: Vec::new(),
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BuilderError {
    BuilderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_settings(config: &dyn ConfigPort) -> Result<BuilderSettings, BuilderError> {
    let defaults = validate_asset_defaults(config)?;
    let submission = validate_submission(config)?;
    let poll_interval = validate_poll_interval(config)?;
    let quote_prices = validate_quote_prices(config)?;
    Ok(BuilderSettings {
        defaults,
        submission,
        poll_interval,
        quote_prices,
    })
}

fn validate_asset_defaults(config: &dyn ConfigPort) -> Result<AssetDefaults, BuilderError> {
    let fallback = AssetDefaults::default();

    let investment = config.get_double("builder", "default_investment", fallback.investment);
    if !investment.is_finite() || investment <= 0.0 {
        return Err(invalid(
            "builder",
            "default_investment",
            "default_investment must be positive",
        ));
    }

    let max_loss = config.get_double("builder", "default_max_loss", fallback.max_loss);
    if !max_loss.is_finite() || max_loss <= 0.0 {
        return Err(invalid(
            "builder",
            "default_max_loss",
            "default_max_loss must be positive",
        ));
    }
    if max_loss > investment {
        return Err(invalid(
            "builder",
            "default_max_loss",
            format!("default_max_loss {max_loss} exceeds default_investment {investment}"),
        ));
    }

    let timeframe = match config.get_string("builder", "default_timeframe") {
        Some(s) => s.trim().parse::<Timeframe>().map_err(|_| {
            invalid(
                "builder",
                "default_timeframe",
                format!("unknown timeframe {s:?}"),
            )
        })?,
        None => fallback.timeframe,
    };

    Ok(AssetDefaults {
        investment,
        max_loss,
        timeframe,
    })
}

fn validate_submission(config: &dyn ConfigPort) -> Result<SubmissionSettings, BuilderError> {
    let latency_ms = config.get_int("submission", "latency_ms", 0);
    if latency_ms < 0 {
        return Err(invalid(
            "submission",
            "latency_ms",
            "latency_ms must be non-negative",
        ));
    }
    let reject_message = config
        .get_string("submission", "reject_message")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(SubmissionSettings {
        latency: Duration::from_millis(latency_ms as u64),
        reject_message,
    })
}

fn validate_poll_interval(config: &dyn ConfigPort) -> Result<Duration, BuilderError> {
    let secs = config.get_int("quotes", "poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS);
    if secs <= 0 {
        return Err(invalid(
            "quotes",
            "poll_interval_secs",
            "poll_interval_secs must be positive",
        ));
    }
    Ok(Duration::from_secs(secs as u64))
}

fn validate_quote_prices(config: &dyn ConfigPort) -> Result<Vec<(String, f64)>, BuilderError> {
    let Some(raw) = config.get_string("quotes", "prices") else {
        return Ok(Vec::new());
    };
    let mut prices = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let bad = || invalid("quotes", "prices", format!("expected SYMBOL:PRICE, got {entry:?}"));
        let (symbol, price) = entry.split_once(':').ok_or_else(bad)?;
        let symbol = normalize_symbol(symbol).map_err(|_| bad())?;
        let price: f64 = price.trim().parse().map_err(|_| bad())?;
        if !price.is_finite() || price <= 0.0 {
            return Err(invalid(
                "quotes",
                "prices",
                format!("price for {symbol} must be positive"),
            ));
        }
        prices.push((symbol, price));
    }
    Ok(prices)
}
