//! Indicator parameter schema.
//!
//! Each indicator kind owns a fixed parameter shape:
//! - `IndicatorKind`: the closed set of supported indicators
//! - `IndicatorParams`: tagged parameter set, one variant per kind
//! - `ParamsRecord`: the flat `params` object used on the wire
//! - `ParamValue`: a single typed parameter assignment
//!
//! Because the variant carries the kind, a parameter that is not legal for
//! an indicator cannot be stored; it can only be rejected on the way in.

use crate::domain::error::BuilderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_RSI_PERIOD: u32 = 14;
pub const DEFAULT_CCI_PERIOD: u32 = 20;
pub const DEFAULT_MA_PERIOD: u32 = 50;
pub const DEFAULT_BBANDS_PERIOD: u32 = 20;
pub const DEFAULT_BBANDS_STDDEV: f64 = 2.0;
pub const DEFAULT_MACD_FAST: u32 = 12;
pub const DEFAULT_MACD_SLOW: u32 = 26;
pub const DEFAULT_MACD_SIGNAL: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Rsi,
    Cci,
    Macd,
    Sma,
    Ema,
    Bbands,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 6] = [
        IndicatorKind::Rsi,
        IndicatorKind::Cci,
        IndicatorKind::Macd,
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Bbands,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Cci => "cci",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
            IndicatorKind::Bbands => "bbands",
        }
    }

    /// Legal parameter keys for this indicator, in display order.
    pub fn param_keys(self) -> &'static [ParamKey] {
        match self {
            IndicatorKind::Rsi | IndicatorKind::Cci | IndicatorKind::Sma | IndicatorKind::Ema => {
                &[ParamKey::Period, ParamKey::Source]
            }
            IndicatorKind::Macd => &[
                ParamKey::Fast,
                ParamKey::Slow,
                ParamKey::Signal,
                ParamKey::Source,
            ],
            IndicatorKind::Bbands => &[ParamKey::Period, ParamKey::Stddev, ParamKey::Source],
        }
    }

    pub fn default_params(self) -> IndicatorParams {
        IndicatorParams::defaults(self)
    }

    /// Oscillator-style indicators are compared against an explicit threshold.
    pub fn requires_threshold(self) -> bool {
        matches!(
            self,
            IndicatorKind::Rsi | IndicatorKind::Cci | IndicatorKind::Bbands
        )
    }

    /// Moving averages are compared against price or another average.
    pub fn is_moving_average(self) -> bool {
        matches!(self, IndicatorKind::Sma | IndicatorKind::Ema)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = BuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BuilderError::InvalidParameterKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Close,
    Open,
    High,
    Low,
}

impl PriceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceSource::Close => "close",
            PriceSource::Open => "open",
            PriceSource::High => "high",
            PriceSource::Low => "low",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Period,
    Fast,
    Slow,
    Signal,
    Stddev,
    Source,
}

impl ParamKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::Period => "period",
            ParamKey::Fast => "fast",
            ParamKey::Slow => "slow",
            ParamKey::Signal => "signal",
            ParamKey::Stddev => "stddev",
            ParamKey::Source => "source",
        }
    }
}

/// One typed parameter assignment, as produced by a parameter editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Period(u32),
    Fast(u32),
    Slow(u32),
    Signal(u32),
    Stddev(f64),
    Source(PriceSource),
}

impl ParamValue {
    pub fn key(&self) -> ParamKey {
        match self {
            ParamValue::Period(_) => ParamKey::Period,
            ParamValue::Fast(_) => ParamKey::Fast,
            ParamValue::Slow(_) => ParamKey::Slow,
            ParamValue::Signal(_) => ParamKey::Signal,
            ParamValue::Stddev(_) => ParamKey::Stddev,
            ParamValue::Source(_) => ParamKey::Source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodParams {
    pub period: u32,
    pub source: PriceSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: u32,
    pub slow: u32,
    pub signal: u32,
    pub source: PriceSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    pub period: u32,
    pub stddev: f64,
    pub source: PriceSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorParams {
    Rsi(PeriodParams),
    Cci(PeriodParams),
    Sma(PeriodParams),
    Ema(PeriodParams),
    Macd(MacdParams),
    Bbands(BandParams),
}

/// The flat `params` object exchanged with the submission backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceSource>,
}

impl ParamsRecord {
    fn present_keys(&self) -> Vec<ParamKey> {
        let mut keys = Vec::new();
        if self.period.is_some() {
            keys.push(ParamKey::Period);
        }
        if self.fast.is_some() {
            keys.push(ParamKey::Fast);
        }
        if self.slow.is_some() {
            keys.push(ParamKey::Slow);
        }
        if self.signal.is_some() {
            keys.push(ParamKey::Signal);
        }
        if self.stddev.is_some() {
            keys.push(ParamKey::Stddev);
        }
        if self.source.is_some() {
            keys.push(ParamKey::Source);
        }
        keys
    }
}

impl IndicatorParams {
    pub fn defaults(kind: IndicatorKind) -> Self {
        let source = PriceSource::Close;
        match kind {
            IndicatorKind::Rsi => IndicatorParams::Rsi(PeriodParams {
                period: DEFAULT_RSI_PERIOD,
                source,
            }),
            IndicatorKind::Cci => IndicatorParams::Cci(PeriodParams {
                period: DEFAULT_CCI_PERIOD,
                source,
            }),
            IndicatorKind::Sma => IndicatorParams::Sma(PeriodParams {
                period: DEFAULT_MA_PERIOD,
                source,
            }),
            IndicatorKind::Ema => IndicatorParams::Ema(PeriodParams {
                period: DEFAULT_MA_PERIOD,
                source,
            }),
            IndicatorKind::Macd => IndicatorParams::Macd(MacdParams {
                fast: DEFAULT_MACD_FAST,
                slow: DEFAULT_MACD_SLOW,
                signal: DEFAULT_MACD_SIGNAL,
                source,
            }),
            IndicatorKind::Bbands => IndicatorParams::Bbands(BandParams {
                period: DEFAULT_BBANDS_PERIOD,
                stddev: DEFAULT_BBANDS_STDDEV,
                source,
            }),
        }
    }

    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorParams::Rsi(_) => IndicatorKind::Rsi,
            IndicatorParams::Cci(_) => IndicatorKind::Cci,
            IndicatorParams::Sma(_) => IndicatorKind::Sma,
            IndicatorParams::Ema(_) => IndicatorKind::Ema,
            IndicatorParams::Macd(_) => IndicatorKind::Macd,
            IndicatorParams::Bbands(_) => IndicatorKind::Bbands,
        }
    }

    pub fn source(&self) -> PriceSource {
        match self {
            IndicatorParams::Rsi(p)
            | IndicatorParams::Cci(p)
            | IndicatorParams::Sma(p)
            | IndicatorParams::Ema(p) => p.source,
            IndicatorParams::Macd(p) => p.source,
            IndicatorParams::Bbands(p) => p.source,
        }
    }

    /// Check every value against its type/range constraint.
    pub fn validate(&self) -> Result<(), BuilderError> {
        let kind = self.kind();
        match self {
            IndicatorParams::Rsi(p)
            | IndicatorParams::Cci(p)
            | IndicatorParams::Sma(p)
            | IndicatorParams::Ema(p) => check_positive_int(kind, ParamKey::Period, p.period),
            IndicatorParams::Macd(p) => {
                check_positive_int(kind, ParamKey::Fast, p.fast)?;
                check_positive_int(kind, ParamKey::Slow, p.slow)?;
                check_positive_int(kind, ParamKey::Signal, p.signal)
            }
            IndicatorParams::Bbands(p) => {
                check_positive_int(kind, ParamKey::Period, p.period)?;
                if !p.stddev.is_finite() || p.stddev <= 0.0 {
                    return Err(BuilderError::param(
                        kind,
                        ParamKey::Stddev.as_str(),
                        format!("must be a positive number, got {}", p.stddev),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Assign one parameter. Keys that are not legal for this indicator and
    /// out-of-range values are rejected and leave `self` untouched.
    pub fn set(&mut self, value: ParamValue) -> Result<(), BuilderError> {
        let kind = self.kind();
        let mut next = *self;
        let applied = match (&mut next, value) {
            (
                IndicatorParams::Rsi(p)
                | IndicatorParams::Cci(p)
                | IndicatorParams::Sma(p)
                | IndicatorParams::Ema(p),
                ParamValue::Period(v),
            ) => {
                p.period = v;
                true
            }
            (
                IndicatorParams::Rsi(p)
                | IndicatorParams::Cci(p)
                | IndicatorParams::Sma(p)
                | IndicatorParams::Ema(p),
                ParamValue::Source(s),
            ) => {
                p.source = s;
                true
            }
            (IndicatorParams::Macd(p), ParamValue::Fast(v)) => {
                p.fast = v;
                true
            }
            (IndicatorParams::Macd(p), ParamValue::Slow(v)) => {
                p.slow = v;
                true
            }
            (IndicatorParams::Macd(p), ParamValue::Signal(v)) => {
                p.signal = v;
                true
            }
            (IndicatorParams::Macd(p), ParamValue::Source(s)) => {
                p.source = s;
                true
            }
            (IndicatorParams::Bbands(p), ParamValue::Period(v)) => {
                p.period = v;
                true
            }
            (IndicatorParams::Bbands(p), ParamValue::Stddev(v)) => {
                p.stddev = v;
                true
            }
            (IndicatorParams::Bbands(p), ParamValue::Source(s)) => {
                p.source = s;
                true
            }
            _ => false,
        };
        if !applied {
            return Err(BuilderError::param(
                kind,
                value.key().as_str(),
                format!("not a parameter of {kind}"),
            ));
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Build a parameter set from a wire record: only keys legal for `kind`
    /// may be present, absent keys take their defaults.
    pub fn from_record(kind: IndicatorKind, record: &ParamsRecord) -> Result<Self, BuilderError> {
        let legal = kind.param_keys();
        if let Some(key) = record
            .present_keys()
            .into_iter()
            .find(|key| !legal.contains(key))
        {
            return Err(BuilderError::param(
                kind,
                key.as_str(),
                format!("not a parameter of {kind}"),
            ));
        }

        let mut params = IndicatorParams::defaults(kind);
        match &mut params {
            IndicatorParams::Rsi(p)
            | IndicatorParams::Cci(p)
            | IndicatorParams::Sma(p)
            | IndicatorParams::Ema(p) => {
                p.period = record.period.unwrap_or(p.period);
                p.source = record.source.unwrap_or(p.source);
            }
            IndicatorParams::Macd(p) => {
                p.fast = record.fast.unwrap_or(p.fast);
                p.slow = record.slow.unwrap_or(p.slow);
                p.signal = record.signal.unwrap_or(p.signal);
                p.source = record.source.unwrap_or(p.source);
            }
            IndicatorParams::Bbands(p) => {
                p.period = record.period.unwrap_or(p.period);
                p.stddev = record.stddev.unwrap_or(p.stddev);
                p.source = record.source.unwrap_or(p.source);
            }
        }
        params.validate()?;
        Ok(params)
    }

    /// Fully resolved wire record: every legal key present, nothing else.
    pub fn to_record(&self) -> ParamsRecord {
        match self {
            IndicatorParams::Rsi(p)
            | IndicatorParams::Cci(p)
            | IndicatorParams::Sma(p)
            | IndicatorParams::Ema(p) => ParamsRecord {
                period: Some(p.period),
                source: Some(p.source),
                ..ParamsRecord::default()
            },
            IndicatorParams::Macd(p) => ParamsRecord {
                fast: Some(p.fast),
                slow: Some(p.slow),
                signal: Some(p.signal),
                source: Some(p.source),
                ..ParamsRecord::default()
            },
            IndicatorParams::Bbands(p) => ParamsRecord {
                period: Some(p.period),
                stddev: Some(p.stddev),
                source: Some(p.source),
                ..ParamsRecord::default()
            },
        }
    }
}

fn check_positive_int(kind: IndicatorKind, key: ParamKey, value: u32) -> Result<(), BuilderError> {
    if value == 0 {
        return Err(BuilderError::param(
            kind,
            key.as_str(),
            "must be a positive integer",
        ));
    }
    Ok(())
}

impl fmt::Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind().as_str().to_uppercase();
        match self {
            IndicatorParams::Rsi(p)
            | IndicatorParams::Cci(p)
            | IndicatorParams::Sma(p)
            | IndicatorParams::Ema(p) => write!(f, "{}({}, {})", name, p.period, p.source),
            IndicatorParams::Macd(p) => write!(
                f,
                "{}({},{},{}, {})",
                name, p.fast, p.slow, p.signal, p.source
            ),
            IndicatorParams::Bbands(p) => {
                write!(f, "{}({},{}, {})", name, p.period, p.stddev, p.source)
            }
        }
    }
}
