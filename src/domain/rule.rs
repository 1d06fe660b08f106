//! Entry rule model.
//!
//! A `Rule` is one indicator condition: indicator parameters, a comparison
//! operator, optional thresholds and an optional moving-average reference.
//! Rules are changed through `RuleField` assignments so that dependent fields
//! are re-derived in one place.

use crate::domain::error::BuilderError;
use crate::domain::indicator::{IndicatorKind, IndicatorParams, ParamValue, ParamsRecord};
use crate::domain::timeframe::Timeframe;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COMPARE_PERIOD: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "crossesAbove")]
    CrossesAbove,
    #[serde(rename = "crossesBelow")]
    CrossesBelow,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::CrossesAbove,
        Operator::CrossesBelow,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::CrossesAbove => "crossesAbove",
            Operator::CrossesBelow => "crossesBelow",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
        }
    }

    pub fn is_cross(self) -> bool {
        matches!(self, Operator::CrossesAbove | Operator::CrossesBelow)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an indicator is compared against besides the numeric threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareTo {
    Price,
    Sma,
    Ema,
    #[default]
    None,
}

impl CompareTo {
    pub fn needs_period(self) -> bool {
        matches!(self, CompareTo::Sma | CompareTo::Ema)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleRecord", into = "RuleRecord")]
pub struct Rule {
    pub timeframe: Timeframe,
    pub params: IndicatorParams,
    pub operator: Operator,
    pub value: Option<f64>,
    pub value2: Option<f64>,
    pub compare_to: CompareTo,
    pub compare_period: Option<u32>,
}

/// A single field assignment on a `Rule`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleField {
    Indicator(IndicatorKind),
    Timeframe(Timeframe),
    Param(ParamValue),
    Operator(Operator),
    Value(Option<f64>),
    Value2(Option<f64>),
    CompareTo(CompareTo),
    ComparePeriod(Option<u32>),
}

impl Rule {
    /// Rule with schema defaults and the usual starting condition for `kind`.
    pub fn create_default(kind: IndicatorKind) -> Self {
        let (operator, value, compare_to) = match kind {
            IndicatorKind::Rsi => (Operator::CrossesBelow, Some(30.0), CompareTo::None),
            IndicatorKind::Cci => (Operator::CrossesBelow, Some(-100.0), CompareTo::None),
            IndicatorKind::Bbands => (Operator::CrossesBelow, Some(0.0), CompareTo::None),
            IndicatorKind::Sma | IndicatorKind::Ema => {
                (Operator::CrossesAbove, None, CompareTo::Price)
            }
            IndicatorKind::Macd => (Operator::CrossesAbove, None, CompareTo::None),
        };
        Rule {
            timeframe: Timeframe::default(),
            params: kind.default_params(),
            operator,
            value,
            value2: None,
            compare_to,
            compare_period: None,
        }
    }

    pub fn indicator(&self) -> IndicatorKind {
        self.params.kind()
    }

    /// Return a copy with `field` applied.
    ///
    /// Changing the indicator resets `params` to the new indicator's
    /// defaults; moving `compare_to` off sma/ema clears `compare_period`,
    /// moving it onto sma/ema fills the default period when none is set.
    pub fn update_field(&self, field: RuleField) -> Result<Rule, BuilderError> {
        let mut next = self.clone();
        match field {
            RuleField::Indicator(kind) => {
                if kind != self.indicator() {
                    next.params = kind.default_params();
                }
            }
            RuleField::Timeframe(tf) => next.timeframe = tf,
            RuleField::Param(value) => next.params.set(value)?,
            RuleField::Operator(op) => next.operator = op,
            RuleField::Value(value) => {
                check_finite("value", value)?;
                next.value = value;
            }
            RuleField::Value2(value) => {
                check_finite("value2", value)?;
                next.value2 = value;
            }
            RuleField::CompareTo(target) => {
                next.compare_to = target;
                if !target.needs_period() {
                    next.compare_period = None;
                } else if next.compare_period.is_none() {
                    next.compare_period = Some(DEFAULT_COMPARE_PERIOD);
                }
            }
            RuleField::ComparePeriod(period) => {
                match period {
                    Some(0) => {
                        return Err(BuilderError::field(
                            "comparePeriod",
                            "must be a positive integer",
                        ));
                    }
                    Some(_) if !next.compare_to.needs_period() => {
                        return Err(BuilderError::field(
                            "comparePeriod",
                            "only applies when comparing to sma or ema",
                        ));
                    }
                    _ => {}
                }
                next.compare_period = period;
            }
        }
        Ok(next)
    }

    /// A rule is well-formed when its parameters pass the schema and the
    /// operator/threshold combination is defined.
    pub fn validate(&self) -> Result<(), BuilderError> {
        self.params.validate()?;
        check_finite("value", self.value)?;
        check_finite("value2", self.value2)?;

        let kind = self.indicator();
        if kind.requires_threshold() && self.value.is_none() {
            return Err(BuilderError::field(
                "value",
                format!("{kind} requires a threshold"),
            ));
        }
        if self.operator.is_cross() && self.value2.is_some() {
            return Err(BuilderError::field(
                "value2",
                format!("not allowed with {}", self.operator),
            ));
        }
        if !self.operator.is_cross() && self.value.is_none() {
            return Err(BuilderError::field(
                "value",
                format!("required with {}", self.operator),
            ));
        }

        match (self.compare_to.needs_period(), self.compare_period) {
            (true, None) | (true, Some(0)) => Err(BuilderError::field(
                "comparePeriod",
                "a positive period is required when comparing to sma or ema",
            )),
            (false, Some(_)) => Err(BuilderError::field(
                "comparePeriod",
                "only applies when comparing to sma or ema",
            )),
            _ => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn check_finite(field: &str, value: Option<f64>) -> Result<(), BuilderError> {
    match value {
        Some(v) if !v.is_finite() => Err(BuilderError::field(field, "must be a finite number")),
        _ => Ok(()),
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.params, self.timeframe, self.operator)?;
        if let Some(v) = self.value {
            write!(f, " {v}")?;
        }
        if let Some(v) = self.value2 {
            write!(f, "/{v}")?;
        }
        match (self.compare_to, self.compare_period) {
            (CompareTo::Price, _) => write!(f, " vs price"),
            (CompareTo::Sma, Some(p)) => write!(f, " vs SMA({p})"),
            (CompareTo::Ema, Some(p)) => write!(f, " vs EMA({p})"),
            _ => Ok(()),
        }
    }
}

/// Wire shape of a rule: indicator name plus a flat params object.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleRecord {
    indicator: String,
    #[serde(default)]
    timeframe: Timeframe,
    #[serde(default)]
    params: Option<ParamsRecord>,
    operator: Operator,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    value2: Option<f64>,
    #[serde(rename = "compareTo", default)]
    compare_to: CompareTo,
    #[serde(rename = "comparePeriod", default)]
    compare_period: Option<u32>,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = BuilderError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let kind: IndicatorKind = record.indicator.parse()?;
        let params = IndicatorParams::from_record(kind, &record.params.unwrap_or_default())?;
        Ok(Rule {
            timeframe: record.timeframe,
            params,
            operator: record.operator,
            value: record.value,
            value2: record.value2,
            compare_to: record.compare_to,
            compare_period: record.compare_period,
        })
    }
}

impl From<Rule> for RuleRecord {
    fn from(rule: Rule) -> Self {
        RuleRecord {
            indicator: rule.indicator().as_str().to_string(),
            timeframe: rule.timeframe,
            params: Some(rule.params.to_record()),
            operator: rule.operator,
            value: rule.value,
            value2: rule.value2,
            compare_to: rule.compare_to,
            compare_period: rule.compare_period,
        }
    }
}
