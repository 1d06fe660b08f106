//! Exit conditions: profit target, stop loss or an indicator rule.

use crate::domain::error::BuilderError;
use crate::domain::indicator::IndicatorKind;
use crate::domain::rule::{Rule, RuleField};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TAKE_PROFIT: f64 = 100.0;
pub const DEFAULT_STOP_LOSS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    TakeProfit,
    StopLoss,
    Indicator,
}

impl ExitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitKind::TakeProfit => "take_profit",
            ExitKind::StopLoss => "stop_loss",
            ExitKind::Indicator => "indicator",
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitCondition {
    #[serde(rename = "type")]
    pub kind: ExitKind,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_rule: Option<Rule>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitField {
    Kind(ExitKind),
    Value(Option<f64>),
    /// Applied to the nested indicator rule.
    Rule(RuleField),
}

impl ExitCondition {
    pub fn take_profit(value: f64) -> Self {
        ExitCondition {
            kind: ExitKind::TakeProfit,
            value: Some(value),
            indicator_rule: None,
        }
    }

    pub fn stop_loss(value: f64) -> Self {
        ExitCondition {
            kind: ExitKind::StopLoss,
            value: Some(value),
            indicator_rule: None,
        }
    }

    pub fn indicator(rule: Rule) -> Self {
        ExitCondition {
            kind: ExitKind::Indicator,
            value: None,
            indicator_rule: Some(rule),
        }
    }

    /// Default exits for a new asset: take-profit then stop-loss.
    pub fn defaults() -> Vec<ExitCondition> {
        vec![
            ExitCondition::take_profit(DEFAULT_TAKE_PROFIT),
            ExitCondition::stop_loss(DEFAULT_STOP_LOSS),
        ]
    }

    pub fn update_field(&self, field: ExitField) -> Result<ExitCondition, BuilderError> {
        let mut next = self.clone();
        match field {
            ExitField::Kind(kind) => {
                next.kind = kind;
                if kind == ExitKind::Indicator {
                    if next.indicator_rule.is_none() {
                        next.indicator_rule = Some(Rule::create_default(IndicatorKind::Rsi));
                    }
                } else {
                    next.indicator_rule = None;
                }
            }
            ExitField::Value(value) => {
                if matches!(value, Some(v) if !v.is_finite()) {
                    return Err(BuilderError::field("value", "must be a finite number"));
                }
                next.value = value;
            }
            ExitField::Rule(rule_field) => {
                let rule = next.indicator_rule.as_ref().ok_or_else(|| {
                    BuilderError::field(
                        "indicator_rule",
                        format!("{} exits carry no indicator rule", next.kind),
                    )
                })?;
                next.indicator_rule = Some(rule.update_field(rule_field)?);
            }
        }
        Ok(next)
    }

    pub fn validate(&self) -> Result<(), BuilderError> {
        match self.kind {
            ExitKind::TakeProfit | ExitKind::StopLoss => match self.value {
                Some(v) if v.is_finite() && v > 0.0 => Ok(()),
                Some(v) => Err(BuilderError::field(
                    "value",
                    format!("{} must be positive, got {v}", self.kind),
                )),
                None => Err(BuilderError::field(
                    "value",
                    format!("{} requires a value", self.kind),
                )),
            },
            ExitKind::Indicator => match &self.indicator_rule {
                Some(rule) => rule.validate(),
                None => Err(BuilderError::field(
                    "indicator_rule",
                    "indicator exits require a rule",
                )),
            },
        }
    }
}

impl fmt::Display for ExitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, self.value, &self.indicator_rule) {
            (ExitKind::Indicator, _, Some(rule)) => write!(f, "indicator: {rule}"),
            (kind, Some(v), _) => write!(f, "{kind} {v}"),
            (kind, None, _) => write!(f, "{kind}"),
        }
    }
}
