//! Per-symbol strategy: sizing, risk, rules, exits and overlays.

use crate::domain::error::BuilderError;
use crate::domain::exit::{ExitCondition, ExitField, ExitKind};
use crate::domain::indicator::IndicatorKind;
use crate::domain::overlay::{EarningsPlay, NewsCategory, NewsPlay};
use crate::domain::rule::{Rule, RuleField};
use crate::domain::timeframe::Timeframe;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DEFAULT_INVESTMENT: f64 = 1000.0;
pub const DEFAULT_MAX_LOSS: f64 = 100.0;
pub const DEFAULT_ASSET_TIMEFRAME: Timeframe = Timeframe::H1;

const ENTRY_RULES: &str = "entry rule";
const EXIT_CONDITIONS: &str = "exit condition";

/// Starting values for newly added assets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetDefaults {
    pub investment: f64,
    pub max_loss: f64,
    pub timeframe: Timeframe,
}

impl Default for AssetDefaults {
    fn default() -> Self {
        AssetDefaults {
            investment: DEFAULT_INVESTMENT,
            max_loss: DEFAULT_MAX_LOSS,
            timeframe: DEFAULT_ASSET_TIMEFRAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetStrategy {
    pub symbol: String,
    pub investment: f64,
    pub max_loss: f64,
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub since_ipo: bool,
    pub entry_rules: Vec<Rule>,
    pub exit_conditions: Vec<ExitCondition>,
    #[serde(rename = "earningsPlay", default)]
    pub earnings_play: EarningsPlay,
    #[serde(rename = "newsPlay", default)]
    pub news_play: NewsPlay,
}

fn default_timeframe() -> Timeframe {
    DEFAULT_ASSET_TIMEFRAME
}

/// Date inputs arrive as `YYYY-MM-DD`, `""` or null; blank means unset.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                serde::de::Error::custom(format!("invalid date {s:?}, expected YYYY-MM-DD"))
            }),
    }
}

/// A single field assignment on an `AssetStrategy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssetField {
    Investment(f64),
    MaxLoss(f64),
    Timeframe(Timeframe),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
    SinceIpo(bool),
    EarningsEnabled(bool),
    EarningsDaysBefore(u32),
    EarningsDaysAfter(u32),
    NewsEnabled(bool),
    NewsCategory(NewsCategory),
}

/// Trim and uppercase a ticker. Empty or whitespace-containing input is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, BuilderError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(BuilderError::InvalidSymbol(raw.to_string()));
    }
    Ok(trimmed.to_uppercase())
}

impl AssetStrategy {
    /// New asset with one default rsi rule and the default take-profit/stop-loss exits.
    pub fn new(symbol: &str, defaults: &AssetDefaults) -> Result<Self, BuilderError> {
        Ok(AssetStrategy {
            symbol: normalize_symbol(symbol)?,
            investment: defaults.investment,
            max_loss: defaults.max_loss,
            timeframe: defaults.timeframe,
            start_date: None,
            end_date: None,
            since_ipo: false,
            entry_rules: vec![Rule::create_default(IndicatorKind::Rsi)],
            exit_conditions: ExitCondition::defaults(),
            earnings_play: EarningsPlay::default(),
            news_play: NewsPlay::default(),
        })
    }

    /// Apply `field`. Investment acts as the ceiling for max loss: lowering it
    /// below the current max loss pulls max loss down with it, and a max loss
    /// above a positive investment is clamped to it.
    pub fn update_field(&mut self, field: AssetField) -> Result<(), BuilderError> {
        match field {
            AssetField::Investment(value) => {
                check_finite("investment", value)?;
                self.investment = value;
                if value > 0.0 && self.max_loss > value {
                    tracing::debug!(
                        symbol = %self.symbol,
                        from = self.max_loss,
                        to = value,
                        "clamping max_loss to investment"
                    );
                    self.max_loss = value;
                }
            }
            AssetField::MaxLoss(value) => {
                check_finite("max_loss", value)?;
                self.max_loss = if self.investment > 0.0 && value > self.investment {
                    self.investment
                } else {
                    value
                };
            }
            AssetField::Timeframe(tf) => self.timeframe = tf,
            AssetField::StartDate(date) => self.start_date = date,
            AssetField::EndDate(date) => self.end_date = date,
            AssetField::SinceIpo(flag) => self.since_ipo = flag,
            AssetField::EarningsEnabled(flag) => self.earnings_play.enabled = flag,
            AssetField::EarningsDaysBefore(days) => self.earnings_play.days_before = days,
            AssetField::EarningsDaysAfter(days) => self.earnings_play.days_after = days,
            AssetField::NewsEnabled(flag) => self.news_play.enabled = flag,
            AssetField::NewsCategory(category) => self.news_play.category = category,
        }
        Ok(())
    }

    /// Start date as used downstream: ignored when trading since IPO.
    pub fn effective_start_date(&self) -> Option<NaiveDate> {
        if self.since_ipo { None } else { self.start_date }
    }

    pub fn add_rule(&mut self, rule: Rule) -> usize {
        self.entry_rules.push(rule);
        self.entry_rules.len() - 1
    }

    pub fn remove_rule(&mut self, index: usize) -> Result<Rule, BuilderError> {
        remove_keeping_one(&self.symbol, ENTRY_RULES, &mut self.entry_rules, index)
    }

    pub fn update_rule(&mut self, index: usize, field: RuleField) -> Result<(), BuilderError> {
        let len = self.entry_rules.len();
        let rule = self
            .entry_rules
            .get_mut(index)
            .ok_or_else(|| out_of_range(&self.symbol, ENTRY_RULES, index, len))?;
        *rule = rule.update_field(field)?;
        Ok(())
    }

    pub fn add_exit_condition(&mut self, exit: ExitCondition) -> usize {
        self.exit_conditions.push(exit);
        self.exit_conditions.len() - 1
    }

    pub fn remove_exit_condition(&mut self, index: usize) -> Result<ExitCondition, BuilderError> {
        remove_keeping_one(
            &self.symbol,
            EXIT_CONDITIONS,
            &mut self.exit_conditions,
            index,
        )
    }

    pub fn update_exit_condition(
        &mut self,
        index: usize,
        field: ExitField,
    ) -> Result<(), BuilderError> {
        let len = self.exit_conditions.len();
        let exit = self
            .exit_conditions
            .get_mut(index)
            .ok_or_else(|| out_of_range(&self.symbol, EXIT_CONDITIONS, index, len))?;
        *exit = exit.update_field(field)?;
        Ok(())
    }

    /// Positive investment and max loss, max loss within investment.
    pub fn check_sizing(&self) -> Result<(), BuilderError> {
        if !(self.investment.is_finite() && self.investment > 0.0) {
            return Err(BuilderError::field(
                "investment",
                format!("must be positive, got {}", self.investment),
            ));
        }
        if !(self.max_loss.is_finite() && self.max_loss > 0.0) {
            return Err(BuilderError::field(
                "max_loss",
                format!("must be positive, got {}", self.max_loss),
            ));
        }
        if self.max_loss > self.investment {
            return Err(BuilderError::field(
                "max_loss",
                format!(
                    "{} exceeds investment {}",
                    self.max_loss, self.investment
                ),
            ));
        }
        Ok(())
    }

    /// Non-empty entry rules, each well-formed.
    pub fn check_entry_rules(&self) -> Result<(), BuilderError> {
        if self.entry_rules.is_empty() {
            return Err(BuilderError::MinimumCardinalityViolated {
                symbol: self.symbol.clone(),
                collection: ENTRY_RULES.to_string(),
            });
        }
        for (i, rule) in self.entry_rules.iter().enumerate() {
            rule.validate()
                .map_err(|e| BuilderError::field(&format!("entry_rules[{i}]"), e.to_string()))?;
        }
        Ok(())
    }

    /// Every problem with this asset, labelled by the path it applies to.
    pub fn problems(&self) -> Vec<(String, BuilderError)> {
        let mut problems = Vec::new();

        if let Err(e) = normalize_symbol(&self.symbol) {
            problems.push(("symbol".to_string(), e));
        }
        if let Err(e) = self.check_sizing() {
            problems.push(("sizing".to_string(), e));
        }

        if self.entry_rules.is_empty() {
            problems.push((
                "entry_rules".to_string(),
                BuilderError::MinimumCardinalityViolated {
                    symbol: self.symbol.clone(),
                    collection: ENTRY_RULES.to_string(),
                },
            ));
        }
        for (i, rule) in self.entry_rules.iter().enumerate() {
            if let Err(e) = rule.validate() {
                problems.push((format!("entry_rules[{i}]"), e));
            }
        }

        if self.exit_conditions.is_empty() {
            problems.push((
                "exit_conditions".to_string(),
                BuilderError::MinimumCardinalityViolated {
                    symbol: self.symbol.clone(),
                    collection: EXIT_CONDITIONS.to_string(),
                },
            ));
        }
        for (i, exit) in self.exit_conditions.iter().enumerate() {
            if let Err(e) = exit.validate() {
                problems.push((format!("exit_conditions[{i}]"), e));
            }
        }

        if let (Some(start), Some(end)) = (self.effective_start_date(), self.end_date) {
            if start > end {
                problems.push((
                    "start_date".to_string(),
                    BuilderError::field(
                        "start_date",
                        format!("{start} is after end_date {end}"),
                    ),
                ));
            }
        }

        if let Err(e) = self.earnings_play.validate() {
            problems.push(("earningsPlay".to_string(), e));
        }

        problems
    }

    /// Copy with every downstream-ignored field cleared.
    pub fn resolved(&self) -> AssetStrategy {
        let mut asset = self.clone();
        asset.start_date = asset.effective_start_date();
        for exit in &mut asset.exit_conditions {
            if exit.kind != ExitKind::Indicator {
                exit.indicator_rule = None;
            }
        }
        asset
    }
}

impl fmt::Display for AssetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} invest ${} max loss ${}",
            self.symbol, self.timeframe, self.investment, self.max_loss
        )
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), BuilderError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BuilderError::field(field, "must be a finite number"))
    }
}

fn out_of_range(symbol: &str, collection: &str, index: usize, len: usize) -> BuilderError {
    BuilderError::IndexOutOfRange {
        symbol: symbol.to_string(),
        collection: collection.to_string(),
        index,
        len,
    }
}

fn remove_keeping_one<T>(
    symbol: &str,
    collection: &str,
    items: &mut Vec<T>,
    index: usize,
) -> Result<T, BuilderError> {
    if index >= items.len() {
        return Err(out_of_range(symbol, collection, index, items.len()));
    }
    if items.len() == 1 {
        return Err(BuilderError::MinimumCardinalityViolated {
            symbol: symbol.to_string(),
            collection: collection.to_string(),
        });
    }
    Ok(items.remove(index))
}
