//! Event-driven overlays: trading around earnings reports and news.

use crate::domain::error::BuilderError;
use serde::{Deserialize, Serialize};

pub const MAX_EARNINGS_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_EARNINGS_WINDOW_DAYS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsPlay {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "daysBefore", default = "default_window")]
    pub days_before: u32,
    #[serde(rename = "daysAfter", default = "default_window")]
    pub days_after: u32,
}

fn default_window() -> u32 {
    DEFAULT_EARNINGS_WINDOW_DAYS
}

impl Default for EarningsPlay {
    fn default() -> Self {
        EarningsPlay {
            enabled: false,
            days_before: DEFAULT_EARNINGS_WINDOW_DAYS,
            days_after: DEFAULT_EARNINGS_WINDOW_DAYS,
        }
    }
}

impl EarningsPlay {
    pub fn validate(&self) -> Result<(), BuilderError> {
        for (field, days) in [
            ("earningsPlay.daysBefore", self.days_before),
            ("earningsPlay.daysAfter", self.days_after),
        ] {
            if days > MAX_EARNINGS_WINDOW_DAYS {
                return Err(BuilderError::field(
                    field,
                    format!("must be between 0 and {MAX_EARNINGS_WINDOW_DAYS}, got {days}"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    #[default]
    All,
    Financial,
    Tech,
    Regulatory,
}

impl NewsCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NewsCategory::All => "all",
            NewsCategory::Financial => "financial",
            NewsCategory::Tech => "tech",
            NewsCategory::Regulatory => "regulatory",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPlay {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub category: NewsCategory,
}
