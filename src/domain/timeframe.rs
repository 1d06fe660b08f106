//! Bar intervals.

use crate::domain::error::BuilderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval, ordered from shortest to longest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Mo1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 8] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::Mo1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mo1 => "1M",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = BuilderError;

    // Case-sensitive: "1m" is a minute, "1M" a month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| BuilderError::field("timeframe", format!("unknown timeframe {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_shortest() {
        assert_eq!(Timeframe::default(), Timeframe::M1);
        assert_eq!(Timeframe::ALL.iter().min(), Some(&Timeframe::M1));
    }

    #[test]
    fn minute_and_month_are_distinct() {
        assert_eq!("1m".parse::<Timeframe>().unwrap(), Timeframe::M1);
        assert_eq!("1M".parse::<Timeframe>().unwrap(), Timeframe::Mo1);
    }

    #[test]
    fn unknown_timeframe_rejected() {
        assert!("2h".parse::<Timeframe>().is_err());
    }

    #[test]
    fn serde_uses_wire_spelling() {
        assert_eq!(serde_json::to_string(&Timeframe::H4).unwrap(), "\"4h\"");
        let tf: Timeframe = serde_json::from_str("\"1w\"").unwrap();
        assert_eq!(tf, Timeframe::W1);
    }
}
