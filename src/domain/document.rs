//! The submission unit: an ordered set of per-symbol strategies.

use crate::domain::asset::{AssetDefaults, AssetField, AssetStrategy, normalize_symbol};
use crate::domain::error::BuilderError;
use crate::domain::exit::{ExitCondition, ExitField};
use crate::domain::rule::{Rule, RuleField};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "stocks")]
    assets: Vec<AssetStrategy>,
}

/// One validation finding, located by symbol and field path.
#[derive(Debug)]
pub struct Problem {
    pub symbol: String,
    pub path: String,
    pub error: BuilderError,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() {
            write!(f, "{}: {}", self.path, self.error)
        } else {
            write!(f, "{} {}: {}", self.symbol, self.path, self.error)
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[AssetStrategy] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }

    /// Case-insensitive lookup.
    pub fn asset(&self, symbol: &str) -> Option<&AssetStrategy> {
        let wanted = symbol.trim();
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(wanted))
    }

    fn asset_mut(&mut self, symbol: &str) -> Result<&mut AssetStrategy, BuilderError> {
        let wanted = symbol.trim();
        self.assets
            .iter_mut()
            .find(|a| a.symbol.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BuilderError::UnknownSymbol(symbol.to_string()))
    }

    /// Append a default strategy for `symbol`; returns the normalized symbol.
    pub fn add_asset(
        &mut self,
        symbol: &str,
        defaults: &AssetDefaults,
    ) -> Result<String, BuilderError> {
        let normalized = normalize_symbol(symbol)?;
        if self.asset(&normalized).is_some() {
            return Err(BuilderError::DuplicateSymbol(normalized));
        }
        self.assets.push(AssetStrategy::new(&normalized, defaults)?);
        Ok(normalized)
    }

    /// Append a fully specified strategy, normalizing its symbol.
    pub fn insert_asset(&mut self, mut asset: AssetStrategy) -> Result<String, BuilderError> {
        asset.symbol = normalize_symbol(&asset.symbol)?;
        if self.asset(&asset.symbol).is_some() {
            return Err(BuilderError::DuplicateSymbol(asset.symbol));
        }
        let symbol = asset.symbol.clone();
        self.assets.push(asset);
        Ok(symbol)
    }

    /// Remove `symbol` if present. Absent symbols are a no-op.
    pub fn remove_asset(&mut self, symbol: &str) -> Option<AssetStrategy> {
        let wanted = symbol.trim();
        let index = self
            .assets
            .iter()
            .position(|a| a.symbol.eq_ignore_ascii_case(wanted))?;
        Some(self.assets.remove(index))
    }

    pub fn update_asset(&mut self, symbol: &str, field: AssetField) -> Result<(), BuilderError> {
        self.asset_mut(symbol)?.update_field(field)
    }

    pub fn add_rule(&mut self, symbol: &str, rule: Rule) -> Result<usize, BuilderError> {
        Ok(self.asset_mut(symbol)?.add_rule(rule))
    }

    pub fn remove_rule(&mut self, symbol: &str, index: usize) -> Result<Rule, BuilderError> {
        self.asset_mut(symbol)?.remove_rule(index)
    }

    pub fn update_rule(
        &mut self,
        symbol: &str,
        index: usize,
        field: RuleField,
    ) -> Result<(), BuilderError> {
        self.asset_mut(symbol)?.update_rule(index, field)
    }

    pub fn add_exit_condition(
        &mut self,
        symbol: &str,
        exit: ExitCondition,
    ) -> Result<usize, BuilderError> {
        Ok(self.asset_mut(symbol)?.add_exit_condition(exit))
    }

    pub fn remove_exit_condition(
        &mut self,
        symbol: &str,
        index: usize,
    ) -> Result<ExitCondition, BuilderError> {
        self.asset_mut(symbol)?.remove_exit_condition(index)
    }

    pub fn update_exit_condition(
        &mut self,
        symbol: &str,
        index: usize,
        field: ExitField,
    ) -> Result<(), BuilderError> {
        self.asset_mut(symbol)?.update_exit_condition(index, field)
    }

    /// Every problem in the document, in asset order.
    pub fn problems(&self) -> Vec<Problem> {
        let mut problems = Vec::new();
        if self.assets.is_empty() {
            problems.push(Problem {
                symbol: String::new(),
                path: "stocks".to_string(),
                error: BuilderError::MinimumCardinalityViolated {
                    symbol: "document".to_string(),
                    collection: "asset".to_string(),
                },
            });
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            let key = asset.symbol.trim().to_uppercase();
            if !key.is_empty() && !seen.insert(key.clone()) {
                problems.push(Problem {
                    symbol: asset.symbol.clone(),
                    path: "symbol".to_string(),
                    error: BuilderError::DuplicateSymbol(key),
                });
            }
            for (path, error) in asset.problems() {
                problems.push(Problem {
                    symbol: asset.symbol.clone(),
                    path,
                    error,
                });
            }
        }
        problems
    }

    /// End-to-end validation; reports the first problem found.
    pub fn validate(&self) -> Result<(), Problem> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Copy as handed to the submission backend: symbols trimmed and uppercased,
    /// downstream-ignored fields cleared.
    pub fn resolved(&self) -> Document {
        Document {
            assets: self
                .assets
                .iter()
                .map(|a| {
                    let mut asset = a.resolved();
                    asset.symbol = asset.symbol.trim().to_uppercase();
                    asset
                })
                .collect(),
        }
    }
}
