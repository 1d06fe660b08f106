//! In-process submission backend for demos and tests.
//!
//! Each asset is filled at a fixed reference price. One trade is closed at
//! the first take-profit target and one at the first stop-loss, with exit
//! values read as dollar amounts on the whole position. Stop losses are
//! capped at the asset's `max_loss`.

use crate::domain::asset::AssetStrategy;
use crate::domain::config_validation::SubmissionSettings;
use crate::domain::document::Document;
use crate::domain::error::BuilderError;
use crate::domain::exit::ExitKind;
use crate::domain::outcome::{AssetResult, AssetSummary, SubmissionReceipt, TradeRecord};
use crate::ports::submission_port::SubmissionPort;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

pub const REFERENCE_ENTRY_PRICE: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct MockSubmissionAdapter {
    latency: Duration,
    reject_message: Option<String>,
}

impl MockSubmissionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &SubmissionSettings) -> Self {
        MockSubmissionAdapter {
            latency: settings.latency,
            reject_message: settings.reject_message.clone(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.reject_message = Some(message.into());
        self
    }

    fn first_exit_value(asset: &AssetStrategy, kind: ExitKind) -> Option<f64> {
        asset
            .exit_conditions
            .iter()
            .find(|e| e.kind == kind)
            .and_then(|e| e.value)
    }

    fn simulate(asset: &AssetStrategy) -> AssetResult {
        let shares = asset.investment / REFERENCE_ENTRY_PRICE;
        let mut trades = Vec::new();

        if shares > 0.0 {
            if let Some(target) = Self::first_exit_value(asset, ExitKind::TakeProfit) {
                let exit = REFERENCE_ENTRY_PRICE + target / shares;
                trades.push(TradeRecord::long(REFERENCE_ENTRY_PRICE, exit, shares));
            }
            if let Some(stop) = Self::first_exit_value(asset, ExitKind::StopLoss) {
                let loss = stop.min(asset.max_loss);
                let exit = (REFERENCE_ENTRY_PRICE - loss / shares).max(0.0);
                trades.push(TradeRecord::long(REFERENCE_ENTRY_PRICE, exit, shares));
            }
        }

        AssetResult {
            symbol: asset.symbol.clone(),
            summary: AssetSummary::compute(&trades, asset.investment),
            trades,
        }
    }
}

#[async_trait]
impl SubmissionPort for MockSubmissionAdapter {
    async fn submit(&self, document: &Document) -> Result<SubmissionReceipt, BuilderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(message) = &self.reject_message {
            tracing::warn!(%message, "mock backend rejecting submission");
            return Err(BuilderError::SubmissionRejected(message.clone()));
        }

        let strategy_id = Uuid::new_v4().to_string();
        let results: Vec<AssetResult> = document.assets().iter().map(Self::simulate).collect();
        tracing::debug!(%strategy_id, assets = results.len(), "mock backend accepted submission");
        Ok(SubmissionReceipt {
            strategy_id,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{AssetDefaults, AssetField};
    use approx::assert_relative_eq;

    fn document(symbols: &[&str]) -> Document {
        let mut doc = Document::new();
        for s in symbols {
            doc.add_asset(s, &AssetDefaults::default()).unwrap();
        }
        doc
    }

    #[tokio::test]
    async fn one_result_per_asset() {
        let doc = document(&["AAPL", "NVDA"]);
        let receipt = MockSubmissionAdapter::new().submit(&doc).await.unwrap();
        assert_eq!(receipt.results.len(), 2);
        assert!(Uuid::parse_str(&receipt.strategy_id).is_ok());
        assert_eq!(receipt.results[1].symbol, "NVDA");
    }

    #[tokio::test]
    async fn default_exits_produce_win_and_loss() {
        let doc = document(&["AAPL"]);
        let receipt = MockSubmissionAdapter::new().submit(&doc).await.unwrap();
        let result = &receipt.results[0];
        assert_eq!(result.trades.len(), 2);
        assert_relative_eq!(result.trades[0].pnl, 100.0, epsilon = 1e-9);
        assert_relative_eq!(result.trades[1].pnl, -50.0, epsilon = 1e-9);
        assert_relative_eq!(result.summary.total_profit, 50.0, epsilon = 1e-9);
        assert_relative_eq!(result.summary.win_rate, 50.0);
        assert_relative_eq!(result.summary.end_capital, 1050.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn stop_loss_capped_at_max_loss() {
        let mut doc = document(&["AAPL"]);
        doc.update_asset("AAPL", AssetField::MaxLoss(20.0)).unwrap();
        let receipt = MockSubmissionAdapter::new().submit(&doc).await.unwrap();
        assert_relative_eq!(receipt.results[0].trades[1].pnl, -20.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn rejection_message_is_returned() {
        let doc = document(&["AAPL"]);
        let err = MockSubmissionAdapter::new()
            .rejecting("market closed")
            .submit(&doc)
            .await
            .unwrap_err();
        assert!(matches!(err, BuilderError::SubmissionRejected(ref m) if m == "market closed"));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let doc = document(&["AAPL"]);
        let adapter = MockSubmissionAdapter::new().with_latency(Duration::from_millis(800));
        let start = tokio::time::Instant::now();
        adapter.submit(&doc).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(800));
    }
}
