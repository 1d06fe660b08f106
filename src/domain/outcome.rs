//! Submission results returned by the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    #[default]
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub pnl: f64,
    pub pct_return: f64,
    #[serde(rename = "type", default)]
    pub side: TradeSide,
}

impl TradeRecord {
    /// Long trade of `shares` from `entry_price` to `exit_price`.
    pub fn long(entry_price: f64, exit_price: f64, shares: f64) -> Self {
        let pnl = (exit_price - entry_price) * shares;
        let cost = entry_price * shares;
        let pct_return = if cost != 0.0 { pnl / cost * 100.0 } else { 0.0 };
        TradeRecord {
            entry_price,
            exit_price,
            shares,
            pnl,
            pct_return,
            side: TradeSide::Buy,
        }
    }
}

/// Per-asset summary. Rates and returns are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub start_capital: f64,
    pub end_capital: f64,
    pub total_profit: f64,
    pub num_trades: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub avg_deal_profit: f64,
    pub avg_deal_profit_pct: f64,
    pub cumulative_return_pct: f64,
}

impl AssetSummary {
    pub fn compute(trades: &[TradeRecord], start_capital: f64) -> Self {
        let num_trades = trades.len();
        if num_trades == 0 {
            return AssetSummary {
                start_capital,
                end_capital: start_capital,
                total_profit: 0.0,
                num_trades: 0,
                win_rate: 0.0,
                loss_rate: 0.0,
                avg_deal_profit: 0.0,
                avg_deal_profit_pct: 0.0,
                cumulative_return_pct: 0.0,
            };
        }

        let n = num_trades as f64;
        let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
        let total_profit: f64 = trades.iter().map(|t| t.pnl).sum();
        let total_pct: f64 = trades.iter().map(|t| t.pct_return).sum();
        let end_capital = start_capital + total_profit;

        let cumulative_return_pct = if start_capital != 0.0 {
            total_profit / start_capital * 100.0
        } else {
            0.0
        };

        AssetSummary {
            start_capital,
            end_capital,
            total_profit,
            num_trades,
            win_rate: wins as f64 / n * 100.0,
            loss_rate: (num_trades - wins) as f64 / n * 100.0,
            avg_deal_profit: total_profit / n,
            avg_deal_profit_pct: total_pct / n,
            cumulative_return_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetResult {
    pub symbol: String,
    pub summary: AssetSummary,
    pub trades: Vec<TradeRecord>,
}

/// Identifies a live-update stream for one submitted asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiveSubscription {
    pub strategy_id: String,
    pub symbol: String,
}

/// Successful submission: backend-assigned id plus one result per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub strategy_id: String,
    pub results: Vec<AssetResult>,
}

impl SubmissionReceipt {
    pub fn result(&self, symbol: &str) -> Option<&AssetResult> {
        self.results
            .iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn subscriptions(&self) -> Vec<LiveSubscription> {
        self.results
            .iter()
            .map(|r| LiveSubscription {
                strategy_id: self.strategy_id.clone(),
                symbol: r.symbol.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_trades_leave_capital_unchanged() {
        let s = AssetSummary::compute(&[], 1000.0);
        assert_eq!(s.end_capital, 1000.0);
        assert_eq!(s.num_trades, 0);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.cumulative_return_pct, 0.0);
    }

    #[test]
    fn long_trade_pnl() {
        let t = TradeRecord::long(100.0, 110.0, 5.0);
        assert_relative_eq!(t.pnl, 50.0);
        assert_relative_eq!(t.pct_return, 10.0);
        assert_eq!(t.side, TradeSide::Buy);
    }

    #[test]
    fn summary_rates_and_returns() {
        let trades = vec![
            TradeRecord::long(100.0, 120.0, 10.0),
            TradeRecord::long(100.0, 95.0, 10.0),
            TradeRecord::long(100.0, 100.0, 10.0),
            TradeRecord::long(100.0, 110.0, 10.0),
        ];
        let s = AssetSummary::compute(&trades, 1000.0);
        assert_eq!(s.num_trades, 4);
        assert_relative_eq!(s.total_profit, 250.0);
        assert_relative_eq!(s.end_capital, 1250.0);
        assert_relative_eq!(s.win_rate, 50.0);
        assert_relative_eq!(s.loss_rate, 50.0);
        assert_relative_eq!(s.avg_deal_profit, 62.5);
        assert_relative_eq!(s.avg_deal_profit_pct, 6.25);
        assert_relative_eq!(s.cumulative_return_pct, 25.0);
    }

    #[test]
    fn subscriptions_pair_id_with_symbols() {
        let receipt = SubmissionReceipt {
            strategy_id: "abc".into(),
            results: vec![
                AssetResult {
                    symbol: "AAPL".into(),
                    summary: AssetSummary::compute(&[], 10.0),
                    trades: vec![],
                },
                AssetResult {
                    symbol: "NVDA".into(),
                    summary: AssetSummary::compute(&[], 10.0),
                    trades: vec![],
                },
            ],
        };
        let subs = receipt.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].symbol, "NVDA");
        assert!(subs.iter().all(|s| s.strategy_id == "abc"));
        assert!(receipt.result("aapl").is_some());
    }
}
