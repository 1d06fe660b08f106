//! Periodic quote polling.
//!
//! A feed polls its `QuotePort` once immediately and then on a fixed
//! interval, publishing the latest price on a `watch` channel. Failed
//! lookups are logged and leave the last published quote in place.

use crate::ports::quote_port::QuotePort;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
}

/// Handle to a running poller. Dropping it stops polling.
#[derive(Debug)]
pub struct QuoteFeed {
    symbol: String,
    task: JoinHandle<()>,
    receiver: watch::Receiver<Option<Quote>>,
}

impl QuoteFeed {
    /// Start polling `symbol`. Must be called from within a tokio runtime.
    pub fn spawn(port: Arc<dyn QuotePort>, symbol: &str, interval: Duration) -> Self {
        let symbol = symbol.trim().to_uppercase();
        let (sender, receiver) = watch::channel(None);
        let task = tokio::spawn(poll(port, symbol.clone(), interval, sender));
        tracing::debug!(%symbol, ?interval, "quote feed started");
        QuoteFeed {
            symbol,
            task,
            receiver,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn latest(&self) -> Option<Quote> {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Quote>> {
        self.receiver.clone()
    }

    /// Wait for the next `count` published quotes. Returns early if the
    /// feed stops.
    pub async fn next_quotes(&self, count: usize) -> Vec<Quote> {
        let mut receiver = self.receiver.clone();
        let mut quotes = Vec::with_capacity(count);
        while quotes.len() < count {
            if receiver.changed().await.is_err() {
                break;
            }
            if let Some(quote) = receiver.borrow_and_update().clone() {
                quotes.push(quote);
            }
        }
        quotes
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for QuoteFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(
    port: Arc<dyn QuotePort>,
    symbol: String,
    interval: Duration,
    sender: watch::Sender<Option<Quote>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match port.latest_price(&symbol).await {
            Ok(price) => {
                let quote = Quote {
                    symbol: symbol.clone(),
                    price,
                };
                if sender.send(Some(quote)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(%symbol, error = %e, "quote lookup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::BuilderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripted answers in order, repeating the last one.
    struct ScriptedQuotes {
        answers: Mutex<Vec<Option<f64>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedQuotes {
        fn new(answers: Vec<Option<f64>>) -> Arc<Self> {
            Arc::new(ScriptedQuotes {
                answers: Mutex::new(answers),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl QuotePort for ScriptedQuotes {
        async fn latest_price(&self, symbol: &str) -> Result<f64, BuilderError> {
            let mut calls = self.calls.lock().unwrap();
            let answers = self.answers.lock().unwrap();
            let answer = answers
                .get(*calls)
                .or_else(|| answers.last())
                .copied()
                .flatten();
            *calls += 1;
            answer.ok_or_else(|| BuilderError::UnknownSymbol(symbol.to_string()))
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let port = ScriptedQuotes::new(vec![Some(10.0), Some(11.0)]);
        let feed = QuoteFeed::spawn(port.clone(), "aapl", Duration::from_secs(20));
        settle().await;
        assert_eq!(
            feed.latest(),
            Some(Quote {
                symbol: "AAPL".into(),
                price: 10.0
            })
        );
        assert_eq!(port.calls(), 1);

        tokio::time::advance(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(feed.latest().map(|q| q.price), Some(11.0));
        assert_eq!(port.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_last_price() {
        let port = ScriptedQuotes::new(vec![Some(42.0), None]);
        let feed = QuoteFeed::spawn(port.clone(), "NVDA", Duration::from_secs(5));
        settle().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(port.calls(), 2);
        assert_eq!(feed.latest().map(|q| q.price), Some(42.0));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_before_first_price_publishes_nothing() {
        let port = ScriptedQuotes::new(vec![None]);
        let feed = QuoteFeed::spawn(port, "ZZZZ", DEFAULT_POLL_INTERVAL);
        settle().await;
        assert_eq!(feed.latest(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn next_quotes_waits_for_each_poll() {
        let port = ScriptedQuotes::new(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let feed = QuoteFeed::spawn(port.clone(), "qqq", Duration::from_secs(20));
        let start = tokio::time::Instant::now();
        let prices: Vec<f64> = feed.next_quotes(3).await.iter().map(|q| q.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert!(start.elapsed() >= Duration::from_secs(40));
        assert_eq!(port.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_polling() {
        let port = ScriptedQuotes::new(vec![Some(1.0)]);
        let feed = QuoteFeed::spawn(port.clone(), "SPY", Duration::from_secs(1));
        settle().await;
        feed.stop();
        settle().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(port.calls(), 1);
    }
}
