//! Quote source backed by a fixed price table.

use crate::domain::error::BuilderError;
use crate::ports::quote_port::QuotePort;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct StaticQuoteAdapter {
    prices: RwLock<HashMap<String, f64>>,
}

impl StaticQuoteAdapter {
    pub fn new<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        StaticQuoteAdapter {
            prices: RwLock::new(
                prices
                    .into_iter()
                    .map(|(s, p)| (s.as_ref().to_uppercase(), p))
                    .collect(),
            ),
        }
    }

    /// Change the price returned for `symbol` on subsequent lookups.
    pub fn set_price(&self, symbol: &str, price: f64) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(symbol.to_uppercase(), price);
        }
    }
}

#[async_trait]
impl QuotePort for StaticQuoteAdapter {
    async fn latest_price(&self, symbol: &str) -> Result<f64, BuilderError> {
        let prices = self
            .prices
            .read()
            .map_err(|_| std::io::Error::other("quote table lock poisoned"))?;
        prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| BuilderError::UnknownSymbol(symbol.to_string()))
    }
}
