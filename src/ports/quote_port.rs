//! Latest-price lookup used by the live quote feed.

use crate::domain::error::BuilderError;
use async_trait::async_trait;

#[async_trait]
pub trait QuotePort: Send + Sync {
    async fn latest_price(&self, symbol: &str) -> Result<f64, BuilderError>;
}
