//! Submission backend port.

use crate::domain::document::Document;
use crate::domain::error::BuilderError;
use crate::domain::outcome::SubmissionReceipt;
use async_trait::async_trait;

/// Accepts a validated, resolved document and returns per-asset results.
///
/// Implementations report a refusal as `BuilderError::SubmissionRejected`;
/// any other error is surfaced to the builder as a rejection with the
/// error's message.
#[async_trait]
pub trait SubmissionPort: Send + Sync {
    async fn submit(&self, document: &Document) -> Result<SubmissionReceipt, BuilderError>;
}
