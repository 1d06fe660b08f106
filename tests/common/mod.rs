#![allow(dead_code)]

use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use stratbuilder::domain::builder::{Step, StrategyBuilder};
use stratbuilder::domain::document::Document;
use stratbuilder::domain::error::BuilderError;
use stratbuilder::domain::outcome::{AssetResult, AssetSummary, SubmissionReceipt};
use stratbuilder::ports::submission_port::SubmissionPort;

/// Records every document it receives and answers from a script.
pub struct RecordingSubmissionPort {
    pub received: Mutex<Vec<Document>>,
    pub reject_with: Option<String>,
}

impl RecordingSubmissionPort {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            reject_with: None,
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            reject_with: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Document> {
        self.received.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SubmissionPort for RecordingSubmissionPort {
    async fn submit(&self, document: &Document) -> Result<SubmissionReceipt, BuilderError> {
        self.received.lock().unwrap().push(document.clone());
        if let Some(message) = &self.reject_with {
            return Err(BuilderError::SubmissionRejected(message.clone()));
        }
        Ok(SubmissionReceipt {
            strategy_id: "strategy-1".to_string(),
            results: document
                .assets()
                .iter()
                .map(|a| AssetResult {
                    symbol: a.symbol.clone(),
                    summary: AssetSummary::compute(&[], a.investment),
                    trades: vec![],
                })
                .collect(),
        })
    }
}

pub fn builder_with(symbols: &[&str]) -> StrategyBuilder {
    let mut builder = StrategyBuilder::default();
    for symbol in symbols {
        builder.add_asset(symbol).unwrap();
    }
    builder
}

pub fn advance_to(builder: &mut StrategyBuilder, target: Step) {
    while builder.step() < target {
        builder.go_next().unwrap();
    }
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
