//! Step-gated strategy builder.
//!
//! The builder owns the in-progress `Document` and walks the user through a
//! fixed sequence of steps. Advancing is guarded by a per-step gate evaluated
//! against the current document; going back is always allowed. Submission is
//! two-phase (`begin_submit` / `complete_submit`) so a host can drive the
//! request itself, with `submit` composing both around a `SubmissionPort`.

use crate::domain::asset::{AssetDefaults, AssetField};
use crate::domain::document::Document;
use crate::domain::error::BuilderError;
use crate::domain::exit::{ExitCondition, ExitField};
use crate::domain::outcome::{LiveSubscription, SubmissionReceipt};
use crate::domain::rule::{Rule, RuleField};
use crate::ports::submission_port::SubmissionPort;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Assets,
    Sizing,
    Rules,
    Overlays,
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Assets,
        Step::Sizing,
        Step::Rules,
        Step::Overlays,
        Step::Review,
    ];

    pub fn first() -> Step {
        Step::Assets
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::Assets => Some(Step::Sizing),
            Step::Sizing => Some(Step::Rules),
            Step::Rules => Some(Step::Overlays),
            Step::Overlays => Some(Step::Review),
            Step::Review => None,
        }
    }

    pub fn prev(self) -> Option<Step> {
        match self {
            Step::Assets => None,
            Step::Sizing => Some(Step::Assets),
            Step::Rules => Some(Step::Sizing),
            Step::Overlays => Some(Step::Rules),
            Step::Review => Some(Step::Overlays),
        }
    }

    /// 1-based position, as shown in a stepper.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Assets => "assets",
            Step::Sizing => "sizing",
            Step::Rules => "rules",
            Step::Overlays => "overlays",
            Step::Review => "review",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Assets => "Choose assets",
            Step::Sizing => "Amount and risk",
            Step::Rules => "Entry criteria",
            Step::Overlays => "Earnings and news",
            Step::Review => "Review and run",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluate the gate guarding the exit from `step`.
pub fn check_gate(step: Step, document: &Document) -> Result<(), BuilderError> {
    let fail = |reason: String| BuilderError::GateFailed { step, reason };
    match step {
        Step::Assets => {
            if document.is_empty() {
                return Err(fail("add at least one symbol".to_string()));
            }
        }
        Step::Sizing => {
            for asset in document.assets() {
                asset
                    .check_sizing()
                    .map_err(|e| fail(format!("{}: {e}", asset.symbol)))?;
            }
        }
        Step::Rules => {
            for asset in document.assets() {
                asset
                    .check_entry_rules()
                    .map_err(|e| fail(format!("{}: {e}", asset.symbol)))?;
            }
        }
        Step::Overlays => {}
        Step::Review => {
            document
                .validate()
                .map_err(|problem| fail(problem.to_string()))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Submitted(SubmissionReceipt),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct StrategyBuilder {
    defaults: AssetDefaults,
    document: Document,
    step: Step,
    submission: SubmissionState,
}

impl Default for Step {
    fn default() -> Self {
        Step::first()
    }
}

impl StrategyBuilder {
    pub fn new(defaults: AssetDefaults) -> Self {
        StrategyBuilder {
            defaults,
            ..Self::default()
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Owned copy for renderers that outlive the borrow.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn defaults(&self) -> &AssetDefaults {
        &self.defaults
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submission, SubmissionState::Pending)
    }

    /// Gate status of the active step, for enabling a "next" control.
    pub fn current_gate(&self) -> Result<(), BuilderError> {
        check_gate(self.step, &self.document)
    }

    pub fn go_next(&mut self) -> Result<Step, BuilderError> {
        let Some(next) = self.step.next() else {
            return Err(BuilderError::GateFailed {
                step: self.step,
                reason: "review is the last step; submit instead".to_string(),
            });
        };
        if let Err(e) = self.current_gate() {
            tracing::warn!(step = %self.step, error = %e, "step gate rejected transition");
            return Err(e);
        }
        tracing::debug!(from = %self.step, to = %next, "advancing step");
        self.step = next;
        Ok(next)
    }

    /// Step back without re-validating. Stays put on the first step.
    pub fn go_prev(&mut self) -> Step {
        if let Some(prev) = self.step.prev() {
            tracing::debug!(from = %self.step, to = %prev, "returning to step");
            self.step = prev;
        }
        self.step
    }

    /// Discard the document and return to the first step. A pending
    /// submission is abandoned; its late completion is ignored.
    pub fn restart(&mut self) {
        if self.is_submitting() {
            tracing::info!("restart abandons in-flight submission");
        }
        self.document = Document::new();
        self.step = Step::first();
        self.submission = SubmissionState::Idle;
    }

    /// Replace the document with `document`, normalizing symbols and
    /// rejecting duplicates. The builder returns to the first step and any
    /// previous submission outcome is cleared.
    pub fn import(&mut self, document: Document) -> Result<(), BuilderError> {
        self.ensure_editable()?;
        let mut imported = Document::new();
        for asset in document.assets() {
            imported.insert_asset(asset.clone())?;
        }
        tracing::debug!(assets = imported.len(), "imported document");
        self.document = imported;
        self.step = Step::first();
        self.submission = SubmissionState::Idle;
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), BuilderError> {
        if self.is_submitting() {
            return Err(BuilderError::SubmissionInProgress);
        }
        Ok(())
    }

    pub fn add_asset(&mut self, symbol: &str) -> Result<String, BuilderError> {
        self.ensure_editable()?;
        let symbol = self.document.add_asset(symbol, &self.defaults)?;
        tracing::debug!(%symbol, "added asset");
        Ok(symbol)
    }

    pub fn remove_asset(&mut self, symbol: &str) -> Result<bool, BuilderError> {
        self.ensure_editable()?;
        let removed = self.document.remove_asset(symbol).is_some();
        if removed {
            tracing::debug!(%symbol, "removed asset");
        }
        Ok(removed)
    }

    pub fn update_asset(&mut self, symbol: &str, field: AssetField) -> Result<(), BuilderError> {
        self.ensure_editable()?;
        self.document.update_asset(symbol, field)
    }

    pub fn add_rule(&mut self, symbol: &str, rule: Rule) -> Result<usize, BuilderError> {
        self.ensure_editable()?;
        self.document.add_rule(symbol, rule)
    }

    pub fn remove_rule(&mut self, symbol: &str, index: usize) -> Result<Rule, BuilderError> {
        self.ensure_editable()?;
        self.document.remove_rule(symbol, index)
    }

    pub fn update_rule(
        &mut self,
        symbol: &str,
        index: usize,
        field: RuleField,
    ) -> Result<(), BuilderError> {
        self.ensure_editable()?;
        self.document.update_rule(symbol, index, field)
    }

    pub fn add_exit_condition(
        &mut self,
        symbol: &str,
        exit: ExitCondition,
    ) -> Result<usize, BuilderError> {
        self.ensure_editable()?;
        self.document.add_exit_condition(symbol, exit)
    }

    pub fn remove_exit_condition(
        &mut self,
        symbol: &str,
        index: usize,
    ) -> Result<ExitCondition, BuilderError> {
        self.ensure_editable()?;
        self.document.remove_exit_condition(symbol, index)
    }

    pub fn update_exit_condition(
        &mut self,
        symbol: &str,
        index: usize,
        field: ExitField,
    ) -> Result<(), BuilderError> {
        self.ensure_editable()?;
        self.document.update_exit_condition(symbol, index, field)
    }

    /// Enter the pending state and hand out the resolved document to send.
    pub fn begin_submit(&mut self) -> Result<Document, BuilderError> {
        if self.is_submitting() {
            return Err(BuilderError::SubmissionInProgress);
        }
        if self.step != Step::Review {
            return Err(BuilderError::GateFailed {
                step: self.step,
                reason: "submission is only available from the review step".to_string(),
            });
        }
        if let Err(e) = check_gate(Step::Review, &self.document) {
            tracing::warn!(error = %e, "document not ready for submission");
            return Err(e);
        }
        self.submission = SubmissionState::Pending;
        tracing::info!(assets = self.document.len(), "submitting document");
        Ok(self.document.resolved())
    }

    /// Record the backend's answer. Success resets the builder to an empty
    /// document on the first step; failure keeps the document for a retry.
    pub fn complete_submit(
        &mut self,
        outcome: Result<SubmissionReceipt, BuilderError>,
    ) -> Result<SubmissionReceipt, BuilderError> {
        if !self.is_submitting() {
            return Err(BuilderError::NoSubmissionPending);
        }
        match outcome {
            Ok(receipt) => {
                tracing::info!(
                    strategy_id = %receipt.strategy_id,
                    results = receipt.results.len(),
                    "submission accepted"
                );
                self.document = Document::new();
                self.step = Step::first();
                self.submission = SubmissionState::Submitted(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                let message = match e {
                    BuilderError::SubmissionRejected(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!(%message, "submission failed");
                self.submission = SubmissionState::Failed(message.clone());
                Err(BuilderError::SubmissionRejected(message))
            }
        }
    }

    /// Validate, send through `port`, and record the outcome.
    ///
    /// Dropping the returned future before it resolves leaves the builder
    /// pending. Hosts that need timeouts or cancellation should drive
    /// `begin_submit` / `complete_submit` themselves and complete with an
    /// error when they give up.
    pub async fn submit(
        &mut self,
        port: &dyn SubmissionPort,
    ) -> Result<SubmissionReceipt, BuilderError> {
        let document = self.begin_submit()?;
        let outcome = port.submit(&document).await;
        self.complete_submit(outcome)
    }

    /// Strategy id / symbol pairs for the last accepted submission.
    pub fn live_subscriptions(&self) -> Vec<LiveSubscription> {
        match &self.submission {
            SubmissionState::Submitted(receipt) => receipt.subscriptions(),
            _ => Vec::new(),
        }
    }
}
