//! Retry message formatting
//!
//! Keeps retry and exhaustion log lines uniform across all fetch units.

use std::time::Duration;

use crate::fetcher::OutcomeKind;

/// Remediation hint shown when an item runs out of attempts
pub fn suggestion(kind: OutcomeKind) -> &'static str {
    match kind {
        OutcomeKind::RateLimited => "Reduce --window-size or increase --tick-ms",
        OutcomeKind::ServerError => "The API may be experiencing issues, try again later",
        OutcomeKind::TransportError => "Check network connectivity or raise --request-timeout-secs",
        OutcomeKind::ClientError => "Check the API key and request parameters",
        OutcomeKind::NotFound | OutcomeKind::Success => "No action needed",
    }
}

/// Context for one retry decision
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that just finished (1-based)
    pub attempt: u32,
    /// Configured attempt budget
    pub max_attempts: u32,
    /// Outcome of the finished attempt
    pub kind: OutcomeKind,
    /// Description of that outcome
    pub detail: String,
    /// Delay before the next attempt
    pub delay: Duration,
    /// Work item label (address, coordinates, cell)
    pub label: String,
}

impl RetryContext {
    /// Build a context
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        kind: OutcomeKind,
        detail: impl Into<String>,
        delay: Duration,
        label: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            kind,
            detail: detail.into(),
            delay,
            label: label.into(),
        }
    }

    /// Line logged before sleeping for the next attempt
    pub fn format_retry(&self) -> String {
        let mut message = format!(
            "Retrying (attempt {}/{}) after {} - waiting {:.1} seconds...",
            self.attempt + 1,
            self.max_attempts,
            self.detail,
            self.delay.as_secs_f64()
        );
        append_label(&mut message, &self.label);
        message
    }

    /// Line logged when a retried item eventually resolves
    pub fn format_success(&self) -> String {
        let mut message = format!(
            "Attempt {}/{} succeeded",
            self.attempt, self.max_attempts
        );
        append_label(&mut message, &self.label);
        message
    }

    /// Summary logged once an item runs out of attempts
    pub fn format_failure(&self) -> String {
        let label = if self.label.is_empty() {
            "unknown"
        } else {
            &self.label
        };
        [
            format!("[FAILED] Gave up after {} attempts", self.max_attempts),
            format!("  Item: {label}"),
            format!("  Last outcome: {}", self.detail),
            format!("  Suggestion: {}", suggestion(self.kind)),
        ]
        .join("\n")
    }
}

fn append_label(buffer: &mut String, label: &str) {
    if !label.is_empty() {
        buffer.push_str(" (");
        buffer.push_str(label);
        buffer.push(')');
    }
}
