//! Token usage tracking for a session.

use crate::TokenUsage;

/// Cumulative token usage across every exchange of a session, including
/// the intra-turn tool-call rounds.
#[derive(Debug, Default)]
pub struct UsageTracker {
    total: TokenUsage,
    exchange_count: u64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, usage: &TokenUsage) {
        self.total.input_tokens += usage.input_tokens;
        self.total.output_tokens += usage.output_tokens;
        self.exchange_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    /// Number of backend round-trips recorded.
    pub fn exchange_count(&self) -> u64 {
        self.exchange_count
    }

    pub fn reset(&mut self) {
        self.total = TokenUsage::default();
        self.exchange_count = 0;
    }
}
