//! Per-request usage accumulator.
//!
//! Backends disagree on how they report usage. Anthropic sends an
//! authoritative snapshot when the message starts and replaces the output
//! count when the message ends; OpenAI-compatible backends send one absolute
//! record at the end. `UsageState` reconciles both into one terminal record.
//!
//! A state is owned by exactly one in-flight decode and is never shared
//! between requests.

use crate::Usage;

/// Running usage totals of one decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageState {
    usage: Usage,
    reported: bool,
}

impl UsageState {
    /// Replace the whole state with a backend snapshot.
    pub fn snapshot(&mut self, usage: Usage) {
        self.usage = usage;
        self.reported = true;
    }

    /// Replace the output token count with the backend's final figure.
    pub fn set_output(&mut self, output_tokens: u32) {
        self.usage.output_tokens = output_tokens;
        self.reported = true;
    }

    /// Current totals.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Terminal usage, or `None` if the backend never reported usage.
    pub fn finish(self) -> Option<Usage> {
        self.reported.then_some(self.usage)
    }
}
