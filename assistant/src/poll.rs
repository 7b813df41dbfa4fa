//! Run polling policy: interval, backoff and how transient failures are handled.

use std::time::Duration;

/// Delay schedule and attempt cap for polling a run.
///
/// The first poll happens after `interval`; every later delay is multiplied by
/// `backoff_factor` and capped at `max_interval`.
#[derive(Clone, Debug, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// Fixed 3 s interval, about one hour of polling.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            max_attempts: 1200,
        }
    }
}

impl PollPolicy {
    pub fn next_delay(&self, current: Duration) -> Duration {
        if self.backoff_factor <= 1.0 {
            return current.min(self.max_interval);
        }
        current.mul_f64(self.backoff_factor).min(self.max_interval)
    }

    /// All delays for a full run of `max_attempts` polls.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let mut current = self.interval.min(self.max_interval);
        (0..self.max_attempts).map(move |_| {
            let d = current;
            current = self.next_delay(current);
            d
        })
    }
}

/// What a poll loop does once transient failures exceed `retries` in a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransientFallback {
    /// Answer with this text instead of the assistant's reply.
    Apology(String),
    /// Return [`crate::AssistantError::TransientPoll`].
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransientPollPolicy {
    /// Consecutive transient failures tolerated before the fallback applies.
    pub retries: u32,
    pub fallback: TransientFallback,
}

impl Default for TransientPollPolicy {
    /// No retries, soft apology: the first failed status check ends the exchange with a canned reply.
    fn default() -> Self {
        Self {
            retries: 0,
            fallback: TransientFallback::Apology("Senpai, leave me alone for a bit".to_string()),
        }
    }
}
