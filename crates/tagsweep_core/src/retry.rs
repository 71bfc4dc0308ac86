use std::time::Duration;

use crate::Settings;

/// How a failed attempt should influence the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    RateLimited,
    Other,
}

/// Per-item check lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    /// `attempt` is zero-based.
    Attempting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Success { matches: bool, attempts: u32 },
    Failed { attempts: u32 },
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Success { .. } | AttemptState::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            rate_limit_delay: Duration::from_millis(settings.rate_limit_delay_ms),
        }
    }

    /// Delay before retrying after the zero-based `attempt` failed.
    ///
    /// Rate limiting always waits the fixed cooldown; everything else doubles
    /// from the base delay.
    pub fn delay_after(&self, attempt: u32, signal: FailureSignal) -> Duration {
        match signal {
            FailureSignal::RateLimited => self.rate_limit_delay,
            FailureSignal::Other => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

/// Drives one item through [`AttemptState`].
#[derive(Debug, Clone)]
pub struct RetryTracker {
    policy: RetryPolicy,
    state: AttemptState,
    next_attempt: u32,
}

impl RetryTracker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: AttemptState::Pending,
            next_attempt: 0,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Move into `Attempting`. Returns `None` once the tracker is terminal.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.state.is_terminal() {
            return None;
        }
        let attempt = self.next_attempt;
        self.state = AttemptState::Attempting { attempt };
        Some(attempt)
    }

    pub fn succeed(&mut self, matches: bool) -> AttemptState {
        self.state = AttemptState::Success {
            matches,
            attempts: self.next_attempt + 1,
        };
        self.state
    }

    pub fn fail(&mut self, signal: FailureSignal) -> AttemptState {
        let attempt = self.next_attempt;
        self.state = if attempt < self.policy.max_retries {
            self.next_attempt += 1;
            AttemptState::Retrying {
                attempt,
                delay: self.policy.delay_after(attempt, signal),
            }
        } else {
            AttemptState::Failed {
                attempts: attempt + 1,
            }
        };
        self.state
    }
}
