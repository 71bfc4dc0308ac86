use std::sync::Arc;

use sweep_logging::{sweep_debug, sweep_info, sweep_warn};
use tagsweep_core::{AttemptState, RetryPolicy, RetryTracker};

use crate::{CheckOutcome, PageClassifier};

/// Wraps a [`PageClassifier`] with bounded retries.
///
/// Exhausted retries fail open: the outcome reports no match and carries the
/// last error instead of propagating it.
#[derive(Clone)]
pub struct RetryController {
    classifier: Arc<dyn PageClassifier>,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(classifier: Arc<dyn PageClassifier>, policy: RetryPolicy) -> Self {
        Self { classifier, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn check_with_retry(&self, url: &str) -> CheckOutcome {
        let mut tracker = RetryTracker::new(self.policy);
        let mut failure = None;

        while let Some(attempt) = tracker.begin_attempt() {
            sweep_debug!("Checking {} (attempt {})", url, attempt + 1);
            let err = match self.classifier.classify(url).await {
                Ok(classification) => {
                    tracker.succeed(classification.matches);
                    return CheckOutcome {
                        matches: classification.matches,
                        attempts: attempt + 1,
                        failure: None,
                    };
                }
                Err(err) => err,
            };

            if let AttemptState::Retrying { delay, .. } = tracker.fail(err.signal()) {
                if err.is_rate_limited() {
                    sweep_warn!("Rate limited on {}; cooling down for {:?}", url, delay);
                } else {
                    sweep_info!(
                        "Check of {} failed ({}); retrying in {:?}",
                        url,
                        err,
                        delay
                    );
                }
                tokio::time::sleep(delay).await;
            }
            failure = Some(err);
        }

        let attempts = match tracker.state() {
            AttemptState::Failed { attempts } => attempts,
            _ => self.policy.max_retries + 1,
        };
        sweep_warn!(
            "Giving up on {} after {} attempts; keeping it visible",
            url,
            attempts
        );
        CheckOutcome {
            matches: false,
            attempts,
            failure,
        }
    }
}
