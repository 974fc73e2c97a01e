use super::client::{StackClient, StackDescriptor, StackStatus};
use crate::config::PollPolicy;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of waiting for a stack to finish provisioning
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Stack reached COMPLETE and published an endpoint
    Complete {
        descriptor: StackDescriptor,
        endpoint: String,
        attempts: u32,
    },
    /// Stack reached COMPLETE without any output to read the endpoint from
    MissingEndpoint { descriptor: StackDescriptor },
    /// Stack reported FAILED
    Failed { status: StackStatus, attempts: u32 },
    /// No terminal status within the attempt budget
    Timeout { attempts: u32 },
}

/// Result of waiting for a deleted stack to disappear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceOutcome {
    Absent { attempts: u32 },
    StillPresent { attempts: u32 },
}

/// Backoff loops over a [`StackClient`]
pub struct StackStatusPoller {
    client: Arc<dyn StackClient>,
    policy: PollPolicy,
}

impl StackStatusPoller {
    pub fn new(client: Arc<dyn StackClient>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll until the stack is COMPLETE or FAILED.
    ///
    /// Every attempt sleeps the current interval first and then grows it. A failed status
    /// fetch costs an attempt but does not end the loop.
    pub async fn await_terminal(&self, stack_id: &str) -> PollOutcome {
        let mut interval = self.policy.initial_interval;

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(interval).await;
            interval = self.policy.next_interval(interval);

            let descriptor = match self.client.get(stack_id).await {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(
                        stack_id,
                        attempt,
                        error = %err,
                        "⚠️ Stack status fetch failed, retrying"
                    );
                    continue;
                }
            };

            match descriptor.status {
                StackStatus::Complete => {
                    let Some(endpoint) = descriptor.endpoint().map(str::to_string) else {
                        warn!(stack_id, attempt, "⚠️ Stack complete but published no outputs");
                        return PollOutcome::MissingEndpoint { descriptor };
                    };
                    info!(stack_id, attempt, endpoint = %endpoint, "✅ Stack provisioning complete");
                    return PollOutcome::Complete {
                        descriptor,
                        endpoint,
                        attempts: attempt,
                    };
                }
                StackStatus::Failed => {
                    warn!(stack_id, attempt, "❌ Stack provisioning failed");
                    return PollOutcome::Failed {
                        status: descriptor.status,
                        attempts: attempt,
                    };
                }
                ref status => {
                    debug!(
                        stack_id,
                        attempt,
                        status = ?status,
                        next_wait_ms = millis(interval),
                        "Stack still provisioning"
                    );
                }
            }
        }

        warn!(
            stack_id,
            attempts = self.policy.max_attempts,
            "⏰ Stack never reached a terminal status"
        );
        PollOutcome::Timeout {
            attempts: self.policy.max_attempts,
        }
    }

    /// Poll until a lookup by `stack_name` reports not-found.
    ///
    /// Lookups go by name because a deleted stack stays resolvable by id. Each attempt
    /// checks before sleeping.
    pub async fn await_absence(&self, stack_name: &str) -> AbsenceOutcome {
        let mut interval = self.policy.initial_interval;

        for attempt in 1..=self.policy.max_attempts {
            match self.client.get(stack_name).await {
                Err(err) if err.is_not_found() => {
                    info!(stack_name, attempt, "🗑️ Stack is gone");
                    return AbsenceOutcome::Absent { attempts: attempt };
                }
                Err(err) => {
                    debug!(stack_name, attempt, error = %err, "Stack lookup failed during delete");
                }
                Ok(descriptor) => {
                    debug!(
                        stack_name,
                        attempt,
                        status = ?descriptor.status,
                        "Stack still present"
                    );
                }
            }

            tokio::time::sleep(interval).await;
            interval = self.policy.next_interval(interval);
        }

        warn!(
            stack_name,
            attempts = self.policy.max_attempts,
            "⏰ Stack still present after delete"
        );
        AbsenceOutcome::StillPresent {
            attempts: self.policy.max_attempts,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for StackStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackStatusPoller")
            .field("policy", &self.policy)
            .finish()
    }
}
