use super::reachability::{ReachabilityCheck, ReachabilityError};
use crate::config::ProbePolicy;
use crate::constants::PROBE_WARN_EVERY;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// A check failed in a way retrying cannot fix
    #[error("unexpected error reaching {host}:{port}: {reason}")]
    Structural {
        host: String,
        port: u16,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Every port accepted a connection
    Ready { attempts: u32 },
    /// Budget exhausted; `pending` lists the ports that never answered
    Unreachable { pending: Vec<u16>, attempts: u32 },
}

/// Bounded retry loop over a [`ReachabilityCheck`].
///
/// Ports confirmed in one attempt are never checked again within the same probe.
pub struct ReadinessProber {
    check: Arc<dyn ReachabilityCheck>,
    policy: ProbePolicy,
}

impl ReadinessProber {
    pub fn new(check: Arc<dyn ReachabilityCheck>, policy: ProbePolicy) -> Self {
        Self { check, policy }
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    pub async fn await_reachable(
        &self,
        host: &str,
        ports: &[u16],
    ) -> Result<ProbeOutcome, ProbeError> {
        let requested: BTreeSet<u16> = ports.iter().copied().collect();
        let mut confirmed: BTreeSet<u16> = BTreeSet::new();

        if requested.is_empty() {
            return Ok(ProbeOutcome::Ready { attempts: 0 });
        }

        for attempt in 1..=self.policy.max_attempts {
            let pending: Vec<u16> = requested.difference(&confirmed).copied().collect();

            let results = join_all(pending.iter().map(|&port| async move {
                let result = self
                    .check
                    .check(host, port, self.policy.connect_timeout)
                    .await;
                (port, result)
            }))
            .await;

            for (port, result) in results {
                match result {
                    Ok(()) => {
                        debug!(host, port, attempt, "Port reachable");
                        confirmed.insert(port);
                    }
                    Err(ReachabilityError::Fatal(reason)) => {
                        error!(host, port, attempt, reason = %reason, "❌ Unexpected error reaching app endpoint");
                        return Err(ProbeError::Structural {
                            host: host.to_string(),
                            port,
                            reason,
                        });
                    }
                    Err(err) => {
                        if warns_on_attempt(attempt) {
                            warn!(host, port, attempt, error = %err, "⚠️ App port not reachable yet");
                        } else {
                            debug!(host, port, attempt, error = %err, "App port not reachable yet");
                        }
                    }
                }
            }

            if confirmed.len() == requested.len() {
                info!(host, attempt, ports = ?requested, "✅ All app ports reachable");
                return Ok(ProbeOutcome::Ready { attempts: attempt });
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.retry_interval).await;
            }
        }

        let pending: Vec<u16> = requested.difference(&confirmed).copied().collect();
        warn!(
            host,
            attempts = self.policy.max_attempts,
            pending = ?pending,
            "⏰ App ports never became reachable"
        );
        Ok(ProbeOutcome::Unreachable {
            pending,
            attempts: self.policy.max_attempts,
        })
    }
}

impl std::fmt::Debug for ReadinessProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessProber")
            .field("policy", &self.policy)
            .finish()
    }
}

/// Failed connections log at warn on the first attempt and every
/// `PROBE_WARN_EVERY` attempts after it, at debug otherwise
fn warns_on_attempt(attempt: u32) -> bool {
    attempt.saturating_sub(1) % PROBE_WARN_EVERY == 0
}
