use crate::readiness::{ReachabilityCheck, ReachabilityError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
enum PortScript {
    /// Reachable from the n-th check of the port onwards
    ReachableOn(u32),
    Fatal(String),
}

#[derive(Debug, Default)]
struct ReachabilityState {
    scripts: HashMap<u16, PortScript>,
    checks: HashMap<u16, u32>,
    log: Vec<(String, u16)>,
}

/// Reachability check scripted per port.
///
/// Ports without a script refuse every connection.
#[derive(Debug, Default)]
pub struct ScriptedReachability {
    state: Mutex<ReachabilityState>,
}

impl ScriptedReachability {
    pub fn new() -> Self {
        Self::default()
    }

    /// `port` starts accepting connections on its `attempt`-th check
    pub fn reachable_on(&self, port: u16, attempt: u32) {
        self.state
            .lock()
            .scripts
            .insert(port, PortScript::ReachableOn(attempt));
    }

    pub fn fatal(&self, port: u16, reason: impl Into<String>) {
        self.state
            .lock()
            .scripts
            .insert(port, PortScript::Fatal(reason.into()));
    }

    /// Number of checks issued against `port`
    pub fn checks_for(&self, port: u16) -> u32 {
        self.state.lock().checks.get(&port).copied().unwrap_or(0)
    }

    /// Every `(host, port)` checked, in order
    pub fn log(&self) -> Vec<(String, u16)> {
        self.state.lock().log.clone()
    }
}

#[async_trait]
impl ReachabilityCheck for ScriptedReachability {
    async fn check(
        &self,
        host: &str,
        port: u16,
        _connect_timeout: Duration,
    ) -> Result<(), ReachabilityError> {
        let mut state = self.state.lock();
        state.log.push((host.to_string(), port));
        let count = {
            let entry = state.checks.entry(port).or_insert(0);
            *entry += 1;
            *entry
        };

        match state.scripts.get(&port) {
            Some(PortScript::ReachableOn(attempt)) if count >= *attempt => Ok(()),
            Some(PortScript::Fatal(reason)) => Err(ReachabilityError::Fatal(reason.clone())),
            _ => Err(ReachabilityError::ConnectionFailed(
                "connection refused".to_string(),
            )),
        }
    }
}
