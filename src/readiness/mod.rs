//! # Readiness Probing
//!
//! Confirms that a deployed workload accepts connections on every requested port.

pub mod prober;
pub mod reachability;

pub use prober::{ProbeError, ProbeOutcome, ReadinessProber};
pub use reachability::{ReachabilityCheck, ReachabilityError, TcpReachabilityCheck};
