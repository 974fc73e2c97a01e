//! # Orchestration Stack Access
//!
//! [`StackClient`] is the single-request adapter over the remote stack API; it never
//! retries. [`StackStatusPoller`] owns the backoff loops built on top of it.

pub mod client;
pub mod poller;

pub use client::{
    CreatedStack, StackClient, StackClientError, StackClientResult, StackDescriptor, StackFiles,
    StackLink, StackOutput, StackParameters, StackStatus,
};
pub use poller::{AbsenceOutcome, PollOutcome, StackStatusPoller};
