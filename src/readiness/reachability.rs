use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of a single failed connection attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityError {
    #[error("connection timed out")]
    Timeout,

    /// Refused, reset, unresolvable host and similar; worth retrying
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The target can never be reached as given
    #[error("unexpected error: {0}")]
    Fatal(String),
}

impl ReachabilityError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// One connection attempt against `host:port`
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn check(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<(), ReachabilityError>;
}

/// TCP connect with a timeout
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpReachabilityCheck;

#[async_trait]
impl ReachabilityCheck for TcpReachabilityCheck {
    async fn check(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<(), ReachabilityError> {
        debug!(host, port, "Testing TCP connection");

        match timeout(connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) if e.kind() == ErrorKind::InvalidInput => {
                Err(ReachabilityError::Fatal(e.to_string()))
            }
            Ok(Err(e)) => Err(ReachabilityError::ConnectionFailed(e.to_string())),
            Err(_) => Err(ReachabilityError::Timeout),
        }
    }
}
