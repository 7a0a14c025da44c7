//! Signal client: the network conversation with the scoring service.
//!
//! The `SignalSource` trait abstracts over where signals come from so the
//! adapter can be driven by the HTTP client in production and by mocks in
//! tests. The cache layer sits above this trait; sources know nothing of it.

pub mod http;
pub mod wire;

pub use http::SignalClient;

use crate::domain::{CalcRequest, CalcResponse};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a signal could not be resolved.
///
/// None of these ever reach the host: the adapter absorbs every variant into
/// a default-filled output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("scoring service unreachable: {0}")]
    Connection(String),

    #[error("scoring service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("scoring service protocol error: {0}")]
    Protocol(String),

    #[error("invalid host input: {0}")]
    InvalidInput(String),
}

impl SignalError {
    /// Whether this failure came from the remote exchange and should hold off
    /// further requests for the failure cooldown.
    ///
    /// Input errors never touch the network, so there is nothing to throttle.
    pub fn throttles(&self) -> bool {
        !matches!(self, SignalError::InvalidInput(_))
    }

    /// Whether the session that produced this error should be rebuilt.
    pub fn poisons_session(&self) -> bool {
        matches!(self, SignalError::Connection(_) | SignalError::Timeout(_))
    }
}

/// Anything that can turn a `CalcRequest` into a signal.
pub trait SignalSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Resolve one request. Must return within the source's own time bound.
    fn fetch_signal(&self, req: &CalcRequest) -> Result<CalcResponse, SignalError>;
}

impl<S: SignalSource + ?Sized> SignalSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_signal(&self, req: &CalcRequest) -> Result<CalcResponse, SignalError> {
        (**self).fetch_signal(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_remote_failures_throttle() {
        assert!(SignalError::Connection("refused".into()).throttles());
        assert!(SignalError::Timeout(Duration::from_millis(300)).throttles());
        assert!(SignalError::Protocol("HTTP 500".into()).throttles());
        assert!(!SignalError::InvalidInput("len < 0".into()).throttles());
    }

    #[test]
    fn protocol_errors_keep_the_session() {
        assert!(SignalError::Connection("reset".into()).poisons_session());
        assert!(SignalError::Timeout(Duration::from_millis(1)).poisons_session());
        assert!(!SignalError::Protocol("bad body".into()).poisons_session());
    }

    #[test]
    fn error_display() {
        let err = SignalError::Protocol("HTTP 500 Internal Server Error".into());
        assert_eq!(
            err.to_string(),
            "scoring service protocol error: HTTP 500 Internal Server Error"
        );
        let err = SignalError::Timeout(Duration::from_millis(300));
        assert_eq!(err.to_string(), "scoring service did not answer within 300ms");
    }
}
