//! SDK-specific error types with outcome classification.
//!
//! Provides a two-tier error model:
//! - **Transport errors**: connection failures, timeouts, gRPC status codes
//! - **Outcome classification**: for non-idempotent calls, a transport-level
//!   failure means the outcome is *unknown* - the server may or may not have
//!   committed. Those are surfaced as [`SdkError::Indeterminate`] so callers
//!   cannot accidentally treat them as a clean failure and blindly retry.

use snafu::{Location, Snafu};
use tonic::Code;

use chirp_types::PairId;

/// Metadata key the registry sets on `ALREADY_EXISTS` statuses.
const CONFLICTING_PAIR_KEY: &str = "conflicting-pair-id";

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types with context-rich error messages.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SdkError {
    /// Failed to establish a connection.
    #[snafu(display("connection error at {location}: {message}"))]
    Connection {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Transport-level error (HTTP/2, socket).
    #[snafu(display("transport error at {location}: {source}"))]
    Transport {
        /// Underlying transport error.
        source: tonic::transport::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// gRPC error with a known outcome: the server answered.
    #[snafu(display("rpc error (code={code:?}): {message}"))]
    Rpc {
        /// gRPC status code.
        code: Code,
        /// Error message from the server.
        message: String,
        /// Conflicting registry pair, when the server reported a duplicate.
        conflicting_pair: Option<PairId>,
    },

    /// A non-idempotent call failed in a way that leaves its outcome
    /// unknown: the operation may or may not have been applied. Retrying
    /// blindly is unsafe (a retried registry `add` that actually committed
    /// would orphan a reservation); callers must re-probe or surface the
    /// condition.
    #[snafu(display("outcome of {operation} is indeterminate: {message}"))]
    Indeterminate {
        /// The operation whose outcome is unknown.
        operation: String,
        /// Underlying failure description.
        message: String,
    },

    /// Retry attempts exhausted on a read-only operation.
    #[snafu(display("retry exhausted after {attempts} attempts: {last_error}"))]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last error message before giving up.
        last_error: String,
    },

    /// Endpoint URL could not be parsed.
    #[snafu(display("invalid endpoint '{endpoint}': {message}"))]
    InvalidEndpoint {
        /// The invalid endpoint.
        endpoint: String,
        /// Parse error description.
        message: String,
    },
}

impl SdkError {
    /// Returns true if the error is transient and a **read-only** operation
    /// may be retried.
    ///
    /// Indeterminate errors are never retryable: by construction they belong
    /// to non-idempotent calls.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Connection { .. } => true,
            Self::Rpc { code, .. } => matches!(
                code,
                Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted
            ),
            Self::Indeterminate { .. } => false,
            Self::RetryExhausted { .. } => false,
            Self::InvalidEndpoint { .. } => false,
        }
    }

    /// The gRPC status code, if this is an RPC error with a known outcome.
    #[must_use]
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The conflicting registry pair id, if the server reported a duplicate.
    #[must_use]
    pub fn conflicting_pair(&self) -> Option<PairId> {
        match self {
            Self::Rpc { conflicting_pair, .. } => *conflicting_pair,
            _ => None,
        }
    }

    /// Classifies a status from a **non-idempotent** call.
    ///
    /// Codes that can be produced without the server having decided the
    /// request (transport cut, deadline, cancellation) become
    /// [`SdkError::Indeterminate`]; anything else carries a definite outcome
    /// and maps like a normal RPC error.
    pub(crate) fn from_status_nonidempotent(status: tonic::Status, operation: &str) -> Self {
        match status.code() {
            Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled | Code::Unknown => {
                Self::Indeterminate {
                    operation: operation.to_owned(),
                    message: status.message().to_owned(),
                }
            },
            _ => Self::from(status),
        }
    }
}

impl From<tonic::transport::Error> for SdkError {
    fn from(source: tonic::transport::Error) -> Self {
        Self::Transport { source, location: Location::default() }
    }
}

impl From<tonic::Status> for SdkError {
    fn from(status: tonic::Status) -> Self {
        let conflicting_pair = status
            .metadata()
            .get(CONFLICTING_PAIR_KEY)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(PairId::new);

        Self::Rpc {
            code: status.code(),
            message: status.message().to_owned(),
            conflicting_pair,
        }
    }
}
