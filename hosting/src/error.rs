//! Client error types.

use std::time::Duration;

use thiserror::Error;

use crate::caller::CallError;

/// Errors surfaced by every resource client operation.
#[derive(Debug, Error)]
pub enum HostingError {
    /// A required identifier or field was empty; no remote call was made.
    #[error("{entity}.{field} not provided")]
    NotProvided {
        entity: &'static str,
        field: &'static str,
    },

    /// A non-empty field could not be converted to its wire shape.
    #[error("cannot parse {entity}.{field} from {value:?}")]
    Parse {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Two inputs that must agree do not.
    #[error("{entity}.{field} mismatch: expected {expected:?}, found {found:?}")]
    Mismatch {
        entity: &'static str,
        field: &'static str,
        expected: String,
        found: String,
    },

    /// The remote call primitive failed.
    #[error(transparent)]
    Remote(#[from] CallError),

    /// The operation reached a terminal failure status.
    #[error("bad operation status for {operation_id}: {status}")]
    OperationFailed { operation_id: i64, status: String },

    /// The caller cancelled the wait for an operation.
    #[error("wait for operation {operation_id} was cancelled")]
    Cancelled { operation_id: i64 },

    /// The operation did not finish within the configured deadline.
    #[error("operation {operation_id} did not finish within {deadline:?}")]
    DeadlineExceeded {
        operation_id: i64,
        deadline: Duration,
    },

    /// The operation did not finish within the configured number of polls.
    #[error("operation {operation_id} still pending after {attempts} polls")]
    PollLimitReached { operation_id: i64, attempts: u32 },
}

impl HostingError {
    pub fn not_provided(entity: &'static str, field: &'static str) -> Self {
        Self::NotProvided { entity, field }
    }

    pub fn parse(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Field name carried by validation errors, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NotProvided { field, .. }
            | Self::Parse { field, .. }
            | Self::Mismatch { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, HostingError>;
