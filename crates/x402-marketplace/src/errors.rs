use std::fmt::Display;

use crate::domain::{payment::PaymentId, task::TaskId};

/// The kind of entity an invariant violation was raised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Payment,
    Task,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Payment => write!(f, "payment"),
            Entity::Task => write!(f, "task"),
        }
    }
}

/// A record that a caller referred to but that does not exist (or is not theirs).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("vendor '{0}' not found")]
    Vendor(String),
    #[error("resource '{path}' not found for vendor '{vendor_id}'")]
    Resource { vendor_id: String, path: String },
    #[error("task {0} not found")]
    Task(TaskId),
    #[error("payment {0} not found")]
    Payment(PaymentId),
}

/// Failures of a persistence port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} already exists")]
    Duplicate(String),
    #[error("record {0} does not exist")]
    Missing(String),
    #[error("record {id} was modified concurrently: expected stored version {expected}, found {found}")]
    Conflict { id: String, expected: u64, found: u64 },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A remote collaborator (custody executor, credential issuer, ...) could not be reached or
/// answered with an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{service} error: {message}")]
pub struct ServiceError {
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: impl Display) -> Self {
        ServiceError {
            service,
            message: message.to_string(),
        }
    }
}

/// Error types for marketplace operations.
///
/// Declined payments are not errors; they are reported as [`Outcome`](crate::outcome::Outcome)
/// values by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("cannot {action} {entity} in state {from}")]
    InvalidStateTransition {
        entity: Entity,
        from: String,
        action: &'static str,
    },

    #[error("invalid {field}: {rule}")]
    ValidationFailed { field: &'static str, rule: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Error {
    pub(crate) fn validation(field: &'static str, rule: impl Display) -> Self {
        Error::ValidationFailed {
            field,
            rule: rule.to_string(),
        }
    }

    pub(crate) fn transition(entity: Entity, from: impl Display, action: &'static str) -> Self {
        Error::InvalidStateTransition {
            entity,
            from: from.to_string(),
            action,
        }
    }
}

/// A specialized `Result` type for marketplace operations.
pub type Result<T> = std::result::Result<T, Error>;
