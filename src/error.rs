//! Error types for attachment and the runtime manager.

use thiserror::Error;

/// Failure reported by a control loop while attaching to the manager.
///
/// The aggregator returns the first of these unchanged.
#[derive(Debug, Error)]
pub enum AttachError {
    /// The manager refused to take the worker.
    #[error("manager rejected controller {controller}: {source}")]
    Rejected {
        controller: String,
        #[source]
        source: ManagerError,
    },

    /// The controller cannot run with the requested namespace scope.
    #[error("invalid namespace scope '{scope}': {reason}")]
    InvalidScope { scope: String, reason: String },

    /// A watch could not be set up.
    #[error("failed to set up watch for {kind}: {reason}")]
    WatchSetup { kind: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors returned by [`crate::runtime::Manager`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("worker {0} is already registered")]
    DuplicateWorker(String),

    #[error("manager already started, cannot add worker {0}")]
    AlreadyStarted(String),
}

impl ManagerError {
    /// Name of the worker the error refers to.
    pub fn worker(&self) -> &str {
        match self {
            ManagerError::DuplicateWorker(name) | ManagerError::AlreadyStarted(name) => name,
        }
    }
}

impl From<ManagerError> for AttachError {
    fn from(err: ManagerError) -> Self {
        AttachError::Rejected {
            controller: err.worker().to_string(),
            source: err,
        }
    }
}
