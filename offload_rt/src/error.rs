//! Error kinds surfaced by the runtime. One variant per kind named in the
//! design: construction, start-denied, submit-failed, operation-failed,
//! invalid-state, unexpected.

use thiserror::Error;

/// Errors produced by the engine, context adapter, and task adapters.
///
/// Construction and submit failures are returned synchronously from the
/// call that caused them. Operation failures travel through a
/// [`crate::awaitable::ValueAwaitable`]'s `Err` path. Nothing here is ever
/// retried by the runtime itself.
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// Native `create`/setup failed before any task could be submitted.
    #[error("native construction failed: {message}")]
    Construction {
        native_code: i32,
        message: String,
    },

    /// A context refused to start (`starting -> idle` transition).
    #[error("context start denied: {message}")]
    StartDenied {
        native_code: i32,
        message: String,
    },

    /// The native library could not queue a task.
    #[error("task submission failed: {message}")]
    SubmitFailed {
        native_code: i32,
        message: String,
    },

    /// A task completed, but with a non-success native status.
    #[error("operation failed (native code {native_code}): {message}")]
    OperationFailed {
        native_code: i32,
        message: String,
    },

    /// A caller precondition was violated: start-on-running, stop-on-idle,
    /// re-awaiting a consumed awaitable, and so on.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Defensive: a completion callback fired on a slot lacking storage, or
    /// a spawned task panicked instead of returning a result.
    #[error("unexpected runtime error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Error::Construction { native_code, .. }
            | Error::StartDenied { native_code, .. }
            | Error::SubmitFailed { native_code, .. }
            | Error::OperationFailed { native_code, .. } => Some(*native_code),
            Error::InvalidState(_) | Error::Unexpected(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
