//! Error types for the accelerator core.
//!
//! Mirrors the abstract taxonomy: caller misuse, unsupported algorithms or
//! features, allocation failure, a retriable busy state, and hardware/PF-VF
//! faults. Per-op authentication failure is *not* a variant here — it is
//! delivered on the op's own status field by the response dispatcher, never
//! as an engine-level error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QatError>;

#[derive(Error, Debug)]
pub enum QatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {message}")]
    Invalid { message: String },

    #[error("unsupported: {message}")]
    Unsupported { message: String },

    #[error("out of memory: {message}")]
    NoMemory { message: String },

    #[error("busy: {message}")]
    Busy { message: String },

    #[error("device fault: {message}")]
    Fault { message: String },
}

impl QatError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported { message: message.into() }
    }

    pub fn no_memory(message: impl Into<String>) -> Self {
        Self::NoMemory { message: message.into() }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy { message: message.into() }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault { message: message.into() }
    }
}

/// Per-operation completion status, written by the response dispatcher.
///
/// Never propagated as `Result::Err` from `enqueue`/`dequeue` — a failed
/// authentication check on a dequeued op is reported here, and the burst
/// call itself still returns `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpStatus {
    #[default]
    NotProcessed,
    Success,
    AuthFailed,
    InvalidArgs,
    /// The op's session was built for a device generation newer than the
    /// queue pair it was submitted on.
    InvalidSession,
}
