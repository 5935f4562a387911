use crate::domain::balance::{Balance, ChargeResult};
use thiserror::Error;

/// Failure reported by a balance store adapter.
///
/// Adapters only describe what went wrong on their side; the gate decides
/// which phase of the call the failure belongs to (see [`GateError`]).
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "store-redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
    #[error("{0}")]
    Backend(String),
    #[error("unexpected close acknowledgement: {0}")]
    UnexpectedAck(String),
}

/// What a call had already written to the store when its connection failed
/// to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
    Nothing,
    Charge(ChargeResult),
    Reset(Balance),
}

#[derive(Error, Debug)]
pub enum GateError {
    #[error("failed to connect to balance store: {0}")]
    Connection(#[source] StoreError),
    #[error(transparent)]
    Store(StoreError),
    #[error("failed to release balance store connection: {source}")]
    Disconnect {
        committed: Committed,
        #[source]
        source: StoreError,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Returns the write that reached the store before the failure, if any.
    ///
    /// Only a disconnect failure can follow an acknowledged write; every other
    /// variant fails before the store confirms any mutation.
    pub fn committed(&self) -> Committed {
        match self {
            GateError::Disconnect { committed, .. } => *committed,
            _ => Committed::Nothing,
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
