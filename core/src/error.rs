use thiserror::Error;

/// Misuse of the shared-exclusive lock protocol.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    #[error("read unlock without a held read lock")]
    NoReaders,
    #[error("write unlock without a held write lock")]
    NoWriter,
    #[error("write unlock called by a thread that is not the active writer")]
    NotOwner,
}

/// Misuse of the worker pool.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("work submitted after the pool was shut down")]
    ShutDown,
}
