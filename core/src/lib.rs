//! Concurrent inverted index: the data structure, its lock, the worker pool
//! that fills it, and ranked search over it.

pub mod builder;
pub mod error;
pub mod files;
pub mod index;
pub mod json;
pub mod lock;
pub mod pool;
pub mod query;
pub mod safe_index;
pub mod search;
pub mod tokenizer;

pub use error::{LockError, PoolError};
pub use index::InvertedIndex;
pub use lock::SharedExclusiveLock;
pub use pool::{Spawner, WorkerPool, DEFAULT_THREADS};
pub use safe_index::ThreadSafeIndex;
pub use search::SearchResult;
