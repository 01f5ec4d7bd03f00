//! Distributed KV Adapters
//!
//! Provides [`KvStore`](crate::domain::ports::KvStore) implementations:
//! - Consul: HTTP KV API client used in production
//! - Memory: in-process store with the same prefix semantics

pub mod consul;
pub mod endpoint;
pub mod memory;

pub use consul::{ConsulConfig, ConsulConnector, ConsulKvStore};
pub use endpoint::ConsulEndpoint;
pub use memory::MemoryKvStore;
