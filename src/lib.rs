//! HA Config - Central configuration for cluster HA services
//!
//! A single access point for an HA service's configuration: file-backed
//! settings (YAML/JSON) and node identity held in the cluster's Consul KV
//! namespace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Config Registry                              │
//! │  ┌──────────────────────┐  ┌──────────────────┐  ┌──────────────────┐   │
//! │  │   Load-once gate     │  │  Typed getters   │  │ Directory client │   │
//! │  │   (loaded indices)   │  │ version/node/env │  │  (built lazily)  │   │
//! │  └──────────┬───────────┘  └────────┬─────────┘  └────────┬─────────┘   │
//! │             │                       │                     │             │
//! │  ┌──────────┴───────────────────────┴───────┐  ┌──────────┴─────────┐   │
//! │  │        Key-path store (YAML / JSON)      │  │   Node Directory   │   │
//! │  └──────────────────────────────────────────┘  │  name ⇄ node id    │   │
//! │                                                └──────────┬─────────┘   │
//! ├───────────────────────────────────────────────────────────┼─────────────┤
//! │                                                 Consul KV (HTTP)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ha_config::{ConfigRegistry, InitOptions, NodeDirectory, RegistryConfig};
//!
//! let registry = ConfigRegistry::new(RegistryConfig::default());
//! let _guard = registry.init(&InitOptions::new("cluster_manager"))?;
//!
//! let directory = NodeDirectory::new(registry.clone());
//! let node_id = directory.resolve_node_id(&registry.local_node()?).await?;
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Load-once config registry and typed getters
//! - [`directory`]: Node name/id resolution
//! - [`confstore`]: File-backed key-path config store
//! - [`kv`]: Consul and in-memory KV adapters
//! - [`logging`]: Service logging setup
//! - [`domain`]: Port traits
//! - [`error`]: Error types and handling

pub mod confstore;
pub mod consts;
pub mod directory;
pub mod domain;
pub mod error;
pub mod kv;
pub mod logging;
pub mod registry;

// Re-export commonly used types
pub use confstore::{FileConfStore, SourceFormat, SourceUrl};

pub use directory::NodeDirectory;

pub use domain::ports::{ConfStore, KvClientParams, KvConnector, KvEntries, KvStore, NodeIdentity};

pub use error::{Error, Result};

pub use kv::{ConsulConfig, ConsulConnector, ConsulEndpoint, ConsulKvStore, MemoryKvStore};

pub use logging::{init_logging, LogOptions, LoggingGuard};

pub use registry::{ConfigRegistry, InitOptions, RegistryConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
