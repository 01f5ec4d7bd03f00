//! Domain layer - Port definitions
//!
//! This module defines the core traits (ports) that the config store and
//! KV adapters implement, following hexagonal architecture principles.

pub mod ports;

pub use ports::*;
