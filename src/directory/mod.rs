//! Node Directory Module
//!
//! Node name ⇄ node id resolution over the cluster KV namespace.

pub mod node_directory;

pub use node_directory::*;
