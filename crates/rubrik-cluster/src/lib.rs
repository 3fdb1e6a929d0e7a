//! Rubrik cluster management client.
//!
//! Provides the bootstrap payload models and an asynchronous client for the
//! cluster-level endpoints of the Rubrik CDM API: software version, node
//! addresses, first-time bootstrap and end-user lookups.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::ClusterClient;
pub use models::{
    AdminUserInfo, BootstrapConfig, BootstrapRequest, EndUserLookup, ManagementIpConfig, Node,
    NodeConfig, NodeList,
};

/// Convenient result alias that reuses the shared Rubrik error type.
pub type Result<T> = rubrik_core::Result<T>;
