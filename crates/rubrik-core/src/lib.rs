//! # rubrik-core
//!
//! Core types and utilities for working with the Rubrik CDM REST API.
//!
//! This crate provides the shared error type, client configuration and the
//! HTTP transport that the resource clients delegate to.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`types`] - API versions and object types understood by the appliance
//! - [`config`] - Connection configuration for a Rubrik cluster
//! - [`client`] - HTTP client settings and default timeouts
//! - [`query`] - Query parameter builder
//! - [`transport`] - The [`ApiTransport`] seam and its reqwest implementation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::RubrikClientConfig;
pub use error::{Error, Result};
pub use transport::{ApiTransport, HttpTransport};
pub use types::{ApiVersion, ObjectType};
