//! Common types and utilities for the Atlas provider crates.

pub mod config;
pub mod error;
pub mod model;
pub mod resource;

pub use ::anyhow;
pub use ::serde;
pub use ::serde_json;
pub use ::time;
pub use ::tokio;
pub use ::tracing;
pub use ::tracing_subscriber;
