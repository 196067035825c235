//! # PlamoScanner Common Library
//!
//! Shared code for the PlamoScanner crates including:
//! - Error and result types
//! - TOML configuration loading and value resolution
//! - Tracing subscriber setup
//! - Scanner event types (ScannerEvent enum) and the EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod sse;

pub use error::{Error, Result};
