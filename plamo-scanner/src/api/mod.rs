//! HTTP API handlers for plamo-scanner
//!
//! The GUI shell (or any other frontend) drives the scanner over HTTP and
//! renders what arrives on the SSE stream.

pub mod health;
pub mod scan;
pub mod sse;

pub use health::health_routes;
pub use scan::scan_routes;
pub use sse::event_stream;
