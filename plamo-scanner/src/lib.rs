//! plamo-scanner library interface
//!
//! Scan identifiers (NFC tag UIDs, QR payloads) are synced against two Notion
//! databases, bags and boxes. A scan finds or creates the matching record and
//! opens it; the two-step store-in-box flow links a bag to a box.
//!
//! Exposes public APIs for integration testing.

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod identifier;
pub mod notion;
pub mod opener;
pub mod scanner;
pub mod session;

pub use crate::error::{ApiError, ApiResult};
pub use crate::scanner::{ScanDisposition, ScanOutcome, Scanner, ScannerSettings};

use axum::Router;
use chrono::{DateTime, Utc};
use plamo_common::events::EventBus;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Scan dispatcher owning the session
    pub scanner: Scanner,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(scanner: Scanner, event_bus: EventBus) -> Self {
        Self {
            scanner,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::scan_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
