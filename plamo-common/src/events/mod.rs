//! Event types for the PlamoScanner event system
//!
//! Provides shared event definitions and the EventBus. A frontend (the GUI
//! shell, a terminal, a test) subscribes to the bus and renders what it needs:
//! flash/sound on `ScanAccepted`, text on `DisplayUpdated`, navigation on
//! `OpenPageRequested`, a transient notification on `Toast`.

mod mode_types;

pub use mode_types::ScanMode;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Scanner event types
///
/// Events are broadcast via EventBus and serialized as-is for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ScannerEvent {
    /// A scan passed the lock and is being processed
    ///
    /// Triggers:
    /// - Frontend: flash + shutter sound
    ScanAccepted {
        /// Normalized scan identifier
        identifier: String,
        /// Mode the scan will be dispatched under
        mode: ScanMode,
        timestamp: DateTime<Utc>,
    },

    /// A scan arrived while the lock was held and was dropped
    ScanRejected {
        identifier: String,
        timestamp: DateTime<Utc>,
    },

    /// The mode handler for a scan finished (lock still held for cooldown)
    ScanCompleted {
        identifier: String,
        /// False when the handler hit a remote failure
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Scan mode changed, by user selection or by the store-in-box flow
    ModeChanged {
        old_mode: ScanMode,
        new_mode: ScanMode,
        timestamp: DateTime<Utc>,
    },

    /// User-facing display fields changed
    ///
    /// Triggers:
    /// - Frontend: redraw mode buttons, identifier, title and status text
    DisplayUpdated {
        mode: ScanMode,
        /// Last scanned identifier, "-" when cleared
        identifier: String,
        /// Record name, "Error" or "Done"
        title: String,
        /// Status prompt or result message
        status: String,
        timestamp: DateTime<Utc>,
    },

    /// A record page should be shown in the store's own viewer
    OpenPageRequested {
        url: String,
        timestamp: DateTime<Utc>,
    },

    /// Transient user notification (e.g. the viewer could not be opened)
    Toast {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ScannerEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ScannerEvent::ScanAccepted { .. } => "ScanAccepted",
            ScannerEvent::ScanRejected { .. } => "ScanRejected",
            ScannerEvent::ScanCompleted { .. } => "ScanCompleted",
            ScannerEvent::ModeChanged { .. } => "ModeChanged",
            ScannerEvent::DisplayUpdated { .. } => "DisplayUpdated",
            ScannerEvent::OpenPageRequested { .. } => "OpenPageRequested",
            ScannerEvent::Toast { .. } => "Toast",
        }
    }
}

/// Central event distribution bus
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScannerEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers start
    ///   missing old events
    ///
    /// # Examples
    ///
    /// ```
    /// use plamo_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ScannerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ScannerEvent,
    ) -> Result<usize, broadcast::error::SendError<ScannerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ScannerEvent) {
        let _ = self.tx.send(event);
    }
}
