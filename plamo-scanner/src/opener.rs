//! Deep-link opening of record pages
//!
//! Opening a page in the store's own viewer belongs to whatever shell hosts
//! the scanner. [`CommandOpener`] hands the URL to an OS command;
//! [`EventOpener`] broadcasts it for a connected frontend.

use async_trait::async_trait;
use chrono::Utc;
use plamo_common::events::{EventBus, ScannerEvent};
use thiserror::Error;

/// Page opening errors
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No viewer connected")]
    NoViewer,
}

/// Opens a record URL in the store's viewer
#[async_trait]
pub trait PageOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// Runs `<program> <url>`, e.g. `xdg-open` or `open`
pub struct CommandOpener {
    program: String,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl PageOpener for CommandOpener {
    /// Returns once the program has started; its exit is only logged
    async fn open(&self, url: &str) -> Result<(), OpenError> {
        tracing::debug!(program = %self.program, url, "Opening page");

        let mut child = tokio::process::Command::new(&self.program)
            .arg(url)
            .spawn()
            .map_err(|source| OpenError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let program = self.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => tracing::warn!(%program, %status, "Page opener exited with failure"),
                Err(e) => tracing::warn!(%program, error = %e, "Failed to wait for page opener"),
            }
        });

        Ok(())
    }
}

/// Emits `OpenPageRequested` for subscribed frontends
///
/// Fails with [`OpenError::NoViewer`] when nobody is subscribed.
pub struct EventOpener {
    event_bus: EventBus,
}

impl EventOpener {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl PageOpener for EventOpener {
    async fn open(&self, url: &str) -> Result<(), OpenError> {
        self.event_bus
            .emit(ScannerEvent::OpenPageRequested {
                url: url.to_string(),
                timestamp: Utc::now(),
            })
            .map(|_| ())
            .map_err(|_| OpenError::NoViewer)
    }
}
