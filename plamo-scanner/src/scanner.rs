//! Scan dispatcher
//!
//! Every scan goes through [`Scanner::handle_scan`]:
//! 1. dropped if the lock is held (a scan is in flight or cooling down)
//! 2. lock taken, `ScanAccepted` emitted, identifier shown, status "Processing..."
//! 3. after `scan_delay`, dispatched to the handler for the current mode
//! 4. after `cooldown`, lock released whatever the outcome
//!
//! Remote failures end the scan with an "Error" display; nothing is retried.

use crate::notion::{NotionError, NotionRepository, Page};
use crate::opener::PageOpener;
use crate::session::{BoxSelection, ScanSession};
use chrono::Utc;
use plamo_common::events::{EventBus, ScanMode, ScannerEvent};
use plamo_common::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Title shown when a handler fails
pub const ERROR_TITLE: &str = "Error";
/// Title shown when a bag was linked to a box
pub const DONE_TITLE: &str = "Done";
/// Status shown when a bag was linked to a box
pub const LINKED_STATUS: &str = "Bag linked to box!";
/// Status shown after opening a bag
pub const BAG_OPENED_STATUS: &str = "Opened bag";
/// Status shown after opening a box
pub const BOX_OPENED_STATUS: &str = "Opened box";
/// Notification when the viewer could not be opened
pub const OPEN_FAILED_TOAST: &str = "Could not open Notion page";

/// One database and the properties used to look records up in it
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    pub database_id: String,
    /// Title property holding the scan identifier
    pub key_property: String,
    /// Rich text property holding the display name
    pub name_property: String,
    /// Name given to records created by a scan
    pub default_name: String,
}

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSettings {
    pub bags: CollectionSchema,
    pub boxes: CollectionSchema,
    /// Delay between accepting a scan and dispatching it
    pub scan_delay: Duration,
    /// Lock hold time after the handler finishes
    pub cooldown: Duration,
}

/// What happened to a submitted scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDisposition {
    /// Dropped: the lock was held
    Rejected,
    /// Handled under the mode current at dispatch time
    Completed(ScanOutcome),
}

/// Handler result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Succeeded,
    /// Remote failure, shown as an error
    Failed,
    /// Store step 2 without a selected box; nothing was done
    Skipped,
}

/// Session state plus the lock flag, as reported to frontends
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub session: ScanSession,
    pub locked: bool,
}

/// Releases the scan lock when dropped
struct ScanLock<'a>(&'a AtomicBool);

impl<'a> ScanLock<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ScanLock<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Scan dispatcher and owner of the session state
///
/// Cloning shares the same session and lock.
#[derive(Clone)]
pub struct Scanner {
    repository: NotionRepository,
    opener: Arc<dyn PageOpener>,
    event_bus: EventBus,
    settings: Arc<ScannerSettings>,
    session: Arc<RwLock<ScanSession>>,
    lock: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(
        repository: NotionRepository,
        opener: Arc<dyn PageOpener>,
        event_bus: EventBus,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            repository,
            opener,
            event_bus,
            settings: Arc::new(settings),
            session: Arc::new(RwLock::new(ScanSession::new())),
            lock: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a scan is in flight or cooling down
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.read().await.clone(),
            locked: self.is_locked(),
        }
    }

    /// User picks a mode (BAG_SCAN, BOX_SCAN or STORE_STEP1_BOX)
    pub async fn select_mode(&self, mode: ScanMode) -> Result<SessionSnapshot> {
        let transition = {
            let mut session = self.session.write().await;
            let transition = session.select_mode(mode)?;
            self.publish_display(&session);
            transition
        };

        info!(old_mode = %transition.old_mode, new_mode = %transition.new_mode, "Mode selected");
        self.event_bus.emit_lossy(ScannerEvent::ModeChanged {
            old_mode: transition.old_mode,
            new_mode: transition.new_mode,
            timestamp: transition.transitioned_at,
        });

        Ok(self.snapshot().await)
    }

    /// Process one scan identifier
    pub async fn handle_scan(&self, identifier: &str) -> ScanDisposition {
        let Some(_lock) = ScanLock::try_acquire(&self.lock) else {
            debug!(identifier, "Scan dropped: previous scan still processing");
            self.event_bus.emit_lossy(ScannerEvent::ScanRejected {
                identifier: identifier.to_string(),
                timestamp: Utc::now(),
            });
            return ScanDisposition::Rejected;
        };

        let accepted_mode = {
            let mut session = self.session.write().await;
            session.begin_scan(identifier);
            self.publish_display(&session);
            session.mode
        };
        self.event_bus.emit_lossy(ScannerEvent::ScanAccepted {
            identifier: identifier.to_string(),
            mode: accepted_mode,
            timestamp: Utc::now(),
        });

        tokio::time::sleep(self.settings.scan_delay).await;

        let mode = self.session.read().await.mode;
        info!(identifier, mode = %mode, "Dispatching scan");

        let outcome = match mode {
            ScanMode::BagScan => {
                self.open_record(&self.settings.bags, identifier, BAG_OPENED_STATUS)
                    .await
            }
            ScanMode::BoxScan => {
                self.open_record(&self.settings.boxes, identifier, BOX_OPENED_STATUS)
                    .await
            }
            ScanMode::StoreStep1Box => self.select_box(identifier).await,
            ScanMode::StoreStep2Bag => self.store_bag(identifier).await,
        };

        self.event_bus.emit_lossy(ScannerEvent::ScanCompleted {
            identifier: identifier.to_string(),
            success: outcome == ScanOutcome::Succeeded,
            timestamp: Utc::now(),
        });

        tokio::time::sleep(self.settings.cooldown).await;
        ScanDisposition::Completed(outcome)
    }

    /// BAG_SCAN / BOX_SCAN: find-or-create, open, show the record name
    async fn open_record(
        &self,
        collection: &CollectionSchema,
        identifier: &str,
        opened_status: &str,
    ) -> ScanOutcome {
        match self.find_or_create(collection, identifier).await {
            Ok(page) => {
                self.open_page(&page.url).await;
                let title = page
                    .text_value(&collection.name_property)
                    .unwrap_or(identifier)
                    .to_string();
                self.show_result(title, opened_status).await;
                ScanOutcome::Succeeded
            }
            Err(e) => self.fail(identifier, e).await,
        }
    }

    /// STORE_STEP1_BOX: find-or-create the box and move on to step 2
    async fn select_box(&self, identifier: &str) -> ScanOutcome {
        let boxes = &self.settings.boxes;
        let page = match self.find_or_create(boxes, identifier).await {
            Ok(page) => page,
            Err(e) => return self.fail(identifier, e).await,
        };

        let box_name = page.text_value(&boxes.name_property).unwrap_or(identifier);
        let selection = BoxSelection {
            identifier: identifier.to_string(),
            page_id: page.id.clone(),
        };

        let transition = {
            let mut session = self.session.write().await;
            let transition = session.enter_store_step2(selection, box_name);
            self.publish_display(&session);
            transition
        };

        info!(identifier, page_id = %page.id, box_name, "Box selected for storing");
        self.event_bus.emit_lossy(ScannerEvent::ModeChanged {
            old_mode: transition.old_mode,
            new_mode: transition.new_mode,
            timestamp: transition.transitioned_at,
        });
        ScanOutcome::Succeeded
    }

    /// STORE_STEP2_BAG: find-or-create the bag, link it to the selected box,
    /// open the box, return to BAG_SCAN
    ///
    /// On failure the mode and selection stay, so the bag can be scanned again.
    async fn store_bag(&self, identifier: &str) -> ScanOutcome {
        let selection = self.session.read().await.selection.clone();
        let Some(selection) = selection else {
            warn!(identifier, "Bag scanned for storing but no box is selected");
            return ScanOutcome::Skipped;
        };

        match self.link_bag(identifier, &selection).await {
            Ok(box_page) => {
                if let Some(page) = box_page {
                    self.open_page(&page.url).await;
                }

                let transition = {
                    let mut session = self.session.write().await;
                    let transition = session.finish_store();
                    self.publish_display(&session);
                    transition
                };
                self.event_bus.emit_lossy(ScannerEvent::ModeChanged {
                    old_mode: transition.old_mode,
                    new_mode: transition.new_mode,
                    timestamp: transition.transitioned_at,
                });
                ScanOutcome::Succeeded
            }
            Err(e) => self.fail(identifier, e).await,
        }
    }

    /// Link the bag, show completion, then re-fetch the box for opening
    async fn link_bag(
        &self,
        identifier: &str,
        selection: &BoxSelection,
    ) -> std::result::Result<Option<Page>, NotionError> {
        let bag = self.find_or_create(&self.settings.bags, identifier).await?;
        self.repository
            .update_relation(&bag.id, &selection.page_id)
            .await?;
        info!(
            bag = identifier,
            bag_page_id = %bag.id,
            box_identifier = %selection.identifier,
            "Bag stored in box"
        );
        self.show_result(DONE_TITLE, LINKED_STATUS).await;

        let boxes = &self.settings.boxes;
        self.repository
            .get_by_key(&boxes.database_id, &boxes.key_property, &selection.identifier)
            .await
    }

    async fn find_or_create(
        &self,
        collection: &CollectionSchema,
        identifier: &str,
    ) -> std::result::Result<Page, NotionError> {
        self.repository
            .find_or_create(
                &collection.database_id,
                &collection.key_property,
                identifier,
                &collection.name_property,
                &collection.default_name,
            )
            .await
    }

    /// Open a page; failure is reported as a toast and does not fail the scan
    async fn open_page(&self, url: &str) {
        if let Err(e) = self.opener.open(url).await {
            warn!(url, error = %e, "Failed to open page");
            self.event_bus.emit_lossy(ScannerEvent::Toast {
                message: OPEN_FAILED_TOAST.to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    async fn fail(&self, identifier: &str, error: NotionError) -> ScanOutcome {
        warn!(identifier, error = %error, "Scan failed");
        self.show_result(ERROR_TITLE, error.to_string()).await;
        ScanOutcome::Failed
    }

    async fn show_result(&self, title: impl Into<String>, status: impl Into<String>) {
        let mut session = self.session.write().await;
        session.show_result(title, status);
        self.publish_display(&session);
    }

    fn publish_display(&self, session: &ScanSession) {
        self.event_bus.emit_lossy(ScannerEvent::DisplayUpdated {
            mode: session.mode,
            identifier: session.identifier.clone(),
            title: session.title.clone(),
            status: session.status.clone(),
            timestamp: Utc::now(),
        });
    }
}
