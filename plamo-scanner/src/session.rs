//! Scan session state machine
//!
//! Four modes: BAG_SCAN (initial), BOX_SCAN, STORE_STEP1_BOX, STORE_STEP2_BAG.
//! The first three are entered by user selection, which resets the display.
//! STORE_STEP2_BAG is entered only when step 1 picks a box, and is left for
//! BAG_SCAN when step 2 links a bag.

use chrono::{DateTime, Utc};
use plamo_common::events::ScanMode;
use plamo_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Status before the user has picked anything
pub const INITIAL_STATUS: &str = "Press a button to start scanning";
/// Status while a scan is being handled
pub const PROCESSING_STATUS: &str = "Processing...";
/// Identifier shown when nothing has been scanned
pub const NO_IDENTIFIER: &str = "-";

/// Box chosen in step 1 of store-in-box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSelection {
    /// Scan identifier of the box
    pub identifier: String,
    /// Notion page id of the box
    pub page_id: String,
}

/// Mode change record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeTransition {
    pub old_mode: ScanMode,
    pub new_mode: ScanMode,
    pub transitioned_at: DateTime<Utc>,
}

/// Mode, selection and the user-facing display fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanSession {
    /// Current scan mode
    pub mode: ScanMode,
    /// Last scanned identifier
    pub identifier: String,
    /// Result title (record name, "Error", "Done")
    pub title: String,
    /// Status prompt or result message
    pub status: String,
    /// Box picked in step 1, present only during the store-in-box flow
    pub selection: Option<BoxSelection>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            mode: ScanMode::BagScan,
            identifier: NO_IDENTIFIER.to_string(),
            title: String::new(),
            status: INITIAL_STATUS.to_string(),
            selection: None,
        }
    }

    /// User picks a mode
    ///
    /// Clears the identifier, title and selection and shows the mode's prompt.
    /// STORE_STEP2_BAG cannot be picked directly.
    pub fn select_mode(&mut self, mode: ScanMode) -> Result<ModeTransition> {
        if !mode.is_user_selectable() {
            return Err(Error::InvalidInput(format!(
                "{} is entered by scanning a box in {}",
                mode,
                ScanMode::StoreStep1Box
            )));
        }

        let transition = self.transition_to(mode);
        self.identifier = NO_IDENTIFIER.to_string();
        self.title.clear();
        self.status = mode.prompt().to_string();
        self.selection = None;
        Ok(transition)
    }

    /// A scan was accepted
    pub fn begin_scan(&mut self, identifier: &str) {
        self.identifier = identifier.to_string();
        self.status = PROCESSING_STATUS.to_string();
    }

    /// Show a handler result
    pub fn show_result(&mut self, title: impl Into<String>, status: impl Into<String>) {
        self.title = title.into();
        self.status = status.into();
    }

    /// Step 1 picked a box: remember it and wait for the bag
    pub fn enter_store_step2(
        &mut self,
        selection: BoxSelection,
        box_name: &str,
    ) -> ModeTransition {
        self.selection = Some(selection);
        self.status = format!("Box \"{}\" selected.\nNow scan a bag.", box_name);
        self.transition_to(ScanMode::StoreStep2Bag)
    }

    /// Step 2 linked a bag: drop the selection and go back to bag scanning
    ///
    /// The display keeps showing the completion message.
    pub fn finish_store(&mut self) -> ModeTransition {
        self.selection = None;
        self.transition_to(ScanMode::BagScan)
    }

    fn transition_to(&mut self, new_mode: ScanMode) -> ModeTransition {
        let transition = ModeTransition {
            old_mode: self.mode,
            new_mode,
            transitioned_at: Utc::now(),
        };
        self.mode = new_mode;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> BoxSelection {
        BoxSelection {
            identifier: "BOXID1".to_string(),
            page_id: "box-page".to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let session = ScanSession::new();
        assert_eq!(session.mode, ScanMode::BagScan);
        assert_eq!(session.identifier, NO_IDENTIFIER);
        assert_eq!(session.title, "");
        assert_eq!(session.status, INITIAL_STATUS);
        assert!(session.selection.is_none());
    }

    #[test]
    fn test_select_mode_resets_display() {
        let mut session = ScanSession::new();
        session.begin_scan("04:A1:B2:C3");
        session.show_result("Gundam", "Opened bag");

        let transition = session.select_mode(ScanMode::BoxScan).unwrap();

        assert_eq!(transition.old_mode, ScanMode::BagScan);
        assert_eq!(transition.new_mode, ScanMode::BoxScan);
        assert_eq!(session.identifier, NO_IDENTIFIER);
        assert_eq!(session.title, "");
        assert_eq!(session.status, "Scan a box");
    }

    #[test]
    fn test_step2_cannot_be_selected() {
        let mut session = ScanSession::new();
        let result = session.select_mode(ScanMode::StoreStep2Bag);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(session.mode, ScanMode::BagScan);
    }

    #[test]
    fn test_store_flow() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::StoreStep1Box).unwrap();
        assert_eq!(session.status, "[1/2] Scan a box");

        session.begin_scan("BOXID1");
        let transition = session.enter_store_step2(selection(), "Shelf A");
        assert_eq!(transition.old_mode, ScanMode::StoreStep1Box);
        assert_eq!(session.mode, ScanMode::StoreStep2Bag);
        assert_eq!(session.selection, Some(selection()));
        assert!(session.status.contains("Shelf A"));
        assert_eq!(session.identifier, "BOXID1");

        session.show_result("Done", "Bag linked to box!");
        let transition = session.finish_store();
        assert_eq!(transition.new_mode, ScanMode::BagScan);
        assert!(session.selection.is_none());
        assert_eq!(session.status, "Bag linked to box!");
    }

    #[test]
    fn test_mode_change_clears_selection() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::StoreStep1Box).unwrap();
        session.enter_store_step2(selection(), "Shelf A");

        session.select_mode(ScanMode::BagScan).unwrap();
        assert!(session.selection.is_none());
    }
}
