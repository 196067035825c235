//! Scan mode shared between the dispatcher and event consumers

use serde::{Deserialize, Serialize};

/// What a scan does in the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanMode {
    /// Find-or-create a bag and open it
    #[default]
    BagScan,
    /// Find-or-create a box and open it
    BoxScan,
    /// Store in box, step 1: pick the box
    #[serde(rename = "STORE_STEP1_BOX")]
    StoreStep1Box,
    /// Store in box, step 2: scan the bag to link (entered only from step 1)
    #[serde(rename = "STORE_STEP2_BAG")]
    StoreStep2Bag,
}

impl ScanMode {
    /// Status prompt shown when the mode is entered
    pub fn prompt(&self) -> &'static str {
        match self {
            ScanMode::BagScan => "Scan a bag",
            ScanMode::BoxScan => "Scan a box",
            ScanMode::StoreStep1Box => "[1/2] Scan a box",
            ScanMode::StoreStep2Bag => "[2/2] Scan a bag",
        }
    }

    /// Whether a user may select this mode directly
    pub fn is_user_selectable(&self) -> bool {
        !matches!(self, ScanMode::StoreStep2Bag)
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScanMode::BagScan => "BAG_SCAN",
            ScanMode::BoxScan => "BOX_SCAN",
            ScanMode::StoreStep1Box => "STORE_STEP1_BOX",
            ScanMode::StoreStep2Bag => "STORE_STEP2_BAG",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        for mode in [
            ScanMode::BagScan,
            ScanMode::BoxScan,
            ScanMode::StoreStep1Box,
            ScanMode::StoreStep2Bag,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
            let back: ScanMode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_step2_not_user_selectable() {
        assert!(ScanMode::BagScan.is_user_selectable());
        assert!(ScanMode::StoreStep1Box.is_user_selectable());
        assert!(!ScanMode::StoreStep2Bag.is_user_selectable());
    }

    #[test]
    fn test_default_is_bag_scan() {
        assert_eq!(ScanMode::default(), ScanMode::BagScan);
    }
}
