//! Line-oriented console frontend
//!
//! For keyboard-wedge barcode/NFC readers and manual use: every input line is
//! a scan, except
//! - `:bag`, `:box`, `:store` select a mode
//! - `:nfc <hex uid>` scans an NFC UID given as hex
//!
//! Each scan runs on its own task, so lines arriving while a scan is being
//! processed are dropped by the scan lock just like repeated tag reads.

use crate::identifier;
use crate::scanner::Scanner;
use plamo_common::events::{EventBus, ScanMode, ScannerEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    SelectMode(ScanMode),
    Scan(String),
}

/// Parse an input line; blank lines yield None
pub fn parse_line(line: &str) -> plamo_common::Result<Option<ConsoleCommand>> {
    let trimmed = line.trim();

    let command = match trimmed {
        "" => return Ok(None),
        ":bag" => ConsoleCommand::SelectMode(ScanMode::BagScan),
        ":box" => ConsoleCommand::SelectMode(ScanMode::BoxScan),
        ":store" => ConsoleCommand::SelectMode(ScanMode::StoreStep1Box),
        _ => match trimmed.strip_prefix(":nfc") {
            Some(uid) => {
                let bytes = identifier::parse_hex_uid(uid.trim())?;
                ConsoleCommand::Scan(identifier::from_nfc_uid(&bytes))
            }
            None => ConsoleCommand::Scan(trimmed.to_string()),
        },
    };

    Ok(Some(command))
}

/// Read commands until end of input
pub async fn run_console<R>(scanner: Scanner, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(ConsoleCommand::SelectMode(mode))) => {
                if let Err(e) = scanner.select_mode(mode).await {
                    warn!("Mode selection failed: {}", e);
                }
            }
            Ok(Some(ConsoleCommand::Scan(identifier))) => {
                let scanner = scanner.clone();
                tokio::spawn(async move {
                    scanner.handle_scan(&identifier).await;
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring input line: {}", e),
        }
    }

    Ok(())
}

/// Print display changes, page open requests and notifications to stdout
pub fn spawn_display_printer(event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{}", text);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Console display skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Console text for an event, if it is shown at all
pub fn render_event(event: &ScannerEvent) -> Option<String> {
    match event {
        ScannerEvent::DisplayUpdated {
            mode,
            identifier,
            title,
            status,
            ..
        } => {
            let status = status.replace('\n', " ");
            if title.is_empty() {
                Some(format!("[{}] ID: {} | {}", mode, identifier, status))
            } else {
                Some(format!("[{}] ID: {} | {} | {}", mode, identifier, title, status))
            }
        }
        ScannerEvent::OpenPageRequested { url, .. } => Some(format!("open {}", url)),
        ScannerEvent::Toast { message, .. } => Some(format!("! {}", message)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_mode_commands() {
        assert_eq!(
            parse_line(":bag").unwrap(),
            Some(ConsoleCommand::SelectMode(ScanMode::BagScan))
        );
        assert_eq!(
            parse_line(" :box ").unwrap(),
            Some(ConsoleCommand::SelectMode(ScanMode::BoxScan))
        );
        assert_eq!(
            parse_line(":store").unwrap(),
            Some(ConsoleCommand::SelectMode(ScanMode::StoreStep1Box))
        );
    }

    #[test]
    fn test_parse_scans() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(
            parse_line("BOXID1\r").unwrap(),
            Some(ConsoleCommand::Scan("BOXID1".to_string()))
        );
        assert_eq!(
            parse_line(":nfc 04a1b2c3").unwrap(),
            Some(ConsoleCommand::Scan("04:A1:B2:C3".to_string()))
        );
        assert!(parse_line(":nfc xyz").is_err());
    }

    #[test]
    fn test_render_event() {
        let text = render_event(&ScannerEvent::DisplayUpdated {
            mode: ScanMode::StoreStep2Bag,
            identifier: "BOXID1".to_string(),
            title: String::new(),
            status: "Box \"Shelf A\" selected.\nNow scan a bag.".to_string(),
            timestamp: Utc::now(),
        })
        .unwrap();
        assert_eq!(
            text,
            "[STORE_STEP2_BAG] ID: BOXID1 | Box \"Shelf A\" selected. Now scan a bag."
        );

        assert!(render_event(&ScannerEvent::ScanRejected {
            identifier: "x".to_string(),
            timestamp: Utc::now(),
        })
        .is_none());
    }
}
