//! Scan and mode endpoints
//!
//! - GET  /state     current session snapshot
//! - POST /mode      user mode selection
//! - POST /scan      scan with an identifier (QR payload, typed text)
//! - POST /scan/nfc  scan with an NFC tag UID as hex

use crate::identifier;
use crate::scanner::{ScanDisposition, SessionSnapshot};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use plamo_common::events::ScanMode;
use serde::{Deserialize, Serialize};

/// POST /mode request
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: ScanMode,
}

/// POST /scan request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub identifier: String,
}

/// POST /scan/nfc request
#[derive(Debug, Deserialize)]
pub struct NfcScanRequest {
    /// Tag UID as hex, with or without separators
    pub uid: String,
}

/// Scan response: what happened plus the session afterwards
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub identifier: String,
    pub disposition: ScanDisposition,
    pub state: SessionSnapshot,
}

/// GET /state
pub async fn get_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.scanner.snapshot().await)
}

/// POST /mode
///
/// STORE_STEP2_BAG is rejected with 400; it is entered by scanning a box.
/// Unknown modes and malformed bodies are 400 as well.
pub async fn select_mode(
    State(state): State<AppState>,
    payload: Result<Json<ModeRequest>, JsonRejection>,
) -> ApiResult<Json<SessionSnapshot>> {
    let Json(request) = payload?;
    let snapshot = state.scanner.select_mode(request.mode).await?;
    Ok(Json(snapshot))
}

/// POST /scan
///
/// Waits for the scan (including cooldown) to finish. A scan arriving while
/// another is processing answers immediately with `rejected`.
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<Json<ScanResponse>> {
    let Json(request) = payload?;
    let identifier = identifier::normalize_payload(&request.identifier)
        .ok_or_else(|| ApiError::BadRequest("identifier must not be blank".to_string()))?;
    run_scan(state, identifier).await
}

/// POST /scan/nfc
pub async fn scan_nfc(
    State(state): State<AppState>,
    payload: Result<Json<NfcScanRequest>, JsonRejection>,
) -> ApiResult<Json<ScanResponse>> {
    let Json(request) = payload?;
    let uid = identifier::parse_hex_uid(&request.uid)?;
    run_scan(state, identifier::from_nfc_uid(&uid)).await
}

/// Runs the scan on its own task so a disconnecting client cannot cancel it
async fn run_scan(state: AppState, identifier: String) -> ApiResult<Json<ScanResponse>> {
    let scanner = state.scanner.clone();
    let scan_identifier = identifier.clone();
    let disposition = tokio::spawn(async move { scanner.handle_scan(&scan_identifier).await })
        .await
        .map_err(|e| plamo_common::Error::Internal(format!("scan task failed: {}", e)))?;

    Ok(Json(ScanResponse {
        identifier,
        disposition,
        state: state.scanner.snapshot().await,
    }))
}

/// Build scan routes
pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/mode", post(select_mode))
        .route("/scan", post(scan))
        .route("/scan/nfc", post(scan_nfc))
}
