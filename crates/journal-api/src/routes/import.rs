//! 브로커 내보내기 가져오기.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use journal_import::{import_reconciled, ImportFormat, ImportReport, ReconcileOutput};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{header_value, parse_json};
use crate::{error::ApiError, state::AppState};

/// 가져오기 요청 본문.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportRequest {
    /// CSV/XML 원문
    pub content: String,
    /// 소유자 ID (없으면 `X-User-Id` 헤더)
    pub owner: Option<String>,
    /// 지정하면 포맷 판별을 건너뜀
    pub format: Option<ImportFormat>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub data: ReconcileOutput,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub report: ImportReport,
    pub data: ReconcileOutput,
}

fn reconcile(state: &AppState, request: &ImportRequest) -> Result<ReconcileOutput, ApiError> {
    let output = match request.format {
        Some(format) => state
            .reconciler
            .reconcile_with_format(&request.content, format)?,
        None => state.reconciler.reconcile(&request.content)?,
    };
    Ok(output)
}

/// `POST /api/import/preview`
pub async fn preview_import(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PreviewResponse>, ApiError> {
    let request: ImportRequest = parse_json(&body)?;
    let output = reconcile(&state, &request)?;

    Ok(Json(PreviewResponse {
        success: true,
        data: output,
    }))
}

/// `POST /api/import`
///
/// 리컨실 후 계좌를 확인/생성하고 거래를 하나씩 upsert합니다.
/// 개별 실패는 `report.errors`로 보고되며 요청 자체는 성공합니다.
pub async fn import_trades(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    let request: ImportRequest = parse_json(&body)?;

    let owner = request
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .or_else(|| header_value(&headers, "x-user-id"))
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("missing owner".to_string()))?;

    let output = reconcile(&state, &request)?;
    let report = import_reconciled(state.trades.as_ref(), &owner, &output.trades).await;

    info!(
        owner = %owner,
        format = %output.format,
        imported = report.imported,
        total = report.total,
        accounts = report.accounts,
        "가져오기 요청 처리"
    );

    Ok(Json(ImportResponse {
        success: true,
        message: report.summary(),
        report,
        data: output,
    }))
}
