//! NinjaTrader 웹훅.
//!
//! API 키(`X-API-Key` 헤더 또는 본문 `apiKey`)로 사용자를 찾고, 청산 체결이면
//! 완결된 거래를 저장한 뒤 같은 ID의 열린 포지션을 닫습니다. 진입 체결은
//! 열린 포지션으로 저장됩니다.
//!
//! 자격증명 저장소 장애는 인증 실패(401)가 아니라 500으로 응답합니다.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use journal_import::{trade_from_webhook, WebhookOutcome};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{header_value, parse_json};
use crate::{error::ApiError, state::AppState};

/// 자격증명에 계좌가 없고 페이로드에도 없을 때의 계좌명
const DEFAULT_ACCOUNT: &str = "NinjaTrader";

#[derive(Debug, Serialize)]
pub struct WebhookTradeSummary {
    pub id: String,
    pub instrument: String,
    #[serde(rename = "type")]
    pub side: String,
    pub pnl: Option<rust_decimal::Decimal>,
    /// win / loss / breakeven, 진입 체결이면 open
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub data: WebhookTradeSummary,
}

/// `POST /api/proxy-ninjatrader`
pub async fn ninjatrader_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let payload: Value = parse_json(&body)?;

    let api_key = header_value(&headers, "x-api-key")
        .map(str::to_string)
        .or_else(|| {
            payload
                .get("apiKey")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        })
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "API key required: send X-API-Key header or apiKey in the body".to_string(),
            )
        })?;

    let credential = match state
        .webhook_credentials
        .find_webhook_credential(&api_key)
        .await
    {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            warn!("알 수 없거나 비활성화된 웹훅 API 키");
            return Err(ApiError::Unauthorized(
                "invalid or inactive API key".to_string(),
            ));
        }
        Err(e) => {
            error!(error = %e, "웹훅 자격증명 조회 실패");
            return Err(ApiError::Internal(
                "failed to verify API key".to_string(),
            ));
        }
    };

    let account = credential
        .account_id
        .clone()
        .or_else(|| {
            payload
                .get("account")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string());

    let outcome = trade_from_webhook(
        &payload,
        &account,
        Utc::now(),
        state.reconciler.options().timezone,
    )?;

    let response = match outcome {
        WebhookOutcome::Closed(trade) => {
            state
                .trades
                .upsert_trade(&credential.user_id, &trade)
                .await?;
            let closed_position = state
                .trades
                .close_open_position(&credential.user_id, &trade.id)
                .await?;

            info!(
                trade_id = %trade.id,
                instrument = %trade.instrument,
                side = %trade.side,
                pnl = %trade.pnl,
                closed_position,
                "NinjaTrader 거래 저장"
            );

            WebhookResponse {
                success: true,
                message: "Trade saved".to_string(),
                data: WebhookTradeSummary {
                    id: trade.id,
                    instrument: trade.instrument,
                    side: trade.side.to_string(),
                    pnl: Some(trade.pnl),
                    result: trade.result.to_string(),
                },
            }
        }
        WebhookOutcome::Opened(position) => {
            state
                .trades
                .upsert_open_position(&credential.user_id, &position)
                .await?;

            info!(
                id = %position.id,
                instrument = %position.instrument,
                side = %position.side,
                "NinjaTrader 열린 포지션 저장"
            );

            WebhookResponse {
                success: true,
                message: "Open position saved".to_string(),
                data: WebhookTradeSummary {
                    id: position.id,
                    instrument: position.instrument,
                    side: position.side.to_string(),
                    pnl: None,
                    result: "open".to_string(),
                },
            }
        }
    };

    Ok(Json(response))
}
