//! NinjaTrader 웹훅 페이로드 → 거래 매핑.
//!
//! `exitPrice`가 있으면 청산 체결로 보고 완결된 거래를 만듭니다. 진입 체결은
//! 같은 ID(`ninja_{orderId}`)의 열린 포지션이 되며, 이후 청산이 도착하면
//! 완결된 거래가 그 자리를 대신합니다.
//!
//! 숫자 필드는 JSON 숫자와 문자열을 모두 받습니다. 손익은 보고된
//! `realizedPnL`/`pnl`에서 수수료를 뺀 값이며, 보고값이 없으면 가격 차이와
//! 계약 승수로 계산합니다.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use journal_core::{
    classify_action, fingerprint, gross_pnl, multiplier_for, EntryExit, NormalizedTrade,
    OpenPosition, TradeDraft,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::WebhookError,
    number::{parse_decimal, NumberLocale},
    time::{parse_timestamp, DateOrder},
};

/// 웹훅 처리 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum WebhookOutcome {
    /// 청산 체결로 완결된 거래 (저장 대상)
    Closed(NormalizedTrade),
    /// 진입 체결 (열린 포지션으로 저장)
    Opened(OpenPosition),
}

impl WebhookOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Closed(trade) => &trade.id,
            Self::Opened(position) => &position.id,
        }
    }
}

// =============================================================================
// 필드 접근
// =============================================================================

/// 첫 번째로 존재하는 비어 있지 않은 필드의 문자열 표현.
fn field_text(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// 숫자 필드. 존재하지만 숫자가 아니면 에러.
fn field_decimal(
    payload: &Value,
    keys: &[&'static str],
) -> Result<Option<Decimal>, WebhookError> {
    for &key in keys {
        let raw = match payload.get(key) {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Null) | None => continue,
            Some(Value::String(_)) => continue,
            Some(other) => {
                return Err(WebhookError::InvalidField {
                    field: key,
                    value: other.to_string(),
                })
            }
        };
        return parse_decimal(&raw, NumberLocale::Dot)
            .map(Some)
            .ok_or(WebhookError::InvalidField { field: key, value: raw });
    }
    Ok(None)
}

fn field_time(
    payload: &Value,
    keys: &[&'static str],
    tz: Tz,
) -> Result<Option<DateTime<Utc>>, WebhookError> {
    for &key in keys {
        if let Some(raw) = field_text(payload, &[key]) {
            return parse_timestamp(&raw, DateOrder::MonthFirst, tz)
                .map(Some)
                .ok_or(WebhookError::InvalidField { field: key, value: raw });
        }
    }
    Ok(None)
}

/// `apiKey`를 제거한 원본 페이로드.
fn redacted(payload: &Value) -> Value {
    let mut raw = payload.clone();
    if let Some(map) = raw.as_object_mut() {
        map.remove("apiKey");
    }
    raw
}

// =============================================================================
// 매핑
// =============================================================================

/// 웹훅 페이로드를 거래로 변환합니다.
///
/// `account_id`는 자격증명에 연결된 계좌(없으면 호출자가 정한 기본값)이며
/// `received_at`은 시각 필드가 없을 때 사용됩니다.
///
/// # Errors
///
/// - `MissingField`: `instrument`/`symbol`, `action`, 청산 시 `entryPrice`/`quantity`
/// - `InvalidField`: 숫자/시각 해석 실패, 0 이하 수량
/// - `Action`: 알 수 없는 액션, 진입보다 이른 청산
pub fn trade_from_webhook(
    payload: &Value,
    account_id: &str,
    received_at: DateTime<Utc>,
    tz: Tz,
) -> Result<WebhookOutcome, WebhookError> {
    let instrument = field_text(payload, &["instrument", "symbol"])
        .ok_or(WebhookError::MissingField("instrument"))?;
    let action = field_text(payload, &["action"]).ok_or(WebhookError::MissingField("action"))?;

    let exit_price = field_decimal(payload, &["exitPrice"])?.filter(|p| !p.is_zero());
    let marker = if exit_price.is_some() {
        EntryExit::Exit
    } else {
        EntryExit::Entry
    };
    let class = classify_action(&action, Some(marker))?;

    let entry_price = field_decimal(payload, &["entryPrice", "avgFillPrice"])?;
    let quantity = field_decimal(payload, &["quantity", "filledQuantity"])?;
    if let Some(q) = quantity.filter(|q| *q <= Decimal::ZERO) {
        return Err(WebhookError::InvalidField {
            field: "quantity",
            value: q.to_string(),
        });
    }
    let entry_time = field_time(payload, &["entryTime", "time"], tz)?.unwrap_or(received_at);

    let id = match field_text(payload, &["orderId"])
        .or_else(|| field_text(payload, &["executionId"]))
    {
        Some(key) => format!("ninja_{key}"),
        None => format!(
            "ninja_{}",
            fingerprint(&[
                account_id,
                &instrument,
                &action,
                &entry_time.to_rfc3339(),
                &entry_price.unwrap_or_default().normalize().to_string(),
                &quantity.unwrap_or_default().normalize().to_string(),
            ])
        ),
    };

    let side = class.position_side();
    let notes = field_text(payload, &["notes"])
        .unwrap_or_else(|| "Auto-imported from NinjaTrader".to_string());

    let Some(exit_price) = exit_price else {
        return Ok(WebhookOutcome::Opened(OpenPosition {
            id,
            account_id: account_id.to_string(),
            platform: "ninjatrader".to_string(),
            instrument,
            side,
            entry_price,
            quantity,
            entry_time,
            notes,
            metadata: serde_json::json!({
                "orderType": payload.get("orderType"),
                "timeInForce": payload.get("timeInForce"),
                "executionId": payload.get("executionId"),
                "orderId": payload.get("orderId"),
                "strategy": payload.get("strategy"),
                "raw": redacted(payload),
            }),
        }));
    };

    let entry_price = entry_price.ok_or(WebhookError::MissingField("entryPrice"))?;
    let quantity = quantity.ok_or(WebhookError::MissingField("quantity"))?;
    let exit_time = field_time(payload, &["exitTime"], tz)?.unwrap_or(received_at);
    let commission = field_decimal(payload, &["commission"])?
        .unwrap_or_default()
        .abs();

    let multiplier = multiplier_for(&instrument);
    let reported = field_decimal(payload, &["realizedPnL", "pnl"])?;
    let gross = reported
        .unwrap_or_else(|| gross_pnl(side, entry_price, exit_price, quantity, multiplier));

    let metadata = serde_json::json!({
        "orderType": payload.get("orderType"),
        "timeInForce": payload.get("timeInForce"),
        "executionId": payload.get("executionId"),
        "orderId": payload.get("orderId"),
        "strategy": payload.get("strategy"),
        "reportedPnl": reported,
        "multiplier": multiplier,
        "raw": redacted(payload),
    });

    let trade = TradeDraft {
        id,
        account_id: account_id.to_string(),
        platform: "ninjatrader".to_string(),
        instrument,
        side,
        entry_price,
        exit_price,
        quantity,
        entry_time,
        exit_time,
        pnl: gross - commission,
        commission,
        notes,
        metadata,
    }
    .into_trade()?;

    Ok(WebhookOutcome::Closed(trade))
}
