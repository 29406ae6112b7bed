//! 완결된 왕복 거래 (NormalizedTrade).
//!
//! 저장소에 전달되는 최종 산출물입니다. `id`는 구성 체결 식별자에서
//! 결정적으로 유도되어 재가져오기 시 upsert가 중복 없이 덮어씁니다.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{
    error::CoreError,
    execution::RawExecution,
    pnl::{gross_pnl, multiplier_for},
};

/// 승/패 판정 데드밴드. |pnl| ≤ 0.01 이면 breakeven.
pub const BREAKEVEN_DEADBAND: Decimal = dec!(0.01);

/// 진입 레그 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// 손익 부호. 롱 +1, 숏 -1.
    pub fn sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn is_long(self) -> bool {
        self == Self::Buy
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// 거래 결과 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
    Breakeven,
}

impl TradeResult {
    /// `pnl > 0.01 → win`, `pnl < -0.01 → loss`, 그 외 breakeven.
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > BREAKEVEN_DEADBAND {
            Self::Win
        } else if pnl < -BREAKEVEN_DEADBAND {
            Self::Loss
        } else {
            Self::Breakeven
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
            Self::Breakeven => write!(f, "breakeven"),
        }
    }
}

/// 완결된 왕복 거래.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTrade {
    /// 결정적 ID (재가져오기 시 동일)
    pub id: String,
    /// 브로커 계좌명
    pub account_id: String,
    /// 출처 플랫폼 (ninjatrader, tradovate)
    pub platform: String,
    pub instrument: String,
    /// 진입 레그 방향
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// 수수료 차감 후 순손익
    pub pnl: Decimal,
    /// 진입 + 청산 수수료/요금 합계
    pub commission: Decimal,
    pub result: TradeResult,
    pub currency: String,
    pub notes: String,
    /// 출처 보존용 메타데이터
    pub metadata: serde_json::Value,
}

impl NormalizedTrade {
    /// 청산 여부와 무관하게 보유 시간.
    pub fn holding_time(&self) -> chrono::Duration {
        self.exit_time - self.entry_time
    }
}

/// 진입만 기록된 포지션 (웹훅 진입 체결).
///
/// 같은 ID의 청산이 도착하면 [`NormalizedTrade`]로 대체됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub id: String,
    pub account_id: String,
    pub platform: String,
    pub instrument: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub entry_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub entry_time: DateTime<Utc>,
    pub notes: String,
    pub metadata: serde_json::Value,
}

/// 결과 분류 전의 거래 초안.
///
/// [`TradeDraft::into_trade`]가 시각 불변식을 검증하고
/// 데드밴드로 `result`를 채웁니다. 모든 생성 경로가 이 함수를 거칩니다.
#[derive(Debug, Clone)]
pub struct TradeDraft {
    pub id: String,
    pub account_id: String,
    pub platform: String,
    pub instrument: String,
    pub side: TradeSide,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pnl: Decimal,
    pub commission: Decimal,
    pub notes: String,
    pub metadata: serde_json::Value,
}

impl TradeDraft {
    /// 진입/청산 체결 한 쌍으로 초안을 만듭니다.
    ///
    /// 수량은 진입 레그 기준이며 순손익은 양쪽 레그 비용을 모두 차감합니다.
    pub fn from_round_trip(
        id: impl Into<String>,
        platform: impl Into<String>,
        entry: &RawExecution,
        exit: &RawExecution,
        side: TradeSide,
    ) -> Self {
        let multiplier = multiplier_for(&entry.instrument);
        let gross = gross_pnl(side, entry.price, exit.price, entry.quantity, multiplier);
        let commission = entry.costs() + exit.costs();

        let metadata = serde_json::json!({
            "entryExecution": entry.identity(),
            "exitExecution": exit.identity(),
            "entryAction": entry.action,
            "exitAction": exit.action,
            "orderId": entry.order_id,
            "orderType": entry.order_type,
            "multiplier": multiplier,
            "grossPnl": gross,
        });

        Self {
            id: id.into(),
            account_id: entry.account.clone(),
            platform: platform.into(),
            instrument: entry.instrument.clone(),
            side,
            entry_price: entry.price,
            exit_price: exit.price,
            quantity: entry.quantity,
            entry_time: entry.time,
            exit_time: exit.time,
            pnl: gross - commission,
            commission,
            notes: String::new(),
            metadata,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// # Errors
    ///
    /// `exit_time < entry_time` 이면 `CoreError::ExitBeforeEntry`.
    pub fn into_trade(self) -> Result<NormalizedTrade, CoreError> {
        if self.exit_time < self.entry_time {
            return Err(CoreError::ExitBeforeEntry {
                entry: self.entry_time,
                exit: self.exit_time,
            });
        }

        Ok(NormalizedTrade {
            result: TradeResult::from_pnl(self.pnl),
            id: self.id,
            account_id: self.account_id,
            platform: self.platform,
            instrument: self.instrument,
            side: self.side,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            quantity: self.quantity,
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            pnl: self.pnl,
            commission: self.commission,
            currency: "USD".to_string(),
            notes: self.notes,
            metadata: self.metadata,
        })
    }
}
