//! 저장소 추상화.
//!
//! 리컨실러는 저장소를 직접 호출하지 않습니다. 가져오기/웹훅 경로가
//! 호출마다 핸들을 명시적으로 전달받습니다.
//!
//! # 계약
//!
//! - 거래: `(owner, id)` 기준 upsert. 같은 ID 재기록은 덮어쓰기.
//! - 열린 포지션: `(owner, id)` 기준 upsert. 같은 ID의 거래가 완결되면 삭제.
//! - 계좌: `(owner, name)` 기준 upsert. 충돌 시 platform/currency만 갱신하고
//!   잔고는 최초 기록값을 유지.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    trade::{NormalizedTrade, OpenPosition},
};

// =============================================================================
// 레코드 타입
// =============================================================================

/// 가져오기에서 감지된 브로커 계좌.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub name: String,
    pub platform: String,
    pub currency: String,
    /// 최초 생성 시 잔고 (가져온 거래 순손익 합계)
    pub balance: Decimal,
}

/// 웹훅 API 키 조회 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookCredential {
    pub user_id: String,
    /// 키에 연결된 계좌 (없으면 페이로드의 계좌 사용)
    pub account_id: Option<String>,
}

// =============================================================================
// Traits
// =============================================================================

/// 거래/계좌 영속성.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn upsert_trade(&self, owner: &str, trade: &NormalizedTrade) -> Result<(), StoreError>;

    async fn upsert_account(&self, owner: &str, account: &AccountRecord) -> Result<(), StoreError>;

    async fn upsert_open_position(
        &self,
        owner: &str,
        position: &OpenPosition,
    ) -> Result<(), StoreError>;

    /// 열린 포지션 삭제. 삭제된 것이 있으면 `true`.
    async fn close_open_position(&self, owner: &str, id: &str) -> Result<bool, StoreError>;
}

/// NinjaTrader 웹훅 API 키 조회 (platform = ninjatrader, 활성 키만).
#[async_trait]
pub trait WebhookCredentialStore: Send + Sync {
    async fn find_webhook_credential(
        &self,
        api_key: &str,
    ) -> Result<Option<WebhookCredential>, StoreError>;
}

// =============================================================================
// 인메모리 구현
// =============================================================================

/// 프로세스 메모리 저장소. `DATABASE_URL` 미설정 시와 테스트에서 사용.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: RwLock<HashMap<(String, String), NormalizedTrade>>,
    accounts: RwLock<HashMap<(String, String), AccountRecord>>,
    open_positions: RwLock<HashMap<(String, String), OpenPosition>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn trade_count(&self) -> usize {
        self.trades.read().await.len()
    }

    /// 소유자의 거래 목록 (진입 시각 순).
    pub async fn trades(&self, owner: &str) -> Vec<NormalizedTrade> {
        let mut trades: Vec<_> = self
            .trades
            .read()
            .await
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, t)| t.clone())
            .collect();
        trades.sort_by(|a, b| a.entry_time.cmp(&b.entry_time).then(a.id.cmp(&b.id)));
        trades
    }

    pub async fn trade(&self, owner: &str, id: &str) -> Option<NormalizedTrade> {
        self.trades
            .read()
            .await
            .get(&(owner.to_string(), id.to_string()))
            .cloned()
    }

    pub async fn account(&self, owner: &str, name: &str) -> Option<AccountRecord> {
        self.accounts
            .read()
            .await
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn open_position(&self, owner: &str, id: &str) -> Option<OpenPosition> {
        self.open_positions
            .read()
            .await
            .get(&(owner.to_string(), id.to_string()))
            .cloned()
    }

    pub async fn open_position_count(&self) -> usize {
        self.open_positions.read().await.len()
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn upsert_trade(&self, owner: &str, trade: &NormalizedTrade) -> Result<(), StoreError> {
        self.trades
            .write()
            .await
            .insert((owner.to_string(), trade.id.clone()), trade.clone());
        Ok(())
    }

    async fn upsert_account(&self, owner: &str, account: &AccountRecord) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        accounts
            .entry((owner.to_string(), account.name.clone()))
            .and_modify(|existing| {
                existing.platform = account.platform.clone();
                existing.currency = account.currency.clone();
            })
            .or_insert_with(|| account.clone());
        Ok(())
    }

    async fn upsert_open_position(
        &self,
        owner: &str,
        position: &OpenPosition,
    ) -> Result<(), StoreError> {
        self.open_positions
            .write()
            .await
            .insert((owner.to_string(), position.id.clone()), position.clone());
        Ok(())
    }

    async fn close_open_position(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .open_positions
            .write()
            .await
            .remove(&(owner.to_string(), id.to_string()))
            .is_some())
    }
}

/// 고정 키 목록 기반 웹훅 자격증명 저장소.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    keys: RwLock<HashMap<String, WebhookCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, api_key: impl Into<String>, credential: WebhookCredential) {
        self.keys.write().await.insert(api_key.into(), credential);
    }
}

#[async_trait]
impl WebhookCredentialStore for InMemoryCredentialStore {
    async fn find_webhook_credential(
        &self,
        api_key: &str,
    ) -> Result<Option<WebhookCredential>, StoreError> {
        Ok(self.keys.read().await.get(api_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::trade::{TradeDraft, TradeSide};

    fn trade(id: &str, pnl: Decimal) -> NormalizedTrade {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap();
        TradeDraft {
            id: id.to_string(),
            account_id: "Sim101".to_string(),
            platform: "ninjatrader".to_string(),
            instrument: "NQ 03-25".to_string(),
            side: TradeSide::Buy,
            entry_price: dec!(100),
            exit_price: dec!(105),
            quantity: dec!(1),
            entry_time: t0,
            exit_time: t0,
            pnl,
            commission: Decimal::ZERO,
            notes: String::new(),
            metadata: serde_json::Value::Null,
        }
        .into_trade()
        .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let store = InMemoryTradeStore::new();
        store.upsert_trade("u1", &trade("t1", dec!(10))).await.unwrap();
        store.upsert_trade("u1", &trade("t1", dec!(20))).await.unwrap();
        store.upsert_trade("u2", &trade("t1", dec!(30))).await.unwrap();

        assert_eq!(store.trade_count().await, 2);
        assert_eq!(store.trade("u1", "t1").await.unwrap().pnl, dec!(20));
        assert_eq!(store.trades("u2").await.len(), 1);
    }

    #[tokio::test]
    async fn test_account_balance_kept_on_conflict() {
        let store = InMemoryTradeStore::new();
        let first = AccountRecord {
            name: "Sim101".to_string(),
            platform: "ninjatrader".to_string(),
            currency: "USD".to_string(),
            balance: dec!(150),
        };
        store.upsert_account("u1", &first).await.unwrap();

        let second = AccountRecord {
            platform: "tradovate".to_string(),
            balance: dec!(999),
            ..first.clone()
        };
        store.upsert_account("u1", &second).await.unwrap();

        let stored = store.account("u1", "Sim101").await.unwrap();
        assert_eq!(stored.balance, dec!(150));
        assert_eq!(stored.platform, "tradovate");
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_open_position_closed_by_id() {
        let store = InMemoryTradeStore::new();
        let position = OpenPosition {
            id: "ninja_o1".to_string(),
            account_id: "Sim101".to_string(),
            platform: "ninjatrader".to_string(),
            instrument: "NQ 03-25".to_string(),
            side: TradeSide::Sell,
            entry_price: Some(dec!(21000)),
            quantity: Some(dec!(2)),
            entry_time: Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap(),
            notes: String::new(),
            metadata: serde_json::Value::Null,
        };
        store.upsert_open_position("u1", &position).await.unwrap();
        store.upsert_open_position("u1", &position).await.unwrap();
        assert_eq!(store.open_position_count().await, 1);

        assert!(!store.close_open_position("u2", "ninja_o1").await.unwrap());
        assert!(store.close_open_position("u1", "ninja_o1").await.unwrap());
        assert!(store.open_position("u1", "ninja_o1").await.is_none());
        assert!(!store.close_open_position("u1", "ninja_o1").await.unwrap());
    }

    #[tokio::test]
    async fn test_credential_lookup() {
        let store = InMemoryCredentialStore::new();
        store
            .insert(
                "key-1",
                WebhookCredential {
                    user_id: "u1".to_string(),
                    account_id: None,
                },
            )
            .await;

        assert!(store.find_webhook_credential("key-1").await.unwrap().is_some());
        assert!(store.find_webhook_credential("nope").await.unwrap().is_none());
    }
}
