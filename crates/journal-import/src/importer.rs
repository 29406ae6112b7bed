//! 리컨실된 거래를 저장소에 일괄 기록합니다.
//!
//! 개별 거래 실패는 전체를 중단시키지 않고 [`ImportReport::errors`]에 쌓입니다.
//! 거래 ID가 결정적이므로 같은 파일을 다시 가져와도 중복이 생기지 않습니다.

use std::collections::HashMap;

use journal_core::{AccountRecord, NormalizedTrade, TradeStore};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

/// 실패한 거래 하나.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub id: String,
    pub error: String,
}

/// 가져오기 결과 집계.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub total: usize,
    /// 확인/생성한 계좌 수
    pub accounts: usize,
    pub errors: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.imported == self.total
    }

    pub fn summary(&self) -> String {
        format!("{} of {} trades imported", self.imported, self.total)
    }
}

/// 거래를 하나씩 upsert합니다.
pub async fn import_trades(
    store: &dyn TradeStore,
    owner: &str,
    trades: &[NormalizedTrade],
) -> ImportReport {
    let mut report = ImportReport {
        total: trades.len(),
        ..Default::default()
    };

    for trade in trades {
        match store.upsert_trade(owner, trade).await {
            Ok(()) => report.imported += 1,
            Err(e) => {
                warn!(trade_id = %trade.id, error = %e, "거래 기록 실패");
                report.errors.push(ImportFailure {
                    id: trade.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        owner,
        imported = report.imported,
        total = report.total,
        failed = report.errors.len(),
        "거래 가져오기 완료"
    );
    report
}

/// 거래에 등장한 계좌를 확인/생성합니다.
///
/// 잔고는 계좌별 순손익 합계이며 기존 계좌의 잔고는 바뀌지 않습니다.
/// 플랫폼은 해당 계좌의 첫 거래에서 가져옵니다. 실패한 계좌는 `errors`에
/// `account:{name}` ID로 기록됩니다.
pub async fn ensure_accounts(
    store: &dyn TradeStore,
    owner: &str,
    trades: &[NormalizedTrade],
) -> ImportReport {
    let mut order: Vec<&str> = Vec::new();
    let mut accounts: HashMap<&str, AccountRecord> = HashMap::new();

    for trade in trades {
        let record = accounts
            .entry(trade.account_id.as_str())
            .or_insert_with(|| {
                order.push(trade.account_id.as_str());
                AccountRecord {
                    name: trade.account_id.clone(),
                    platform: trade.platform.clone(),
                    currency: "USD".to_string(),
                    balance: Decimal::ZERO,
                }
            });
        record.balance += trade.pnl;
    }

    let mut report = ImportReport {
        total: order.len(),
        ..Default::default()
    };

    for name in order {
        let Some(record) = accounts.get(name) else {
            continue;
        };
        match store.upsert_account(owner, record).await {
            Ok(()) => report.accounts += 1,
            Err(e) => {
                warn!(account = %name, error = %e, "계좌 생성 실패");
                report.errors.push(ImportFailure {
                    id: format!("account:{name}"),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

/// 계좌 확인 후 거래를 가져옵니다.
pub async fn import_reconciled(
    store: &dyn TradeStore,
    owner: &str,
    trades: &[NormalizedTrade],
) -> ImportReport {
    let accounts = ensure_accounts(store, owner, trades).await;
    let mut report = import_trades(store, owner, trades).await;
    report.accounts = accounts.accounts;
    report.errors.extend(accounts.errors);
    report
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use journal_core::{InMemoryTradeStore, OpenPosition, StoreError, TradeDraft, TradeSide};
    use rust_decimal_macros::dec;

    use super::*;

    fn trade(id: &str, account: &str, pnl: Decimal) -> NormalizedTrade {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 6, 14, 0, 0).unwrap();
        TradeDraft {
            id: id.to_string(),
            account_id: account.to_string(),
            platform: "ninjatrader".to_string(),
            instrument: "ES 03-25".to_string(),
            side: TradeSide::Buy,
            entry_price: dec!(5000),
            exit_price: dec!(5001),
            quantity: dec!(1),
            entry_time: t0,
            exit_time: t0 + chrono::Duration::minutes(1),
            pnl,
            commission: Decimal::ZERO,
            notes: String::new(),
            metadata: serde_json::Value::Null,
        }
        .into_trade()
        .unwrap()
    }

    /// 특정 ID만 실패시키는 저장소.
    struct FlakyStore {
        inner: InMemoryTradeStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl TradeStore for FlakyStore {
        async fn upsert_trade(
            &self,
            owner: &str,
            trade: &NormalizedTrade,
        ) -> Result<(), StoreError> {
            if trade.id == self.poisoned {
                return Err(StoreError::Database("constraint violated".to_string()));
            }
            self.inner.upsert_trade(owner, trade).await
        }

        async fn upsert_account(
            &self,
            owner: &str,
            account: &AccountRecord,
        ) -> Result<(), StoreError> {
            self.inner.upsert_account(owner, account).await
        }

        async fn upsert_open_position(
            &self,
            owner: &str,
            position: &OpenPosition,
        ) -> Result<(), StoreError> {
            self.inner.upsert_open_position(owner, position).await
        }

        async fn close_open_position(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
            self.inner.close_open_position(owner, id).await
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let store = FlakyStore {
            inner: InMemoryTradeStore::new(),
            poisoned: "t2",
        };
        let trades = vec![
            trade("t1", "Sim101", dec!(10)),
            trade("t2", "Sim101", dec!(20)),
            trade("t3", "Sim101", dec!(30)),
        ];

        let report = import_trades(&store, "user-1", &trades).await;
        assert_eq!(report.imported, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].id, "t2");
        assert!(!report.is_complete());
        assert_eq!(store.inner.trade_count().await, 2);
    }

    #[tokio::test]
    async fn test_accounts_balance_is_sum_of_pnl() {
        let store = InMemoryTradeStore::new();
        let trades = vec![
            trade("t1", "Sim101", dec!(10)),
            trade("t2", "Sim102", dec!(-5)),
            trade("t3", "Sim101", dec!(2.5)),
        ];

        let report = import_reconciled(&store, "user-1", &trades).await;
        assert!(report.is_complete());
        assert_eq!(report.accounts, 2);
        assert_eq!(report.summary(), "3 of 3 trades imported");

        let account = store.account("user-1", "Sim101").await.unwrap();
        assert_eq!(account.balance, dec!(12.5));
        assert_eq!(account.currency, "USD");
        assert_eq!(account.platform, "ninjatrader");
    }
}
