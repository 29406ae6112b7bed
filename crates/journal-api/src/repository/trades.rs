//! 거래/열린 포지션/계좌 Repository.

use async_trait::async_trait;
use journal_core::{AccountRecord, NormalizedTrade, OpenPosition, StoreError, TradeStore};
use sqlx::PgPool;
use tracing::debug;

/// `operations`/`open_positions`/`accounts` 테이블 기반 저장소.
#[derive(Debug, Clone)]
pub struct PgTradeRepository {
    pool: PgPool,
}

impl PgTradeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

#[async_trait]
impl TradeStore for PgTradeRepository {
    /// `(user_id, id)` 기준 UPSERT. 같은 ID 재기록은 모든 필드를 덮어씁니다.
    async fn upsert_trade(&self, owner: &str, trade: &NormalizedTrade) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO operations (
                id, user_id, account_id, platform, instrument, type,
                entry_price, exit_price, quantity, entry_date, exit_date,
                pnl, commission, result, currency, status, notes, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'closed', $16, $17)
            ON CONFLICT (user_id, id) DO UPDATE SET
                account_id = EXCLUDED.account_id,
                platform = EXCLUDED.platform,
                instrument = EXCLUDED.instrument,
                type = EXCLUDED.type,
                entry_price = EXCLUDED.entry_price,
                exit_price = EXCLUDED.exit_price,
                quantity = EXCLUDED.quantity,
                entry_date = EXCLUDED.entry_date,
                exit_date = EXCLUDED.exit_date,
                pnl = EXCLUDED.pnl,
                commission = EXCLUDED.commission,
                result = EXCLUDED.result,
                currency = EXCLUDED.currency,
                notes = EXCLUDED.notes,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            "#,
        )
        .bind(&trade.id)
        .bind(owner)
        .bind(&trade.account_id)
        .bind(&trade.platform)
        .bind(&trade.instrument)
        .bind(trade.side.to_string())
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.quantity)
        .bind(trade.entry_time)
        .bind(trade.exit_time)
        .bind(trade.pnl)
        .bind(trade.commission)
        .bind(trade.result.to_string())
        .bind(&trade.currency)
        .bind(&trade.notes)
        .bind(&trade.metadata)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(trade_id = %trade.id, "거래 upsert");
        Ok(())
    }

    /// `(user_id, name)` 기준 UPSERT. 기존 계좌는 platform/currency만 갱신합니다.
    async fn upsert_account(&self, owner: &str, account: &AccountRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (user_id, name, platform, currency, balance)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, name) DO UPDATE
            SET platform = EXCLUDED.platform, currency = EXCLUDED.currency, updated_at = NOW()
            "#,
        )
        .bind(owner)
        .bind(&account.name)
        .bind(&account.platform)
        .bind(&account.currency)
        .bind(account.balance)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(account = %account.name, "계좌 upsert");
        Ok(())
    }

    async fn upsert_open_position(
        &self,
        owner: &str,
        position: &OpenPosition,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO open_positions (
                id, user_id, account_id, platform, instrument, type,
                entry_price, quantity, entry_date, notes, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, id) DO UPDATE SET
                account_id = EXCLUDED.account_id,
                platform = EXCLUDED.platform,
                instrument = EXCLUDED.instrument,
                type = EXCLUDED.type,
                entry_price = EXCLUDED.entry_price,
                quantity = EXCLUDED.quantity,
                entry_date = EXCLUDED.entry_date,
                notes = EXCLUDED.notes,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            "#,
        )
        .bind(&position.id)
        .bind(owner)
        .bind(&position.account_id)
        .bind(&position.platform)
        .bind(&position.instrument)
        .bind(position.side.to_string())
        .bind(position.entry_price)
        .bind(position.quantity)
        .bind(position.entry_time)
        .bind(&position.notes)
        .bind(&position.metadata)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(position_id = %position.id, "열린 포지션 upsert");
        Ok(())
    }

    async fn close_open_position(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM open_positions WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
