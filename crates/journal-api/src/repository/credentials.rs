//! 웹훅 API 키 Repository.

use async_trait::async_trait;
use journal_core::{StoreError, WebhookCredential, WebhookCredentialStore};
use sqlx::PgPool;

/// `api_credentials` 테이블 기반 조회 (platform = ninjatrader, 활성 키만).
#[derive(Debug, Clone)]
pub struct PgWebhookCredentialRepository {
    pool: PgPool,
}

impl PgWebhookCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookCredentialStore for PgWebhookCredentialRepository {
    async fn find_webhook_credential(
        &self,
        api_key: &str,
    ) -> Result<Option<WebhookCredential>, StoreError> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT user_id, account_id
            FROM api_credentials
            WHERE platform = 'ninjatrader' AND api_key = $1 AND is_active
            LIMIT 1
            "#,
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row.map(|(user_id, account_id)| WebhookCredential {
            user_id,
            account_id,
        }))
    }
}
