//! Postgres 저장소.
//!
//! `journal-core`의 저장소 trait을 sqlx 런타임 쿼리로 구현합니다.

mod credentials;
mod trades;

pub use credentials::PgWebhookCredentialRepository;
pub use trades::PgTradeRepository;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

const SCHEMA: &str = include_str!("../../migrations/0001_journal.sql");

/// 풀을 만들고 스키마를 적용합니다.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    info!("데이터베이스 연결 및 스키마 확인 완료");

    Ok(pool)
}
