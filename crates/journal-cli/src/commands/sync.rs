//! 폴더 동기화.
//!
//! 내보내기 폴더의 모든 `.csv`/`.xml` 파일을 리컨실하고 Postgres에 가져옵니다.
//!
//! # 사용법
//!
//! ```bash
//! # 드라이런 (DB에 저장하지 않고 결과만 출력)
//! journal sync ~/Documents/NinjaTrader\ 8/exports --owner user-1 --dry-run
//!
//! # 가져오기
//! journal sync ./exports --owner user-1 --database-url "postgres://..."
//! ```

use std::path::PathBuf;

use anyhow::Context;
use journal_api::repository::{self, PgTradeRepository};
use journal_import::{import_reconciled, reconcile_dir, FolderReconciliation, ImportReport};
use serde::Serialize;
use tracing::{info, warn};

use super::reconcile::reconciler_for;

/// 동기화 설정
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub dir: PathBuf,
    pub owner: String,
    pub database_url: Option<String>,
    pub timezone: Option<String>,
    /// DB에 저장하지 않음
    pub dry_run: bool,
}

/// 동기화 결과.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub owner: String,
    pub dry_run: bool,
    pub folder: FolderReconciliation,
    /// 드라이런이면 없음
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ImportReport>,
}

pub async fn run_sync(config: &SyncConfig) -> anyhow::Result<SyncSummary> {
    let reconciler = reconciler_for(config.timezone.as_deref())?;
    let folder = reconcile_dir(&config.dir, &reconciler)
        .with_context(|| format!("failed to scan {}", config.dir.display()))?;

    for failure in &folder.failures {
        warn!(path = %failure.path.display(), error = %failure.error, "파일 건너뜀");
    }

    if config.dry_run {
        info!(
            files = folder.files.len(),
            trades = folder.trades.len(),
            "드라이런: 저장하지 않음"
        );
        return Ok(SyncSummary {
            owner: config.owner.clone(),
            dry_run: true,
            folder,
            report: None,
        });
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required unless --dry-run is set")?;
    let pool = repository::connect(database_url).await?;
    let store = PgTradeRepository::new(pool);

    let report = import_reconciled(&store, &config.owner, &folder.trades).await;
    info!(
        owner = %config.owner,
        summary = %report.summary(),
        accounts = report.accounts,
        "폴더 동기화 완료"
    );

    Ok(SyncSummary {
        owner: config.owner.clone(),
        dry_run: false,
        folder,
        report: Some(report),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("journal-cli-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_dry_run_reconciles_without_database() {
        let dir = scratch_dir("dry-run");
        fs::write(
            dir.join("positions.csv"),
            "Position ID,Pair ID,Account,Product,Contract,Net Pos,Paired Qty,Buy Price,Sell Price,P/L,Bought Timestamp,Sold Timestamp\n\
             7,1,DEMO1,ES,ESH5,0,1,5000.00,5002.00,$100.00,01/06/2025 09:30:00,01/06/2025 09:40:00\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let summary = run_sync(&SyncConfig {
            dir: dir.clone(),
            owner: "user-1".to_string(),
            database_url: None,
            timezone: None,
            dry_run: true,
        })
        .await
        .unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert!(summary.dry_run);
        assert!(summary.report.is_none());
        assert_eq!(summary.folder.files.len(), 1);
        assert_eq!(summary.folder.trades.len(), 1);
    }

    #[tokio::test]
    async fn test_import_without_database_url_fails() {
        let dir = scratch_dir("no-db");

        let result = run_sync(&SyncConfig {
            dir: dir.clone(),
            owner: "user-1".to_string(),
            database_url: None,
            timezone: None,
            dry_run: false,
        })
        .await;
        let _ = fs::remove_dir_all(&dir);

        assert!(result.is_err());
    }
}
