//! 트레이딩 저널 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 내보내기 파일 하나를 리컨실해 JSON으로 출력
//! journal reconcile "NinjaTrader Grid 2025-01-06.csv" --timezone Europe/Madrid
//!
//! # 폴더 전체를 Postgres로 동기화
//! journal sync ./exports --owner user-1
//!
//! # 저장 없이 결과만 확인
//! journal sync ./exports --owner user-1 --dry-run
//! ```

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    reconcile::{parse_format, run_reconcile, ReconcileConfig},
    sync::{run_sync, SyncConfig},
};

#[derive(Parser)]
#[command(name = "journal")]
#[command(about = "Trading journal CLI - 브로커 내보내기 리컨실 및 동기화", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 내보내기 파일 하나를 리컨실해 JSON으로 출력
    Reconcile {
        /// CSV 또는 XML 파일 경로
        file: PathBuf,

        /// 타임스탬프 해석 시간대 (IANA, 기본 UTC)
        #[arg(short = 'z', long, env = "IMPORT_TIMEZONE")]
        timezone: Option<String>,

        /// 포맷 강제 (xml, tradovate, trades-es, executions-es, executions-en)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// 폴더의 모든 내보내기를 리컨실하고 가져오기
    Sync {
        /// 내보내기 폴더
        dir: PathBuf,

        /// 거래 소유자 ID
        #[arg(short, long)]
        owner: String,

        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// 타임스탬프 해석 시간대 (IANA, 기본 UTC)
        #[arg(short = 'z', long, env = "IMPORT_TIMEZONE")]
        timezone: Option<String>,

        /// 드라이런 모드 (DB에 저장하지 않음)
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

/// 로그는 stderr로 보내 stdout JSON 출력과 섞이지 않게 합니다.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_cli=info,journal_import=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (없어도 에러 안남)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reconcile {
            file,
            timezone,
            format,
        } => {
            let format = format
                .map(|f| {
                    parse_format(&f).ok_or_else(|| {
                        anyhow!(
                            "Invalid format: {f}. Supported: xml, tradovate, trades-es, executions-es, executions-en"
                        )
                    })
                })
                .transpose()?;

            let output = run_reconcile(&ReconcileConfig {
                path: file,
                timezone,
                format,
            })?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Sync {
            dir,
            owner,
            database_url,
            timezone,
            dry_run,
        } => {
            let summary = run_sync(&SyncConfig {
                dir,
                owner,
                database_url,
                timezone,
                dry_run,
            })
            .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
