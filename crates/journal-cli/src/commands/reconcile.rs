//! 단일 파일 리컨실.
//!
//! # 사용법
//!
//! ```bash
//! # 포맷 자동 판별
//! journal reconcile exports/NinjaTrader\ Grid.csv
//!
//! # 거래소 시간대 지정 + 포맷 강제
//! journal reconcile executions.csv --timezone Europe/Madrid --format executions-es
//! ```

use std::{fs, path::PathBuf};

use anyhow::Context;
use journal_import::{ImportFormat, ReconcileOptions, ReconcileOutput, Reconciler};
use tracing::info;

/// 리컨실 설정
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub path: PathBuf,
    /// IANA 시간대 이름 (기본 UTC)
    pub timezone: Option<String>,
    /// 지정하면 판별을 건너뜀
    pub format: Option<ImportFormat>,
}

/// 포맷 이름 파싱. 짧은 별칭도 허용합니다.
pub fn parse_format(s: &str) -> Option<ImportFormat> {
    match s.trim().to_lowercase().as_str() {
        "xml" | "ninja-xml" | "ninjatraderxml" => Some(ImportFormat::NinjaTraderXml),
        "tradovate" | "tradovatepositionhistory" => Some(ImportFormat::TradovatePositionHistory),
        "trades-es" | "ninjatradertradeses" => Some(ImportFormat::NinjaTraderTradesEs),
        "executions-es" | "ninjatraderexecutionses" => Some(ImportFormat::NinjaTraderExecutionsEs),
        "executions-en" | "ninjatraderexecutionsen" => Some(ImportFormat::NinjaTraderExecutionsEn),
        _ => None,
    }
}

/// 시간대 옵션으로 리컨실러 생성.
pub fn reconciler_for(timezone: Option<&str>) -> anyhow::Result<Reconciler> {
    let options = match timezone {
        Some(name) => ReconcileOptions::from_timezone_name(name)?,
        None => ReconcileOptions::default(),
    };
    Ok(Reconciler::new(options))
}

pub fn run_reconcile(config: &ReconcileConfig) -> anyhow::Result<ReconcileOutput> {
    let text = fs::read_to_string(&config.path)
        .with_context(|| format!("failed to read {}", config.path.display()))?;
    let reconciler = reconciler_for(config.timezone.as_deref())?;

    let output = match config.format {
        Some(format) => reconciler.reconcile_with_format(&text, format)?,
        None => reconciler.reconcile(&text)?,
    };

    info!(
        path = %config.path.display(),
        format = %output.format,
        trades = output.trades.len(),
        unmatched = output.unmatched.len(),
        "파일 리컨실 완료"
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_aliases() {
        assert_eq!(parse_format("XML"), Some(ImportFormat::NinjaTraderXml));
        assert_eq!(
            parse_format("executions-es"),
            Some(ImportFormat::NinjaTraderExecutionsEs)
        );
        assert_eq!(
            parse_format("TradovatePositionHistory"),
            Some(ImportFormat::TradovatePositionHistory)
        );
        assert_eq!(parse_format("pdf"), None);
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        assert!(reconciler_for(Some("Mars/Olympus")).is_err());
        assert!(reconciler_for(Some("America/New_York")).is_ok());
        assert!(reconciler_for(None).is_ok());
    }

    #[test]
    fn test_run_reconcile_tradovate_file() {
        let path = std::env::temp_dir().join(format!(
            "journal-cli-{}-tradovate.csv",
            std::process::id()
        ));
        fs::write(
            &path,
            "Position ID,Pair ID,Account,Product,Contract,Net Pos,Paired Qty,Buy Price,Sell Price,P/L,Bought Timestamp,Sold Timestamp\n\
             7,1,DEMO1,ES,ESH5,0,1,5000.00,5002.00,$100.00,01/06/2025 09:30:00,01/06/2025 09:40:00\n",
        )
        .unwrap();

        let output = run_reconcile(&ReconcileConfig {
            path: path.clone(),
            timezone: None,
            format: None,
        })
        .unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(output.format, ImportFormat::TradovatePositionHistory);
        assert_eq!(output.trades.len(), 1);
        assert_eq!(output.accounts, vec!["DEMO1"]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = run_reconcile(&ReconcileConfig {
            path: PathBuf::from("/nonexistent/journal-cli/export.csv"),
            timezone: None,
            format: None,
        });
        assert!(result.is_err());
    }
}
