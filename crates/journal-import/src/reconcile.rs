//! 원문 → 거래 리컨실리에이션 진입점.

use std::collections::HashSet;

use chrono_tz::Tz;
use journal_core::{NormalizedTrade, RawExecution};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::ImportError,
    format::{detect, Confidence, Detection, ImportFormat, ParseContext, ParsedRecords, SkippedRecord},
    pairing::{pair_executions, PairingOutcome, PairingStrategy, UnmatchedExecution},
};

/// 리컨실리에이션 설정.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// 오프셋 없는 타임스탬프의 시간대
    pub timezone: Tz,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl ReconcileOptions {
    /// IANA 시간대 이름으로 생성합니다 (예: `America/New_York`).
    pub fn from_timezone_name(name: &str) -> Result<Self, ImportError> {
        let timezone = name
            .trim()
            .parse::<Tz>()
            .map_err(|_| ImportError::UnknownTimezone(name.to_string()))?;
        Ok(Self { timezone })
    }

    fn parse_context(&self) -> ParseContext {
        ParseContext {
            timezone: self.timezone,
        }
    }
}

/// 리컨실리에이션 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutput {
    pub format: ImportFormat,
    pub confidence: Confidence,
    /// 체결 포맷일 때 사용한 짝짓기 전략
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<PairingStrategy>,
    pub trades: Vec<NormalizedTrade>,
    pub unmatched: Vec<UnmatchedExecution>,
    pub skipped: Vec<SkippedRecord>,
    /// 감지된 계좌명 (처음 등장 순서)
    pub accounts: Vec<String>,
}

impl ReconcileOutput {
    /// 거래 순손익 합계.
    pub fn total_pnl(&self) -> rust_decimal::Decimal {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn log_summary(&self) {
        info!(
            format = %self.format,
            confidence = ?self.confidence,
            trades = self.trades.len(),
            unmatched = self.unmatched.len(),
            skipped = self.skipped.len(),
            accounts = self.accounts.len(),
            total_pnl = %self.total_pnl(),
            "리컨실리에이션 완료"
        );
    }
}

/// 포맷 판별 → 파싱 → 짝짓기를 수행합니다. 저장소는 건드리지 않습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// 포맷을 자동 판별해 리컨실합니다.
    pub fn reconcile(&self, text: &str) -> Result<ReconcileOutput, ImportError> {
        if text.trim().is_empty() {
            return Err(ImportError::EmptyPayload);
        }

        let detection = detect(text);
        if detection.confidence == Confidence::Fallback {
            warn!(
                fallback = %detection.format,
                "알 수 없는 내보내기 포맷, 대체 파서로 시도"
            );
        }
        self.run(text, detection)
    }

    /// 판별을 건너뛰고 지정한 포맷으로 리컨실합니다.
    pub fn reconcile_with_format(
        &self,
        text: &str,
        format: ImportFormat,
    ) -> Result<ReconcileOutput, ImportError> {
        self.run(
            text,
            Detection {
                format,
                confidence: Confidence::Hallmark,
            },
        )
    }

    /// 이미 파싱된 체결을 짝짓습니다.
    pub fn reconcile_executions(
        &self,
        executions: Vec<RawExecution>,
        strategy: PairingStrategy,
        platform: &str,
    ) -> PairingOutcome {
        pair_executions(executions, strategy, platform)
    }

    fn run(&self, text: &str, detection: Detection) -> Result<ReconcileOutput, ImportError> {
        let batch = detection
            .format
            .parse(text, &self.options.parse_context())?;
        let platform = detection.format.platform();

        let (strategy, accounts, outcome) = match batch.records {
            ParsedRecords::Executions {
                executions,
                strategy,
            } => {
                let accounts = distinct(executions.iter().map(|e| e.account.as_str()));
                let outcome = self.reconcile_executions(executions, strategy, platform);
                (Some(strategy), accounts, outcome)
            }
            ParsedRecords::Trades(trades) => {
                let accounts = distinct(trades.iter().map(|t| t.account_id.as_str()));
                (
                    None,
                    accounts,
                    PairingOutcome {
                        trades,
                        unmatched: Vec::new(),
                    },
                )
            }
        };

        let output = ReconcileOutput {
            format: detection.format,
            confidence: detection.confidence,
            strategy,
            trades: outcome.trades,
            unmatched: outcome.unmatched,
            skipped: batch.skipped,
            accounts,
        };
        output.log_summary();
        Ok(output)
    }
}

/// 처음 등장 순서를 유지한 중복 제거.
pub(crate) fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
