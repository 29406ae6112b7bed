//! 브로커 내보내기 파일 리컨실리에이션.
//!
//! CSV/XML 원문을 받아 포맷을 판별하고, 체결을 파싱해 왕복 거래로 짝지은 뒤
//! 저장소에 일괄 기록합니다. NinjaTrader 웹훅 페이로드 매핑도 여기서 담당합니다.
//!
//! # 흐름
//!
//! ```text
//! text ──detect──▶ ImportFormat ──parse──▶ ParsedBatch
//!                                            │
//!                     ┌──────────────────────┴──────────────┐
//!                Executions                               Trades
//!                     │ pairing (Explicit / Positional)     │
//!                     ▼                                     ▼
//!               ReconcileOutput { trades, unmatched, skipped, accounts }
//!                     │
//!                     ▼ importer (ensure_accounts + import_trades)
//!                 TradeStore
//! ```
//!
//! 리컨실러는 순수 동기 함수이며 저장소 핸들은 가져오기 단계에서만 전달됩니다.

pub mod error;
pub mod folder;
pub mod format;
pub mod importer;
pub mod number;
pub mod pairing;
pub mod reconcile;
pub mod time;
pub mod webhook;

pub use error::{ImportError, WebhookError};
pub use folder::{reconcile_dir, FileFailure, FolderReconciliation};
pub use format::{
    detect, Confidence, Detection, ImportFormat, ParseContext, ParsedBatch, ParsedRecords,
    SkippedRecord,
};
pub use importer::{ensure_accounts, import_reconciled, import_trades, ImportFailure, ImportReport};
pub use pairing::{pair_executions, PairingOutcome, PairingStrategy, UnmatchedExecution, UnmatchedReason};
pub use reconcile::{ReconcileOptions, ReconcileOutput, Reconciler};
pub use webhook::{trade_from_webhook, WebhookOutcome};
