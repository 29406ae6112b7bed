//! 에러 타입 정의.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::action::EntryExit;

/// 도메인 규칙 위반 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 어휘 테이블에 없는 액션 문자열
    #[error("unrecognized action vocabulary: {0:?}")]
    UnknownAction(String),

    /// 액션과 진입/청산 표시가 서로 모순됨 (예: Entry + BuyToCover)
    #[error("action {action:?} contradicts the {marker} marker")]
    ConflictingAction { action: String, marker: EntryExit },

    /// 청산 시각이 진입 시각보다 앞섬
    #[error("exit time {exit} precedes entry time {entry}")]
    ExitBeforeEntry {
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    },
}

/// 저장소(persistence collaborator) 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 에러
    #[error("database error: {0}")]
    Database(String),

    /// 기타 저장소 에러
    #[error("store error: {0}")]
    Other(String),
}
