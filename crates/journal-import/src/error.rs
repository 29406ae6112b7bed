//! 에러 타입 정의.

use journal_core::CoreError;
use thiserror::Error;

/// 파일 전체를 읽을 수 없는 경우의 에러.
///
/// 개별 레코드 문제는 에러가 아니라 `SkippedRecord`로 보고됩니다.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("empty import payload")]
    EmptyPayload,

    #[error("malformed CSV: {0}")]
    Csv(String),

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err.to_string())
    }
}

impl From<roxmltree::Error> for ImportError {
    fn from(err: roxmltree::Error) -> Self {
        ImportError::Xml(err.to_string())
    }
}

/// 웹훅 페이로드 매핑 에러 (HTTP 400).
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error(transparent)]
    Action(#[from] CoreError),
}
