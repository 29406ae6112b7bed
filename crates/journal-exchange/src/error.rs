//! 에러 타입 정의.

use thiserror::Error;

/// 서명 전 자격증명 검증 실패 (HTTP 400).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("missing API key")]
    MissingApiKey,

    #[error("missing secret key")]
    MissingSecretKey,

    /// Bitget 전용
    #[error("missing passphrase")]
    MissingPassphrase,

    #[error("missing endpoint")]
    MissingEndpoint,
}

/// 업스트림 전달 에러.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 연결 실패, 타임아웃 등
    #[error("upstream request failed: {0}")]
    Network(String),

    /// 업스트림 응답이 JSON이 아님
    #[error("upstream returned a non-JSON body (status {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    /// HTTP 클라이언트 생성 실패
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Network(err.to_string())
    }
}
