//! 거래소별 요청 서명.
//!
//! 같은 입력(타임스탬프 포함)은 항상 같은 결과를 냅니다.
//! 파라미터 순서 처리는 거래소마다 다릅니다:
//!
//! | 거래소 | 정규 문자열 | 인코딩 | 순서 |
//! |--------|-------------|--------|------|
//! | BingX  | `k=v&...&timestamp=ts` | hex | 입력 순서 유지 |
//! | Bitget | `ts + METHOD + path[?q] + body` | base64 | 입력 순서 유지 |
//! | MEXC   | `apiKey + ts + 정렬된 k=v` | hex | 이름순 정렬 |

mod bingx;
mod bitget;
mod mexc;

use std::fmt;

use hmac::{Hmac, Mac};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::{credentials::ApiCredentials, error::CredentialError};

pub use bingx::BingxSigner;
pub use bitget::BitgetSigner;
pub use mexc::MexcSigner;

type HmacSha256 = Hmac<Sha256>;

/// 지원 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    BingX,
    Bitget,
    Mexc,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BingX => write!(f, "bingx"),
            Self::Bitget => write!(f, "bitget"),
            Self::Mexc => write!(f, "mexc"),
        }
    }
}

/// 서명 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub method: Method,
    /// 업스트림 경로 (`/openApi/swap/v2/user/balance`)
    pub path: String,
    /// 디코딩된 쿼리 파라미터 (입력 순서)
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    /// 밀리초 Unix 타임스탬프 문자열
    pub timestamp: String,
}

impl SignRequest {
    pub fn new(method: Method, path: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timestamp: timestamp.into(),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 현재 시각의 밀리초 타임스탬프.
    pub fn now_millis() -> String {
        chrono::Utc::now().timestamp_millis().to_string()
    }
}

/// 서명 결과. 업스트림으로 보낼 최종 쿼리와 헤더.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl SignedRequest {
    /// 서명 없이 그대로 전달할 요청 (BingX 공개 엔드포인트).
    pub fn unsigned(method: Method, path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method,
            path: path.into(),
            query,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    /// `path?query` 형태. 쿼리가 없으면 경로만.
    pub fn path_and_query(&self) -> String {
        let query = encode_query(&self.query);
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 자격증명 검증을 마친 서명기.
#[derive(Debug, Clone)]
pub enum RequestSigner {
    BingX(BingxSigner),
    Bitget(BitgetSigner),
    Mexc(MexcSigner),
}

impl RequestSigner {
    /// 거래소별 필수 자격증명을 확인하고 서명기를 만듭니다.
    ///
    /// # Errors
    ///
    /// Bitget은 passphrase가 없으면 `CredentialError::MissingPassphrase`.
    pub fn new(exchange: Exchange, credentials: ApiCredentials) -> Result<Self, CredentialError> {
        let signer = match exchange {
            Exchange::BingX => Self::BingX(BingxSigner::new(credentials)),
            Exchange::Bitget => Self::Bitget(BitgetSigner::new(credentials)?),
            Exchange::Mexc => Self::Mexc(MexcSigner::new(credentials)),
        };
        Ok(signer)
    }

    pub fn exchange(&self) -> Exchange {
        match self {
            Self::BingX(_) => Exchange::BingX,
            Self::Bitget(_) => Exchange::Bitget,
            Self::Mexc(_) => Exchange::Mexc,
        }
    }

    pub fn sign(&self, request: &SignRequest) -> SignedRequest {
        match self {
            Self::BingX(s) => s.sign(request),
            Self::Bitget(s) => s.sign(request),
            Self::Mexc(s) => s.sign(request),
        }
    }
}

// =============================================================================
// 공통 헬퍼
// =============================================================================

pub(crate) fn hmac_sha256(secret: &SecretString, message: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// `application/x-www-form-urlencoded` 직렬화 (입력 순서 유지).
pub(crate) fn encode_query(params: &[(String, String)]) -> String {
    serde_urlencoded::to_string(params).unwrap_or_default()
}

/// 중복 키 제거. 첫 등장 위치를 유지하고 값은 마지막 것으로 덮어씁니다.
pub(crate) fn dedupe_keys(params: &[(String, String)]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(params.len());
    for (key, value) in params {
        match out.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => out.push((key.clone(), value.clone())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_query_form_style() {
        let q = pairs(&[("a", "x y"), ("b", "1/2")]);
        assert_eq!(encode_query(&q), "a=x+y&b=1%2F2");
        assert_eq!(encode_query(&[]), "");
    }

    #[test]
    fn test_dedupe_keeps_first_position_last_value() {
        let q = pairs(&[("a", "1"), ("b", "2"), ("a", "3")]);
        assert_eq!(dedupe_keys(&q), pairs(&[("a", "3"), ("b", "2")]));
    }

    #[test]
    fn test_bitget_requires_passphrase() {
        let creds = ApiCredentials::from_parts(Some("k"), Some("s"), None).unwrap();
        assert_eq!(
            RequestSigner::new(Exchange::Bitget, creds.clone()).unwrap_err(),
            CredentialError::MissingPassphrase
        );
        assert_eq!(
            RequestSigner::new(Exchange::BingX, creds).unwrap().exchange(),
            Exchange::BingX
        );
    }

    #[test]
    fn test_path_and_query() {
        let req = SignedRequest::unsigned(Method::GET, "/x", pairs(&[("a", "1")]));
        assert_eq!(req.path_and_query(), "/x?a=1");
        let req = SignedRequest::unsigned(Method::GET, "/x", Vec::new());
        assert_eq!(req.path_and_query(), "/x");
        assert_eq!(req.header("content-type"), Some("application/json"));
    }
}
