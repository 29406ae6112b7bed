//! API 라우트.
//!
//! # 엔드포인트
//!
//! - `GET /health` - 헬스 체크
//! - `ANY /api/bingx/{*path}` - BingX 프록시 (자격증명 없으면 서명 없이 전달)
//! - `ANY /api/bitget/{*path}` - Bitget 프록시 (key/secret/passphrase 필수)
//! - `POST /api/mexc` - MEXC 프록시 (본문 `{apiKey, secretKey, endpoint, params}`)
//! - `POST /api/proxy-ninjatrader` - NinjaTrader 웹훅
//! - `POST /api/import` - 리컨실 + 계좌 확인 + 일괄 가져오기
//! - `POST /api/import/preview` - 리컨실 결과만 반환
//!
//! 단일 메서드 엔드포인트는 다른 메서드에 405 JSON 본문으로 응답합니다.

pub mod exchange;
pub mod health;
pub mod import;
pub mod webhook;

use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderName, Method},
    routing::{any, get, post},
    Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::ApiError, state::AppState};

pub use exchange::{bingx_proxy, bitget_proxy, mexc_proxy};
pub use health::health_check;
pub use import::{import_trades, preview_import};
pub use webhook::ninjatrader_webhook;

/// 전체 라우터 (CORS, 요청 추적 포함).
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/bingx/{*path}", any(bingx_proxy))
        .route("/api/bitget/{*path}", any(bitget_proxy))
        .route("/api/mexc", post(mexc_proxy).fallback(post_only))
        .route(
            "/api/proxy-ninjatrader",
            post(ninjatrader_webhook).fallback(post_only),
        )
        .route("/api/import", post(import_trades).fallback(post_only))
        .route("/api/import/preview", post(preview_import).fallback(post_only))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// 모든 출처 허용. 브라우저 저널이 자격증명 헤더를 직접 보냅니다.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::DELETE,
            Method::POST,
            Method::PUT,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-secret-key"),
            HeaderName::from_static("x-passphrase"),
            HeaderName::from_static("x-timestamp"),
            HeaderName::from_static("x-account-id"),
            HeaderName::from_static("x-mexc-apikey"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("request-time"),
            HeaderName::from_static("signature"),
        ])
}

async fn post_only() -> ApiError {
    ApiError::MethodNotAllowed("POST")
}

// =============================================================================
// 공통 헬퍼
// =============================================================================

/// 비어 있지 않은 헤더 값.
pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// JSON 본문 파싱. 빈 본문은 기본값.
pub(crate) fn parse_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}
