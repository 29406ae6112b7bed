//! 거래소 프록시 핸들러.
//!
//! 자격증명은 요청 헤더(또는 MEXC 본문)로만 받으며 서버에 저장하지 않습니다.
//! 업스트림 상태 코드와 JSON 본문을 그대로 돌려줍니다.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use journal_exchange::{
    ApiCredentials, CredentialError, Exchange, RequestSigner, SignRequest, SignedRequest,
    UpstreamResponse,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{header_value, parse_json};
use crate::{error::ApiError, state::AppState};

fn upstream_response(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

fn request_body(method: &Method, body: &Bytes) -> Option<String> {
    if *method != Method::POST || body.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(body).into_owned())
}

// =============================================================================
// BingX
// =============================================================================

/// `ANY /api/bingx/{*path}`
///
/// `X-API-KEY`/`X-SECRET-KEY`가 없으면 공개 엔드포인트 호출로 보고 서명 없이 전달합니다.
pub async fn bingx_proxy(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let endpoint = format!("/{}", path.trim_start_matches('/'));
    let credentials = ApiCredentials::from_parts(
        header_value(&headers, "x-api-key"),
        header_value(&headers, "x-secret-key"),
        None,
    );

    let request = match credentials {
        Ok(credentials) => {
            info!(
                endpoint = %endpoint,
                method = %method,
                api_key = %credentials.masked_api_key(),
                "BingX 서명 요청"
            );
            let signer = RequestSigner::new(Exchange::BingX, credentials)?;
            let mut sign = SignRequest::new(method.clone(), endpoint, SignRequest::now_millis())
                .with_query(query);
            if let Some(body) = request_body(&method, &body) {
                sign = sign.with_body(body);
            }
            signer.sign(&sign)
        }
        Err(_) => {
            debug!(endpoint = %endpoint, method = %method, "BingX 공개 요청");
            SignedRequest::unsigned(method, endpoint, query)
        }
    };

    let upstream = state.proxy.forward(Exchange::BingX, request).await?;
    Ok(upstream_response(upstream))
}

// =============================================================================
// Bitget
// =============================================================================

/// `ANY /api/bitget/{*path}`
///
/// `X-TIMESTAMP` 헤더가 있으면 서명 시각으로 사용합니다.
pub async fn bitget_proxy(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let endpoint = format!("/{}", path.trim_start_matches('/'));
    let credentials = ApiCredentials::from_parts(
        header_value(&headers, "x-api-key"),
        header_value(&headers, "x-secret-key"),
        header_value(&headers, "x-passphrase"),
    )?;
    let signer = RequestSigner::new(Exchange::Bitget, credentials)?;

    let timestamp = header_value(&headers, "x-timestamp")
        .map(str::to_string)
        .unwrap_or_else(SignRequest::now_millis);

    info!(
        endpoint = %endpoint,
        method = %method,
        params = query.len(),
        "Bitget 서명 요청"
    );

    let mut sign = SignRequest::new(method.clone(), endpoint, timestamp).with_query(query);
    if let Some(body) = request_body(&method, &body) {
        sign = sign.with_body(body);
    }

    let upstream = state
        .proxy
        .forward(Exchange::Bitget, signer.sign(&sign))
        .await?;
    Ok(upstream_response(upstream))
}

// =============================================================================
// MEXC
// =============================================================================

/// MEXC 프록시 요청 본문.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MexcProxyRequest {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
    pub params: Map<String, Value>,
}

/// JSON 파라미터를 쿼리 쌍으로. `null`은 제외합니다.
fn params_to_query(params: Map<String, Value>) -> Vec<(String, String)> {
    params
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

/// `POST /api/mexc`
///
/// 본문의 자격증명이 우선이며 `X-MEXC-APIKEY`/`X-API-KEY`, `X-SECRET-KEY` 헤더로
/// 대체할 수 있습니다. 업스트림 호출은 GET입니다.
pub async fn mexc_proxy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: MexcProxyRequest = parse_json(&body)?;

    let api_key = request
        .api_key
        .as_deref()
        .or_else(|| header_value(&headers, "x-mexc-apikey"))
        .or_else(|| header_value(&headers, "x-api-key"));
    let secret_key = request
        .secret_key
        .as_deref()
        .or_else(|| header_value(&headers, "x-secret-key"));
    let credentials = ApiCredentials::from_parts(api_key, secret_key, None)?;

    let endpoint = request
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(CredentialError::MissingEndpoint)?;
    let endpoint = format!("/{}", endpoint.trim_start_matches('/'));

    info!(
        endpoint = %endpoint,
        params = request.params.len(),
        api_key = %credentials.masked_api_key(),
        "MEXC 서명 요청"
    );

    let signer = RequestSigner::new(Exchange::Mexc, credentials)?;
    let sign = SignRequest::new(Method::GET, endpoint, SignRequest::now_millis())
        .with_query(params_to_query(request.params));

    let upstream = state.proxy.forward(Exchange::Mexc, signer.sign(&sign)).await?;
    Ok(upstream_response(upstream))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_params_to_query() {
        let Value::Object(params) = json!({"symbol": "BTC_USDT", "page_num": 1, "skip": null})
        else {
            unreachable!()
        };
        let mut query = params_to_query(params);
        query.sort();
        assert_eq!(
            query,
            vec![
                ("page_num".to_string(), "1".to_string()),
                ("symbol".to_string(), "BTC_USDT".to_string()),
            ]
        );
    }

    #[test]
    fn test_body_only_for_post() {
        let body = Bytes::from_static(b"{\"a\":1}");
        assert_eq!(request_body(&Method::GET, &body), None);
        assert_eq!(
            request_body(&Method::POST, &body).as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(request_body(&Method::POST, &Bytes::new()), None);
    }
}
