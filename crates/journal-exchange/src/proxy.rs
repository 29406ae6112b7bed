//! 업스트림 전달 클라이언트.
//!
//! 서명된 요청을 거래소로 보내고 상태 코드와 JSON 본문을 해석 없이 돌려줍니다.
//! 재시도하지 않습니다.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    error::ProxyError,
    signer::{Exchange, SignedRequest},
};

/// 거래소별 기본 URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeEndpoints {
    pub bingx: String,
    pub bitget: String,
    pub mexc: String,
}

impl Default for ExchangeEndpoints {
    fn default() -> Self {
        Self {
            bingx: "https://open-api.bingx.com".to_string(),
            bitget: "https://api.bitget.com".to_string(),
            mexc: "https://contract.mexc.com".to_string(),
        }
    }
}

impl ExchangeEndpoints {
    pub fn base_url(&self, exchange: Exchange) -> &str {
        let url = match exchange {
            Exchange::BingX => &self.bingx,
            Exchange::Bitget => &self.bitget,
            Exchange::Mexc => &self.mexc,
        };
        url.trim_end_matches('/')
    }
}

/// 업스트림 응답 (상태 코드 + JSON 그대로).
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

pub struct ExchangeProxy {
    client: Client,
    endpoints: ExchangeEndpoints,
}

impl ExchangeProxy {
    pub fn new(endpoints: ExchangeEndpoints, timeout: Duration) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Client(e.to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &ExchangeEndpoints {
        &self.endpoints
    }

    /// 요청을 전달합니다.
    ///
    /// # Errors
    ///
    /// - `Network`: 연결 실패/타임아웃
    /// - `InvalidResponse`: 본문이 JSON이 아님
    pub async fn forward(
        &self,
        exchange: Exchange,
        request: SignedRequest,
    ) -> Result<UpstreamResponse, ProxyError> {
        let url = format!(
            "{}{}",
            self.endpoints.base_url(exchange),
            request.path_and_query()
        );

        info!(
            exchange = %exchange,
            method = %request.method,
            path = %request.path,
            params = request.query.len(),
            "업스트림 요청 전달"
        );

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(exchange = %exchange, error = %e, "업스트림 연결 실패");
            ProxyError::from(e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = serde_json::from_str(&text).map_err(|e| {
            warn!(exchange = %exchange, status, "업스트림 응답이 JSON이 아님");
            ProxyError::InvalidResponse {
                status,
                message: e.to_string(),
            }
        })?;

        debug!(exchange = %exchange, status, "업스트림 응답 수신");

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let endpoints = ExchangeEndpoints {
            bingx: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        assert_eq!(endpoints.base_url(Exchange::BingX), "http://localhost:1234");
        assert_eq!(
            endpoints.base_url(Exchange::Mexc),
            "https://contract.mexc.com"
        );
    }
}
