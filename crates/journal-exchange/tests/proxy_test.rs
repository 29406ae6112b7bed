//! 서명 + 업스트림 전달 통합 테스트 (mockito).

use std::time::Duration;

use journal_exchange::{
    ApiCredentials, Exchange, ExchangeEndpoints, ExchangeProxy, ProxyError, RequestSigner,
    SignRequest, SignedRequest,
};
use mockito::Matcher;
use reqwest::Method;

fn proxy_for(url: &str) -> ExchangeProxy {
    let endpoints = ExchangeEndpoints {
        bingx: url.to_string(),
        bitget: url.to_string(),
        mexc: url.to_string(),
    };
    ExchangeProxy::new(endpoints, Duration::from_secs(5)).unwrap()
}

// =============================================================================
// BingX
// =============================================================================

#[tokio::test]
async fn test_bingx_signed_request_reaches_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/openApi/swap/v2/user/balance")
        .match_header("X-BX-APIKEY", "key")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("recvWindow".into(), "5000".into()),
            Matcher::UrlEncoded("timestamp".into(), "1700000000000".into()),
            Matcher::Regex("signature=[0-9a-f]{64}".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":0,"data":{"balance":"10"}}"#)
        .create_async()
        .await;

    let creds = ApiCredentials::from_parts(Some("key"), Some("secret"), None).unwrap();
    let signer = RequestSigner::new(Exchange::BingX, creds).unwrap();
    let request = SignRequest::new(Method::GET, "/openApi/swap/v2/user/balance", "1700000000000")
        .with_query(vec![("recvWindow".to_string(), "5000".to_string())]);

    let response = proxy_for(&server.url())
        .forward(Exchange::BingX, signer.sign(&request))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["data"]["balance"], "10");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_status_passes_through() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/openApi/spot/v1/ticker")
        .with_status(429)
        .with_body(r#"{"code":100410,"msg":"rate limited"}"#)
        .create_async()
        .await;

    let request = SignedRequest::unsigned(Method::GET, "/openApi/spot/v1/ticker", Vec::new());
    let response = proxy_for(&server.url())
        .forward(Exchange::BingX, request)
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.body["msg"], "rate limited");
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/down")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let request = SignedRequest::unsigned(Method::GET, "/down", Vec::new());
    let err = proxy_for(&server.url())
        .forward(Exchange::BingX, request)
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::InvalidResponse { status: 502, .. }));
}

// =============================================================================
// Bitget / MEXC
// =============================================================================

#[tokio::test]
async fn test_bitget_headers_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/mix/order/fills")
        .match_query(Matcher::UrlEncoded(
            "productType".into(),
            "USDT-FUTURES".into(),
        ))
        .match_header("ACCESS-KEY", "key")
        .match_header("ACCESS-SIGN", "36yyEgZdvuOCLYRk4YdVZwHj88+LRufzDKNVKH8UPwY=")
        .match_header("ACCESS-PASSPHRASE", "phrase")
        .match_header("locale", "en-US")
        .with_status(200)
        .with_body(r#"{"code":"00000","data":[]}"#)
        .create_async()
        .await;

    let creds = ApiCredentials::from_parts(Some("key"), Some("secret"), Some("phrase")).unwrap();
    let signer = RequestSigner::new(Exchange::Bitget, creds).unwrap();
    let request = SignRequest::new(Method::GET, "/api/v2/mix/order/fills", "1700000000000")
        .with_query(vec![(
            "productType".to_string(),
            "USDT-FUTURES".to_string(),
        )]);

    let response = proxy_for(&server.url())
        .forward(Exchange::Bitget, signer.sign(&request))
        .await
        .unwrap();

    assert_eq!(response.body["code"], "00000");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_mexc_sorted_params_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/private/position/list/history_positions")
        .match_query(Matcher::Exact("page_num=1&symbol=BTC_USDT".into()))
        .match_header("ApiKey", "key")
        .match_header("Request-Time", "1700000000000")
        .match_header(
            "Signature",
            "ab0aa31f187ca783089c41325f95fee82ce01852f7e25ac7a48c77e558805e29",
        )
        .with_status(200)
        .with_body(r#"{"success":true,"data":[]}"#)
        .create_async()
        .await;

    let creds = ApiCredentials::from_parts(Some("key"), Some("secret"), None).unwrap();
    let signer = RequestSigner::new(Exchange::Mexc, creds).unwrap();
    let request = SignRequest::new(
        Method::GET,
        "/api/v1/private/position/list/history_positions",
        "1700000000000",
    )
    .with_query(vec![
        ("symbol".to_string(), "BTC_USDT".to_string()),
        ("page_num".to_string(), "1".to_string()),
    ]);

    let response = proxy_for(&server.url())
        .forward(Exchange::Mexc, signer.sign(&request))
        .await
        .unwrap();

    assert_eq!(response.body["success"], true);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // 닫힌 포트
    let request = SignedRequest::unsigned(Method::GET, "/x", Vec::new());
    let err = proxy_for("http://127.0.0.1:9")
        .forward(Exchange::BingX, request)
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::Network(_)));
}
