//! BingX 서명.
//!
//! 쿼리 파라미터를 입력 순서대로 form 인코딩하고 `timestamp`를 덧붙인 문자열에
//! HMAC-SHA256(hex)을 계산해 `signature` 파라미터로 추가합니다.
//! API 키는 `X-BX-APIKEY` 헤더로 전달합니다.

use reqwest::Method;

use super::{dedupe_keys, encode_query, hmac_sha256, SignRequest, SignedRequest};
use crate::credentials::ApiCredentials;

#[derive(Debug, Clone)]
pub struct BingxSigner {
    credentials: ApiCredentials,
}

impl BingxSigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    pub fn sign(&self, request: &SignRequest) -> SignedRequest {
        let mut query = dedupe_keys(&request.query);
        // 호출자가 보낸 timestamp는 서명 시각으로 덮어씀 (위치는 유지)
        match query.iter_mut().find(|(k, _)| k == "timestamp") {
            Some(existing) => existing.1 = request.timestamp.clone(),
            None => query.push(("timestamp".to_string(), request.timestamp.clone())),
        }

        let canonical = encode_query(&query);
        let signature = hex::encode(hmac_sha256(&self.credentials.secret_key, &canonical));
        query.push(("signature".to_string(), signature));

        SignedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            query,
            headers: vec![
                ("X-BX-APIKEY".to_string(), self.credentials.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: if request.method == Method::POST {
                request.body.clone()
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> BingxSigner {
        BingxSigner::new(ApiCredentials::from_parts(Some("key"), Some("secret"), None).unwrap())
    }

    fn request(query: &[(&str, &str)]) -> SignRequest {
        SignRequest::new(Method::GET, "/openApi/swap/v2/trade/allOrders", "1700000000000")
            .with_query(
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
    }

    #[test]
    fn test_known_signature() {
        let signed = signer().sign(&request(&[("symbol", "BTC-USDT"), ("limit", "5")]));
        assert_eq!(
            signed.path_and_query(),
            "/openApi/swap/v2/trade/allOrders?symbol=BTC-USDT&limit=5&timestamp=1700000000000\
             &signature=1f034c6a567d43fe751a26572ca550d8ed441f0a3f986712a444a8d98026893b"
        );
        assert_eq!(signed.header("X-BX-APIKEY"), Some("key"));
    }

    #[test]
    fn test_deterministic() {
        let req = request(&[("symbol", "BTC-USDT")]);
        assert_eq!(signer().sign(&req), signer().sign(&req));
    }

    #[test]
    fn test_input_order_changes_signature() {
        let a = signer().sign(&request(&[("symbol", "BTC-USDT"), ("limit", "5")]));
        let b = signer().sign(&request(&[("limit", "5"), ("symbol", "BTC-USDT")]));
        assert_ne!(a.query.last(), b.query.last());
        assert_eq!(
            b.query.last().map(|(_, v)| v.as_str()),
            Some("ed8af7452e7118342d8889ecab9ef032dcaaa2ca0c5e5b431035b2dee57a2bae")
        );
    }

    #[test]
    fn test_body_only_for_post() {
        let get = request(&[]).with_body("{}");
        assert!(signer().sign(&get).body.is_none());

        let mut post = request(&[]).with_body("{\"a\":1}");
        post.method = Method::POST;
        assert_eq!(signer().sign(&post).body.as_deref(), Some("{\"a\":1}"));
    }
}
