//! MEXC 서명.
//!
//! 파라미터를 이름순으로 정렬해 form 인코딩하고 `apiKey + timestamp + query`에
//! HMAC-SHA256(hex)을 계산합니다. 정렬 덕분에 입력 순서와 무관합니다.

use super::{dedupe_keys, encode_query, hmac_sha256, SignRequest, SignedRequest};
use crate::credentials::ApiCredentials;

#[derive(Debug, Clone)]
pub struct MexcSigner {
    credentials: ApiCredentials,
}

impl MexcSigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    pub fn sign(&self, request: &SignRequest) -> SignedRequest {
        let mut query = dedupe_keys(&request.query);
        query.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical = format!(
            "{}{}{}",
            self.credentials.api_key,
            request.timestamp,
            encode_query(&query)
        );
        let signature = hex::encode(hmac_sha256(&self.credentials.secret_key, &canonical));

        SignedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            query,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("ApiKey".to_string(), self.credentials.api_key.clone()),
                ("Request-Time".to_string(), request.timestamp.clone()),
                ("Signature".to_string(), signature),
            ],
            body: None,
        }
    }
}
