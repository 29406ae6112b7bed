//! Bitget 서명.
//!
//! prehash = `timestamp + METHOD + path[?query] + body`, HMAC-SHA256 결과를 base64로
//! `ACCESS-SIGN` 헤더에 담습니다. passphrase가 필수입니다.

use base64::{engine::general_purpose::STANDARD, Engine};
use secrecy::{ExposeSecret, SecretString};

use super::{encode_query, hmac_sha256, SignRequest, SignedRequest};
use crate::{credentials::ApiCredentials, error::CredentialError};

#[derive(Debug, Clone)]
pub struct BitgetSigner {
    credentials: ApiCredentials,
    passphrase: SecretString,
}

impl BitgetSigner {
    pub fn new(credentials: ApiCredentials) -> Result<Self, CredentialError> {
        let passphrase = credentials
            .passphrase
            .clone()
            .ok_or(CredentialError::MissingPassphrase)?;
        Ok(Self {
            credentials,
            passphrase,
        })
    }

    pub fn sign(&self, request: &SignRequest) -> SignedRequest {
        let method = request.method.as_str().to_uppercase();
        let query = encode_query(&request.query);
        let path = if query.is_empty() {
            request.path.clone()
        } else {
            format!("{}?{}", request.path, query)
        };
        let body = request.body.clone().unwrap_or_default();

        let prehash = format!("{}{}{}{}", request.timestamp, method, path, body);
        let signature = STANDARD.encode(hmac_sha256(&self.credentials.secret_key, &prehash));

        SignedRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            headers: vec![
                ("ACCESS-KEY".to_string(), self.credentials.api_key.clone()),
                ("ACCESS-SIGN".to_string(), signature),
                ("ACCESS-TIMESTAMP".to_string(), request.timestamp.clone()),
                (
                    "ACCESS-PASSPHRASE".to_string(),
                    self.passphrase.expose_secret().to_string(),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("locale".to_string(), "en-US".to_string()),
            ],
            body: request.body.clone().filter(|b| !b.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;

    fn signer() -> BitgetSigner {
        BitgetSigner::new(
            ApiCredentials::from_parts(Some("key"), Some("secret"), Some("phrase")).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_get_with_query() {
        let req = SignRequest::new(Method::GET, "/api/v2/mix/order/fills", "1700000000000")
            .with_query(vec![("productType".to_string(), "USDT-FUTURES".to_string())]);
        let signed = signer().sign(&req);

        assert_eq!(
            signed.header("ACCESS-SIGN"),
            Some("36yyEgZdvuOCLYRk4YdVZwHj88+LRufzDKNVKH8UPwY=")
        );
        assert_eq!(signed.header("ACCESS-TIMESTAMP"), Some("1700000000000"));
        assert_eq!(signed.header("ACCESS-PASSPHRASE"), Some("phrase"));
        assert_eq!(signed.header("locale"), Some("en-US"));
        assert_eq!(
            signed.path_and_query(),
            "/api/v2/mix/order/fills?productType=USDT-FUTURES"
        );
    }

    #[test]
    fn test_post_body_in_prehash() {
        let req = SignRequest::new(Method::POST, "/api/v2/mix/order/place-order", "1700000000000")
            .with_body(r#"{"symbol":"BTCUSDT"}"#);
        let signed = signer().sign(&req);

        assert_eq!(
            signed.header("ACCESS-SIGN"),
            Some("C/vSpmkAdkJHFrpOiYGEkV5HK8LKTTJ44CrlBsnfknQ=")
        );
        assert_eq!(signed.body.as_deref(), Some(r#"{"symbol":"BTCUSDT"}"#));
    }

    #[test]
    fn test_deterministic() {
        let req = SignRequest::new(Method::GET, "/api/v2/account", "42");
        assert_eq!(signer().sign(&req), signer().sign(&req));
    }
}
