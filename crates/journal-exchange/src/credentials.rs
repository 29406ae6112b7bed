//! 거래소 API 자격증명.

use secrecy::SecretString;

use crate::error::CredentialError;

/// 요청 단위로 전달받는 API 자격증명. 서버에 저장하지 않습니다.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret_key: SecretString,
    pub passphrase: Option<SecretString>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &mask(&self.api_key))
            .field("secret_key", &"***")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ApiCredentials {
    /// 헤더/본문에서 꺼낸 값으로 자격증명을 만듭니다. 빈 문자열은 누락으로 취급합니다.
    pub fn from_parts(
        api_key: Option<&str>,
        secret_key: Option<&str>,
        passphrase: Option<&str>,
    ) -> Result<Self, CredentialError> {
        let api_key = non_empty(api_key).ok_or(CredentialError::MissingApiKey)?;
        let secret_key = non_empty(secret_key).ok_or(CredentialError::MissingSecretKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            secret_key: SecretString::from(secret_key.to_string()),
            passphrase: non_empty(passphrase).map(|p| SecretString::from(p.to_string())),
        })
    }

    /// 로그용 마스킹된 API 키.
    pub fn masked_api_key(&self) -> String {
        mask(&self.api_key)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 앞 4자리만 남기고 가립니다.
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts() {
        assert_eq!(
            ApiCredentials::from_parts(None, Some("s"), None).unwrap_err(),
            CredentialError::MissingApiKey
        );
        assert_eq!(
            ApiCredentials::from_parts(Some("k"), Some("  "), None).unwrap_err(),
            CredentialError::MissingSecretKey
        );
        let creds = ApiCredentials::from_parts(Some("k"), Some("s"), Some("")).unwrap();
        assert!(creds.passphrase.is_none());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let creds =
            ApiCredentials::from_parts(Some("abcdef123"), Some("topsecret"), Some("phrase"))
                .unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("abcd***"));
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("\"phrase\""));
        assert!(!debug.contains("abcdef123"));
    }
}
