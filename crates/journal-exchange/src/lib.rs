//! 거래소 요청 서명과 업스트림 전달.
//!
//! 브라우저 저널이 보낸 요청에 거래소별 HMAC-SHA256 서명을 붙여
//! BingX, Bitget, MEXC REST API로 그대로 전달합니다.
//!
//! # 아키텍처
//!
//! ```text
//! journal-exchange
//! ├── credentials  - ApiCredentials (SecretString, 마스킹된 Debug)
//! ├── signer       - RequestSigner { BingX, Bitget, Mexc }
//! │   ├── bingx    - 입력 순서 쿼리 + timestamp, hex, `signature` 파라미터
//! │   ├── bitget   - ts + METHOD + path[?q] + body, base64, ACCESS-* 헤더
//! │   └── mexc     - apiKey + ts + 정렬된 파라미터, hex, ApiKey/Request-Time/Signature
//! └── proxy        - ExchangeProxy (reqwest, 상태 코드/JSON 그대로 전달)
//! ```
//!
//! 자격증명 검증은 서명기 생성 시점에 끝나므로 서명 자체는 실패하지 않습니다.

pub mod credentials;
pub mod error;
pub mod proxy;
pub mod signer;

pub use credentials::ApiCredentials;
pub use error::{CredentialError, ProxyError};
pub use proxy::{ExchangeEndpoints, ExchangeProxy, UpstreamResponse};
pub use signer::{Exchange, RequestSigner, SignRequest, SignedRequest};
