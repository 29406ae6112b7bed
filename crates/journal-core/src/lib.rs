//! 트레이딩 저널 핵심 도메인.
//!
//! 브로커 체결(`RawExecution`)과 완결된 왕복 거래(`NormalizedTrade`),
//! 액션 어휘 분류, 선물 승수 테이블, 손익 계산, 저장소 trait을 제공합니다.
//!
//! # 모듈 구성
//!
//! ```text
//! journal-core
//! ├── action     - 브로커 액션 문자열 → {OpenLong, CloseLong, OpenShort, CloseShort}
//! ├── execution  - RawExecution, 결정적 fingerprint
//! ├── pnl        - 계약 승수 테이블, 총손익 계산
//! ├── trade      - NormalizedTrade, OpenPosition, TradeResult (±0.01 데드밴드)
//! ├── store      - TradeStore / WebhookCredentialStore trait + 인메모리 구현
//! └── error      - CoreError, StoreError
//! ```

pub mod action;
pub mod error;
pub mod execution;
pub mod pnl;
pub mod store;
pub mod trade;

pub use action::{classify_action, ActionClass, ActionVerb, EntryExit};
pub use error::{CoreError, StoreError};
pub use execution::{fingerprint, RawExecution};
pub use pnl::{contract_for, gross_pnl, multiplier_for, ContractSpec};
pub use store::{
    AccountRecord, InMemoryCredentialStore, InMemoryTradeStore, TradeStore, WebhookCredential,
    WebhookCredentialStore,
};
pub use trade::{
    NormalizedTrade, OpenPosition, TradeDraft, TradeResult, TradeSide, BREAKEVEN_DEADBAND,
};
