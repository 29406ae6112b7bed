//! 트레이딩 저널 게이트웨이 API.
//!
//! 브라우저 저널을 위한 거래소 서명 프록시(BingX, Bitget, MEXC),
//! NinjaTrader 웹훅 수신, 브로커 내보내기 가져오기 엔드포인트를 제공합니다.
//!
//! # 모듈 구성
//!
//! ```text
//! journal-api
//! ├── config      - ServerConfig (환경변수)
//! ├── error       - ApiError → {success:false, error} JSON
//! ├── repository  - Postgres 저장소 (sqlx)
//! ├── routes      - axum 라우터와 핸들러
//! └── state       - AppState (프록시, 저장소 핸들, 리컨실러)
//! ```

pub mod config;
pub mod error;
pub mod repository;
pub mod routes;
pub mod state;

pub use config::{LogFormat, ServerConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
