//! 환경변수 기반 서버 설정.

use std::{net::SocketAddr, time::Duration};

use chrono_tz::Tz;
use journal_exchange::ExchangeEndpoints;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT` (`json`이면 JSON, 그 외 pretty)
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// 서버 설정.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// Postgres URL. 없으면 인메모리 저장소
    pub database_url: Option<String>,
    /// 거래소 기본 URL
    pub endpoints: ExchangeEndpoints,
    /// 업스트림 요청 타임아웃 (초)
    pub upstream_timeout_secs: u64,
    /// 오프셋 없는 브로커 타임스탬프의 시간대
    pub import_timezone: Tz,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8003,
            database_url: None,
            endpoints: ExchangeEndpoints::default(),
            upstream_timeout_secs: 15,
            import_timezone: Tz::UTC,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드. 잘못된 값은 기본값으로 대체합니다.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_var_parse("API_PORT", defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            endpoints: ExchangeEndpoints {
                bingx: std::env::var("BINGX_BASE_URL").unwrap_or(defaults.endpoints.bingx),
                bitget: std::env::var("BITGET_BASE_URL").unwrap_or(defaults.endpoints.bitget),
                mexc: std::env::var("MEXC_BASE_URL").unwrap_or(defaults.endpoints.mexc),
            },
            upstream_timeout_secs: env_var_parse(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout_secs,
            ),
            import_timezone: env_var_parse("IMPORT_TIMEZONE", defaults.import_timezone),
            log_format: LogFormat::from_env(),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
