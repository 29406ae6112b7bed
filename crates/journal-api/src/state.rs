//! 애플리케이션 상태.
//!
//! 저장소 핸들은 trait 객체로 들고 있으며 핸들러가 호출마다 명시적으로 넘깁니다.

use std::sync::Arc;

use journal_core::{InMemoryCredentialStore, InMemoryTradeStore, TradeStore, WebhookCredentialStore};
use journal_exchange::{ExchangeProxy, ProxyError};
use journal_import::{ReconcileOptions, Reconciler};

use crate::config::ServerConfig;

pub struct AppState {
    pub proxy: ExchangeProxy,
    pub trades: Arc<dyn TradeStore>,
    pub webhook_credentials: Arc<dyn WebhookCredentialStore>,
    pub reconciler: Reconciler,
    pub version: &'static str,
}

impl AppState {
    pub fn new(
        proxy: ExchangeProxy,
        trades: Arc<dyn TradeStore>,
        webhook_credentials: Arc<dyn WebhookCredentialStore>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            proxy,
            trades,
            webhook_credentials,
            reconciler,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// 인메모리 저장소로 상태를 만듭니다 (`DATABASE_URL` 미설정, 테스트).
    pub fn in_memory(config: &ServerConfig) -> Result<Self, ProxyError> {
        Ok(Self::new(
            ExchangeProxy::new(config.endpoints.clone(), config.upstream_timeout())?,
            Arc::new(InMemoryTradeStore::new()),
            Arc::new(InMemoryCredentialStore::new()),
            Reconciler::new(ReconcileOptions {
                timezone: config.import_timezone,
            }),
        ))
    }
}
