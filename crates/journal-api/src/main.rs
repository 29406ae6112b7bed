//! 트레이딩 저널 API 서버.

use std::sync::Arc;

use journal_api::{
    create_router,
    repository::{self, PgTradeRepository, PgWebhookCredentialRepository},
    AppState, LogFormat, ServerConfig,
};
use journal_exchange::ExchangeProxy;
use journal_import::{ReconcileOptions, Reconciler};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// tracing 초기화. `LOG_FORMAT=json`이면 JSON 출력.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "journal_api=info,tower_http=debug".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// AppState 초기화. `DATABASE_URL`이 없으면 인메모리 저장소.
async fn create_app_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
        return Ok(AppState::in_memory(config)?);
    };

    let pool = repository::connect(database_url).await?;
    info!("Connected to Postgres");

    Ok(AppState::new(
        ExchangeProxy::new(config.endpoints.clone(), config.upstream_timeout())?,
        Arc::new(PgTradeRepository::new(pool.clone())),
        Arc::new(PgWebhookCredentialRepository::new(pool)),
        Reconciler::new(ReconcileOptions {
            timezone: config.import_timezone,
        }),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    info!("Starting journal API server...");

    let addr = config.socket_addr().map_err(|e| {
        error!(
            host = %config.host,
            port = config.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    let state = Arc::new(create_app_state(&config).await?);
    info!(
        version = state.version,
        timezone = %config.import_timezone,
        upstream_timeout_secs = config.upstream_timeout_secs,
        has_db = config.database_url.is_some(),
        "Application state initialized"
    );

    let app = create_router(state);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
