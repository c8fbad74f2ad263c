use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::storage::connect;

/// 启动上下文
pub struct StartupContext {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    _log_guard: Option<WorkerGuard>,
}

/// 初始化进程：TLS、日志、配置校验、数据库连接
pub async fn prepare(config: AppConfig) -> Result<StartupContext, AppError> {
    // 1. 初始化 Rust-TLS
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| AppError::Internal("Failed to install crypto provider".into()))?;

    // 2. 初始化日志
    let log_guard = crate::system::init_logging(&config.log);
    tracing::info!("barbershop-bot v{} starting...", env!("CARGO_PKG_VERSION"));

    // 3. 验证配置
    config.validate()?;

    // 4. 连接数据库
    tracing::info!("Connecting to database...");
    let db = connect(&config.database).await?;
    tracing::info!("Database connected");

    Ok(StartupContext {
        db: Arc::new(db),
        config,
        _log_guard: log_guard,
    })
}
