use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// 初始化日志
///
/// 返回文件写入器的 guard，调用方需要持有到进程结束，否则缓冲日志会丢失。
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = match config.format.as_str() {
        "json" => fmt::layer().json().boxed(),
        // pretty format (default)
        _ => fmt::layer().pretty().boxed(),
    };

    let (file_layer, guard) = match config.file.as_deref().map(|path| file_appender(path, config)) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("[ERROR] 无法创建日志文件: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {}", config.level);
    guard
}

fn file_appender(
    path: &str,
    config: &LogConfig,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("barbershop-bot.log");

    let rotation = if config.enable_rotation {
        Rotation::DAILY
    } else {
        Rotation::NEVER
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix);
    if config.enable_rotation {
        builder = builder.max_log_files(config.max_backups.max(1) as usize);
    }
    builder.build(dir)
}
