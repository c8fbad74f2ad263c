use barbershop_bot::config::{RunMode, args};
use barbershop_bot::runtime::{self, StartupContext};
use barbershop_bot::system::install_panic_hook;
use barbershop_bot::{AppConfig, AppError};
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // 安装 panic hook
    install_panic_hook();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e.format_simple());
            eprintln!("{}", e.format_colored());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    // 解析命令行参数
    let cli_args: Vec<String> = env::args().collect();
    let config_path = args::parse_config_path(&cli_args);
    let mode = args::parse_run_mode(&cli_args)?;

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[WARN] .env not loaded: {}", e);
    }

    let config = AppConfig::load(config_path.as_deref());
    let ctx = runtime::prepare(config).await?;

    match mode {
        RunMode::Rollback(version) => runtime::rollback(&ctx, &version).await,
        RunMode::Migrate => runtime::run_migrations(&ctx).await.map(|_| ()),
        RunMode::Serve => serve(&ctx).await,
    }
}

async fn serve(ctx: &StartupContext) -> Result<(), AppError> {
    runtime::run_migrations(ctx).await?;
    tracing::info!("barbershop-bot is ready");

    tokio::select! {
        result = runtime::run_bot(ctx) => result?,
        _ = runtime::listen_for_shutdown() => {
            tracing::info!("收到关闭信号，正在停止 bot...");
        }
    }

    Ok(())
}
