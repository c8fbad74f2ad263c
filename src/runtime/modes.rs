use chrono::FixedOffset;
use migration::Migrator;
use sea_orm::{ConnectionTrait, DbBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::Bot;

use crate::bot::{CommandRouter, run_polling};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::runtime::startup::StartupContext;
use crate::storage::{SeaOrmBackend, policy_from_config};

/// 迁移根目录下按数据库类型区分的脚本目录
pub fn migrations_dir(root: &str, backend: DbBackend) -> Result<PathBuf, AppError> {
    let subdir = match backend {
        DbBackend::Postgres => "postgres",
        DbBackend::Sqlite => "sqlite",
        other => {
            return Err(AppError::Config(format!(
                "No migrations for database backend {:?}",
                other
            )));
        }
    };
    Ok(Path::new(root).join(subdir))
}

fn migrator(ctx: &StartupContext) -> Result<Migrator, AppError> {
    let dir = migrations_dir(&ctx.config.migrations.dir, ctx.db.get_database_backend())?;
    Ok(Migrator::new(dir))
}

/// 执行所有待处理迁移，返回本次应用的版本
pub async fn run_migrations(ctx: &StartupContext) -> Result<Vec<String>, AppError> {
    Ok(migrator(ctx)?.up(ctx.db.as_ref()).await?)
}

/// 回滚单个版本
pub async fn rollback(ctx: &StartupContext, version: &str) -> Result<(), AppError> {
    migrator(ctx)?.rollback(ctx.db.as_ref(), version).await?;
    tracing::info!(version, "Migration rolled back");
    Ok(())
}

/// 按配置组装存储后端和命令路由
pub fn build_router(
    db: Arc<sea_orm::DatabaseConnection>,
    config: &AppConfig,
) -> Result<CommandRouter, AppError> {
    let offset = FixedOffset::east_opt(config.bot.utc_offset_minutes * 60).ok_or_else(|| {
        AppError::Config(format!(
            "Invalid UTC offset: {} minutes",
            config.bot.utc_offset_minutes
        ))
    })?;

    let storage = SeaOrmBackend::new(db)
        .with_role_policy(policy_from_config(&config.bootstrap))
        .with_invite_reconciliation(config.bootstrap.reconcile_invites);

    Ok(CommandRouter::with_default_commands(Arc::new(storage), offset))
}

/// 运行 Telegram bot，直到轮询结束
pub async fn run_bot(ctx: &StartupContext) -> Result<(), AppError> {
    let router = build_router(ctx.db.clone(), &ctx.config)?;
    tracing::info!(commands = ?router.commands(), "Command router ready");

    let bot = Bot::new(&ctx.config.bot.token);
    run_polling(bot, Arc::new(router)).await;
    Ok(())
}
