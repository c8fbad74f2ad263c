use std::path::{Path, PathBuf};

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

use crate::error::MigrationError;
use crate::loader::load_all;
use crate::store::SchemaStore;
use crate::version::MigrationVersion;

/// 基于 SQL 文件目录的迁移执行器
///
/// 假定启动阶段独占写入，不处理多个进程同时迁移的竞争。
#[derive(Debug, Clone)]
pub struct Migrator {
    dir: PathBuf,
}

impl Migrator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 目录中的全部版本，已应用的带上应用时间
    pub async fn status(&self, db: &DatabaseConnection) -> Result<Vec<MigrationVersion>, MigrationError> {
        let mut versions = load_all(&self.dir)?;
        SchemaStore::ensure_table(db).await?;
        let applied = SchemaStore::list_applied(db).await?;

        for version in &mut versions {
            version.applied_at = applied.get(&version.version).copied();
        }
        Ok(versions)
    }

    /// 尚未应用的版本（升序）
    pub async fn pending(&self, db: &DatabaseConnection) -> Result<Vec<MigrationVersion>, MigrationError> {
        // 先加载文件：文件集合有问题时不碰数据库
        let versions = load_all(&self.dir)?;
        SchemaStore::ensure_table(db).await?;
        let applied = SchemaStore::list_applied(db).await?;

        Ok(versions
            .into_iter()
            .filter(|v| !applied.contains_key(&v.version))
            .collect())
    }

    /// 按版本顺序应用所有待执行迁移，返回本次应用的版本号
    ///
    /// 任一版本失败时该版本整体回滚，后续版本不再尝试。
    pub async fn up(&self, db: &DatabaseConnection) -> Result<Vec<String>, MigrationError> {
        tracing::info!("Running database migrations from {}", self.dir.display());

        let pending = self.pending(db).await?;
        if !pending.is_empty() {
            let versions: Vec<&str> = pending.iter().map(|m| m.version.as_str()).collect();
            tracing::info!(count = pending.len(), "Pending migrations: {}", versions.join(", "));
        }
        let mut applied = Vec::with_capacity(pending.len());

        for migration in pending {
            tracing::info!(version = %migration.version, "Applying migration");

            apply_one(db, &migration)
                .await
                .map_err(|source| MigrationError::Apply {
                    version: migration.version.clone(),
                    source,
                })?;

            tracing::info!(version = %migration.version, "Migration applied");
            applied.push(migration.version);
        }

        if applied.is_empty() {
            tracing::info!("Database schema is up to date");
        } else {
            tracing::info!("Applied {} migration(s)", applied.len());
        }
        Ok(applied)
    }

    /// 回滚单个版本：执行 down 脚本并删除记录，两者在同一事务里
    pub async fn rollback(&self, db: &DatabaseConnection, version: &str) -> Result<(), MigrationError> {
        let versions = load_all(&self.dir)?;

        let target = versions
            .into_iter()
            .find(|v| v.version == version)
            .ok_or_else(|| MigrationError::NotFound(version.to_string()))?;

        let down_sql = target
            .down_sql
            .ok_or_else(|| MigrationError::NoDownMigration(version.to_string()))?;

        SchemaStore::ensure_table(db).await?;
        if !SchemaStore::list_applied(db).await?.contains_key(version) {
            tracing::warn!(version, "Rolling back a migration that is not recorded as applied");
        }

        tracing::info!(version, "Rolling back migration");

        revert_one(db, version, &down_sql)
            .await
            .map_err(|source| MigrationError::Rollback {
                version: version.to_string(),
                source,
            })?;

        tracing::info!(version, "Migration rolled back");
        Ok(())
    }
}

async fn apply_one(db: &DatabaseConnection, migration: &MigrationVersion) -> Result<(), DbErr> {
    // 事务在 commit 之前被丢弃即回滚
    let txn = db.begin().await?;
    txn.execute_unprepared(&migration.up_sql).await?;
    SchemaStore::record_applied(&txn, &migration.version, Utc::now()).await?;
    txn.commit().await
}

async fn revert_one(db: &DatabaseConnection, version: &str, down_sql: &str) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    txn.execute_unprepared(down_sql).await?;
    SchemaStore::remove_applied(&txn, version).await?;
    txn.commit().await
}
