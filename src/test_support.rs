//! 测试辅助：内存 SQLite + 仓库自带的 migrations/sqlite 脚本

use std::path::PathBuf;
use std::sync::Arc;

use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};

/// 仓库里的迁移根目录
pub fn migrations_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// 创建测试用的内存数据库并执行迁移
pub async fn setup_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::new(migrations_root().join("sqlite"))
        .up(&db)
        .await
        .expect("Failed to run migrations");

    Arc::new(db)
}
