use sea_orm::sqlx::SqlitePool;
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::errors::AppError;

const MAINTENANCE_DATABASE: &str = "postgres";

/// 连接 SQLite 数据库（本地开发用，带自动创建）
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection, AppError> {
    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("SQLite URL 解析失败: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePool::connect_with(opt)
        .await
        .map_err(|e| AppError::DatastoreUnavailable(format!("无法连接到 SQLite 数据库: {}", e)))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 连接 PostgreSQL
pub async fn connect_postgres(
    database_url: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::DatastoreUnavailable(e.to_string()))
}

/// 目标数据库不存在时通过 `postgres` 维护库创建
///
/// 这里的失败只记录日志：随后的正式连接和 ping 才决定是否致命。
pub async fn ensure_postgres_database(database_url: &str) {
    let target = match PgConnectOptions::from_str(database_url) {
        Ok(opt) => opt,
        Err(e) => {
            tracing::warn!("Cannot parse PostgreSQL URL: {}", e);
            return;
        }
    };
    let Some(name) = target.get_database().map(str::to_string) else {
        return;
    };
    if name == MAINTENANCE_DATABASE {
        return;
    }

    let pool = match PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(8))
        .connect_with(target.database(MAINTENANCE_DATABASE))
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("Cannot connect to maintenance database: {}", e);
            return;
        }
    };

    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&name)
        .fetch_optional(&pool)
        .await;

    match exists {
        Ok(Some(_)) => tracing::info!("Database {} already exists", name),
        Ok(None) => {
            let sql = format!("CREATE DATABASE \"{}\"", name.replace('"', "\"\""));
            match sqlx::query(&sql).execute(&pool).await {
                Ok(_) => tracing::info!("Database {} created", name),
                Err(e) => tracing::warn!("Create database error: {}", e),
            }
        }
        Err(e) => tracing::warn!("Error checking database existence: {}", e),
    }

    pool.close().await;
}

/// 智能连接数据库（自动识别类型）并确认可用
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let db = if config.url.starts_with("sqlite://") || config.url.starts_with("sqlite:") {
        tracing::info!("使用 SQLite 数据库");
        connect_sqlite(&config.url).await?
    } else if config.url.starts_with("postgres://") || config.url.starts_with("postgresql://") {
        tracing::info!("使用 PostgreSQL 数据库");
        if config.create_if_missing {
            ensure_postgres_database(&config.url).await;
        }
        connect_postgres(&config.url, config).await?
    } else {
        return Err(AppError::Config(format!(
            "不支持的数据库类型: {}",
            config.url
        )));
    };

    db.ping()
        .await
        .map_err(|e| AppError::DatastoreUnavailable(format!("Cannot ping database: {}", e)))?;

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_url() {
        let config = DatabaseConfig {
            url: "mysql://localhost/barbershop".into(),
            ..Default::default()
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_sqlite_file_connects_and_pings() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("bot.db").display()),
            ..Default::default()
        };
        let db = connect(&config).await.unwrap();
        assert!(db.ping().await.is_ok());
    }
}
