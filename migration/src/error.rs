use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

/// 迁移文件集合本身有问题（启动时致命）
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read migrations from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration file name: {0}")]
    InvalidName(String),

    #[error("Duplicate {direction} migration for version {version}")]
    Duplicate { version: String, direction: &'static str },

    #[error("Missing up migration for version {0}")]
    MissingUp(String),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to apply migration {version}: {source}")]
    Apply {
        version: String,
        #[source]
        source: DbErr,
    },

    #[error("Migration {0} not found")]
    NotFound(String),

    #[error("No down migration available for version {0}")]
    NoDownMigration(String),

    #[error("Failed to roll back migration {version}: {source}")]
    Rollback {
        version: String,
        #[source]
        source: DbErr,
    },

    #[error("Schema store error: {0}")]
    Store(#[from] DbErr),
}

impl MigrationError {
    /// 是否属于回滚阶段的错误
    pub fn is_rollback(&self) -> bool {
        matches!(
            self,
            MigrationError::NotFound(_)
                | MigrationError::NoDownMigration(_)
                | MigrationError::Rollback { .. }
        )
    }
}
