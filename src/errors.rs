use migration::MigrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Datastore unavailable: {0}")]
    DatastoreUnavailable(String),

    // 迁移错误
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    // 用户输入错误（以回复形式返回给用户）
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    // Telegram 通信错误
    #[error("Transport error: {0}")]
    Transport(String),

    // 通用错误
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "E001",
            AppError::DatastoreUnavailable(_) => "E002",
            AppError::Migration(e) if e.is_rollback() => "E004",
            AppError::Migration(MigrationError::Load(_)) => "E003",
            AppError::Migration(_) => "E005",
            AppError::Validation(_) => "E006",
            AppError::NotFound(_) => "E007",
            AppError::Transport(_) => "E008",
            AppError::Internal(_) => "E009",
            AppError::Config(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database Error",
            AppError::DatastoreUnavailable(_) => "Datastore Unavailable",
            AppError::Migration(e) if e.is_rollback() => "Rollback Error",
            AppError::Migration(MigrationError::Load(_)) => "Migration Load Error",
            AppError::Migration(_) => "Migration Apply Error",
            AppError::Validation(_) => "Validation Error",
            AppError::NotFound(_) => "Not Found",
            AppError::Transport(_) => "Transport Error",
            AppError::Internal(_) => "Internal Error",
            AppError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// 可以直接作为聊天回复展示给用户的错误
    pub fn is_user_facing(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::NotFound(_))
    }

    /// 格式化为彩色输出（用于致命错误）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }
}

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        AppError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::LoadError;

    #[test]
    fn test_user_facing_errors() {
        assert!(AppError::Validation("bad".into()).is_user_facing());
        assert!(AppError::NotFound("missing".into()).is_user_facing());
        assert!(!AppError::Internal("boom".into()).is_user_facing());
        assert!(!AppError::Database(sea_orm::DbErr::Custom("x".into())).is_user_facing());
    }

    #[test]
    fn test_migration_error_codes() {
        let load = AppError::from(MigrationError::Load(LoadError::MissingUp("001".into())));
        assert_eq!(load.code(), "E003");

        let rollback = AppError::from(MigrationError::NoDownMigration("001".into()));
        assert_eq!(rollback.code(), "E004");
        assert_eq!(rollback.error_type(), "Rollback Error");

        let apply = AppError::from(MigrationError::Apply {
            version: "002".into(),
            source: sea_orm::DbErr::Custom("syntax".into()),
        });
        assert_eq!(apply.code(), "E005");
    }

    #[test]
    fn test_format_simple() {
        let err = AppError::Config("TELEGRAM_BOT_TOKEN is required".into());
        assert_eq!(
            err.format_simple(),
            "[E010] Configuration Error: Configuration error: TELEGRAM_BOT_TOKEN is required"
        );
    }
}
