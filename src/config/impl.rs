use std::env;
use std::fs;
use std::path::Path;

use super::{AppConfig, RolePolicyKind};
use crate::errors::AppError;

impl AppConfig {
    /// 从文件加载配置,支持环境变量覆盖
    ///
    /// # 参数
    /// * `config_path` - 可选的配置文件路径
    ///   - `Some(path)`: 使用指定文件（不存在则创建）
    ///   - `None`: 使用默认 "config.toml"（不存在则警告）
    pub fn load(config_path: Option<&str>) -> Self {
        let mut config = Self::load_from_file(config_path);
        config.override_with_env();
        config
    }

    /// 从 TOML 文件加载配置
    ///
    /// 日志系统此时还没有初始化，所以直接写 stderr。
    fn load_from_file(config_path: Option<&str>) -> Self {
        let path = config_path.unwrap_or("config.toml");
        let is_custom_path = config_path.is_some();

        if !Path::new(path).exists() {
            if is_custom_path {
                eprintln!("[WARN] 配置文件不存在: {}", path);
                eprintln!("[WARN] 正在创建默认配置文件...");
                if let Err(e) = Self::default().save_to_file(path) {
                    eprintln!("[ERROR] 创建配置文件失败 {}: {}", path, e);
                    eprintln!("[WARN] 使用内存默认配置");
                    return Self::default();
                }
                eprintln!("[INFO] 配置文件已创建: {}", path);
            } else {
                eprintln!("[WARN] 未找到配置文件: {}", path);
                eprintln!("[WARN] 使用内存默认配置");
                eprintln!("[HINT] 使用 -c/--config 指定自定义配置文件");
                return Self::default();
            }
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    eprintln!("[INFO] 配置已从文件加载: {}", path);
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] 解析配置文件失败 {}: {}", path, e);
                    eprintln!("[WARN] 使用内存默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] 读取配置文件失败 {}: {}", path, e);
                eprintln!("[WARN] 使用内存默认配置");
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    /// 用环境变量覆盖配置
    fn override_with_env(&mut self) {
        self.override_with(|key| env::var(key).ok());
    }

    /// 用任意键值来源覆盖配置（测试时可以不碰进程环境变量）
    pub fn override_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Bot 配置
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.bot.token = token;
        }
        if let Some(offset) = lookup("BOT_UTC_OFFSET_MINUTES") {
            if let Ok(n) = offset.parse() {
                self.bot.utc_offset_minutes = n;
            } else {
                eprintln!("[ERROR] 无效的 BOT_UTC_OFFSET_MINUTES: {}", offset);
            }
        }

        // 数据库配置
        if let Some(database_url) = lookup("DATABASE_URL") {
            self.database.url = database_url;
        }
        if let Some(max_conn) = lookup("DATABASE_MAX_CONNECTIONS") {
            if let Ok(n) = max_conn.parse() {
                self.database.max_connections = n;
            } else {
                eprintln!("[ERROR] 无效的 DATABASE_MAX_CONNECTIONS: {}", max_conn);
            }
        }
        if let Some(min_conn) = lookup("DATABASE_MIN_CONNECTIONS") {
            if let Ok(n) = min_conn.parse() {
                self.database.min_connections = n;
            } else {
                eprintln!("[ERROR] 无效的 DATABASE_MIN_CONNECTIONS: {}", min_conn);
            }
        }
        if let Some(create) = lookup("DATABASE_CREATE_IF_MISSING") {
            self.database.create_if_missing = parse_flag(&create);
        }

        // 迁移配置
        if let Some(dir) = lookup("MIGRATIONS_DIR") {
            self.migrations.dir = dir;
        }

        // 引导配置
        if let Some(policy) = lookup("BOOTSTRAP_POLICY") {
            match policy.as_str() {
                "promote" => self.bootstrap.policy = RolePolicyKind::Promote,
                "fixed" => self.bootstrap.policy = RolePolicyKind::Fixed,
                _ => eprintln!("[ERROR] 无效的 BOOTSTRAP_POLICY: {}", policy),
            }
        }
        if let Some(name) = lookup("BOOTSTRAP_ADMIN_USERNAME") {
            self.bootstrap.admin_username = Some(name).filter(|n| !n.is_empty());
        }
        if let Some(enable) = lookup("BOOTSTRAP_RECONCILE_INVITES") {
            self.bootstrap.reconcile_invites = parse_flag(&enable);
        }

        // 日志配置
        if let Some(level) = lookup("RUST_LOG") {
            self.log.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.log.format = format;
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.log.file = Some(file);
        }
        if let Some(enable) = lookup("LOG_ENABLE_ROTATION") {
            self.log.enable_rotation = parse_flag(&enable);
        }
        if let Some(backups) = lookup("LOG_MAX_BACKUPS") {
            if let Ok(n) = backups.parse() {
                self.log.max_backups = n;
            } else {
                eprintln!("[ERROR] 无效的 LOG_MAX_BACKUPS: {}", backups);
            }
        }
    }

    /// 保存当前配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        // 如果需要,创建父目录
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), AppError> {
        if self.bot.token.trim().is_empty() {
            return Err(AppError::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".into(),
            ));
        }

        if self.bot.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::Config(format!(
                "UTC offset must be within ±14 hours, got {} minutes",
                self.bot.utc_offset_minutes
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Config(
                "database.min_connections must not exceed database.max_connections".into(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::HashMap;

    fn config_with_token() -> AppConfig {
        let mut config = AppConfig::default();
        config.bot.token = "123:abc".into();
        config
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(config_with_token().validate().is_ok());
    }

    #[test]
    fn test_offset_and_pool_validation() {
        let mut config = config_with_token();
        config.bot.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());

        let mut config = config_with_token();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [bot]
            token = "t"

            [bootstrap]
            policy = "fixed"
            default_role = "client"
            "#,
        )
        .unwrap();

        assert_eq!(config.bot.token, "t");
        assert_eq!(config.bootstrap.policy, RolePolicyKind::Fixed);
        assert_eq!(config.bootstrap.default_role, Role::Client);
        assert_eq!(config.bootstrap.first_user_role, Role::Barber);
        assert_eq!(config.migrations.dir, "migrations");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_invalid_role_in_toml_is_error() {
        let err = AppConfig::from_toml("[bootstrap]\ndefault_role = \"owner\"\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_override_with_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "from-env"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "not-a-number"),
            ("MIGRATIONS_DIR", "/srv/migrations"),
            ("BOOTSTRAP_POLICY", "fixed"),
            ("BOOTSTRAP_ADMIN_USERNAME", "owner"),
            ("BOOTSTRAP_RECONCILE_INVITES", "1"),
            ("BOT_UTC_OFFSET_MINUTES", "180"),
        ]);

        let mut config = AppConfig::default();
        config.override_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.bot.token, "from-env");
        assert_eq!(config.bot.utc_offset_minutes, 180);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.migrations.dir, "/srv/migrations");
        assert_eq!(config.bootstrap.policy, RolePolicyKind::Fixed);
        assert_eq!(config.bootstrap.admin_username.as_deref(), Some("owner"));
        assert!(config.bootstrap.reconcile_invites);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = config_with_token();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.bot.token, "123:abc");
        assert_eq!(loaded.database.url, config.database.url);
    }
}
