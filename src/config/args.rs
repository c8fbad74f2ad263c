//! 命令行参数解析
//!
//! 参数很少（配置路径 + 两个运行模式开关），不值得引入完整的 CLI 框架。

use crate::errors::AppError;

/// 进程运行模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// 执行待处理迁移后启动 bot
    Serve,
    /// 只执行迁移然后退出
    Migrate,
    /// 回滚指定版本然后退出
    Rollback(String),
}

/// 从命令行参数解析配置文件路径
///
/// 支持 `-c path`、`--config path`、`-c=path`、`--config=path`，
/// `args[0]` 是程序名。
pub fn parse_config_path(args: &[String]) -> Option<String> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "-c" || arg == "--config" {
            if let Some(path) = iter.next() {
                return Some(path.clone());
            }
        } else if let Some(path) = arg
            .strip_prefix("-c=")
            .or_else(|| arg.strip_prefix("--config="))
        {
            return Some(path.to_string());
        }
    }
    None
}

/// 移除 `-c`/`--config` 及其值，避免干扰模式检测
pub fn filter_config_args(args: &[String]) -> Vec<String> {
    let mut filtered = Vec::with_capacity(args.len());
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        if (arg == "-c" || arg == "--config") && iter.peek().is_some() {
            iter.next();
            continue;
        }
        if arg.starts_with("-c=") || arg.starts_with("--config=") {
            continue;
        }
        filtered.push(arg.clone());
    }

    filtered
}

/// 从命令行参数解析运行模式
///
/// 支持 `--migrate`、`--rollback=<version>` 和 `--rollback <version>`。
/// 同时给出时回滚优先。其余以 `-` 开头的参数视为错误。
pub fn parse_run_mode(args: &[String]) -> Result<RunMode, AppError> {
    let args = filter_config_args(args);
    let mut migrate = false;
    let mut rollback: Option<String> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--migrate" {
            migrate = true;
        } else if let Some(version) = arg.strip_prefix("--rollback=") {
            rollback = Some(version.to_string());
        } else if arg == "--rollback" {
            let version = iter
                .next()
                .ok_or_else(|| AppError::Config("--rollback requires a version".into()))?;
            rollback = Some(version.clone());
        } else if arg.starts_with('-') {
            return Err(AppError::Config(format!("Unknown argument: {}", arg)));
        }
    }

    match rollback {
        Some(version) if version.trim().is_empty() => {
            Err(AppError::Config("--rollback requires a version".into()))
        }
        Some(version) => Ok(RunMode::Rollback(version)),
        None if migrate => Ok(RunMode::Migrate),
        None => Ok(RunMode::Serve),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_config_path_forms() {
        for args in [
            &["program", "-c", "bot.toml"][..],
            &["program", "--config", "bot.toml"],
            &["program", "-c=bot.toml"],
            &["program", "--migrate", "--config=bot.toml"],
        ] {
            assert_eq!(parse_config_path(&to_args(args)), Some("bot.toml".to_string()));
        }
        assert_eq!(parse_config_path(&to_args(&["program", "--migrate"])), None);
        assert_eq!(parse_config_path(&to_args(&["program", "-c"])), None);
    }

    #[test]
    fn test_filter_config_args() {
        let filtered = filter_config_args(&to_args(&["program", "-c", "bot.toml", "--migrate"]));
        assert_eq!(filtered, to_args(&["program", "--migrate"]));

        let filtered = filter_config_args(&to_args(&["program", "--config=bot.toml", "--migrate"]));
        assert_eq!(filtered, to_args(&["program", "--migrate"]));
    }

    #[test]
    fn test_run_mode_default_is_serve() {
        assert_eq!(parse_run_mode(&to_args(&["program"])).unwrap(), RunMode::Serve);
        assert_eq!(
            parse_run_mode(&to_args(&["program", "-c", "bot.toml"])).unwrap(),
            RunMode::Serve
        );
    }

    #[test]
    fn test_run_mode_migrate() {
        assert_eq!(
            parse_run_mode(&to_args(&["program", "--config=bot.toml", "--migrate"])).unwrap(),
            RunMode::Migrate
        );
    }

    #[test]
    fn test_run_mode_rollback_forms() {
        assert_eq!(
            parse_run_mode(&to_args(&["program", "--rollback=002"])).unwrap(),
            RunMode::Rollback("002".into())
        );
        assert_eq!(
            parse_run_mode(&to_args(&["program", "--rollback", "002"])).unwrap(),
            RunMode::Rollback("002".into())
        );
        // 回滚优先于迁移
        assert_eq!(
            parse_run_mode(&to_args(&["program", "--migrate", "--rollback=001"])).unwrap(),
            RunMode::Rollback("001".into())
        );
    }

    #[test]
    fn test_run_mode_errors() {
        assert!(parse_run_mode(&to_args(&["program", "--rollback="])).is_err());
        assert!(parse_run_mode(&to_args(&["program", "--rollback"])).is_err());
        assert!(parse_run_mode(&to_args(&["program", "--serve"])).is_err());
    }
}
