use chrono::{DateTime, FixedOffset};

use crate::error::LoadError;

/// 迁移方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// 一个版本的迁移（up 必须存在，down 可选）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationVersion {
    pub version: String,
    pub up_sql: String,
    pub down_sql: Option<String>,
    pub applied_at: Option<DateTime<FixedOffset>>,
}

impl MigrationVersion {
    pub fn has_down(&self) -> bool {
        self.down_sql.is_some()
    }
}

/// 解析后的迁移文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFileName {
    pub version: String,
    pub name: String,
    pub direction: Direction,
}

/// 解析 `<version>_<name>.<direction>.sql`
///
/// 不属于迁移文件的名字返回 `Ok(None)`，调用方直接跳过。
/// 版本号为空时报错，因为这类文件显然是想成为迁移文件的。
pub fn parse_file_name(file_name: &str) -> Result<Option<MigrationFileName>, LoadError> {
    let Some(stem) = file_name.strip_suffix(".sql") else {
        return Ok(None);
    };

    let Some((version, rest)) = stem.split_once('_') else {
        return Ok(None);
    };

    let parts: Vec<&str> = rest.split('.').collect();
    let [name, direction] = parts.as_slice() else {
        return Ok(None);
    };

    let direction = match *direction {
        "up" => Direction::Up,
        "down" => Direction::Down,
        _ => return Ok(None),
    };

    if version.is_empty() {
        return Err(LoadError::InvalidName(file_name.to_string()));
    }

    Ok(Some(MigrationFileName {
        version: version.to_string(),
        name: name.to_string(),
        direction,
    }))
}
