//! 迁移文件加载
//!
//! 每次调用都重新扫描目录，不做缓存：迁移只在启动和回滚时读取。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::version::{Direction, MigrationFileName, MigrationVersion, parse_file_name};

#[derive(Debug, Default)]
struct PartialVersion {
    up_sql: Option<String>,
    down_sql: Option<String>,
}

/// 按版本号累积 up/down 片段，最后一次性校验完整性
#[derive(Debug, Default)]
pub struct MigrationSetBuilder {
    versions: BTreeMap<String, PartialVersion>,
}

impl MigrationSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一个片段；同一版本同一方向出现两次视为错误
    pub fn add(&mut self, file: &MigrationFileName, body: String) -> Result<(), LoadError> {
        let entry = self.versions.entry(file.version.clone()).or_default();
        let slot = match file.direction {
            Direction::Up => &mut entry.up_sql,
            Direction::Down => &mut entry.down_sql,
        };

        if slot.is_some() {
            return Err(LoadError::Duplicate {
                version: file.version.clone(),
                direction: file.direction.as_str(),
            });
        }

        // 只有空白的脚本等同于不存在
        if !body.trim().is_empty() {
            *slot = Some(body);
        }
        Ok(())
    }

    /// 校验每个版本都有 up 脚本，并按版本号字符串升序返回
    pub fn build(self) -> Result<Vec<MigrationVersion>, LoadError> {
        self.versions
            .into_iter()
            .map(|(version, partial)| -> Result<MigrationVersion, LoadError> {
                let up_sql = partial
                    .up_sql
                    .ok_or_else(|| LoadError::MissingUp(version.clone()))?;
                Ok(MigrationVersion {
                    version,
                    up_sql,
                    down_sql: partial.down_sql,
                    applied_at: None,
                })
            })
            .collect()
    }
}

/// 从目录加载全部迁移
pub fn load_all(dir: &Path) -> Result<Vec<MigrationVersion>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut builder = MigrationSetBuilder::new();

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::debug!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };

        let Some(parsed) = parse_file_name(file_name)? else {
            tracing::debug!("Skipping non-migration entry: {}", file_name);
            continue;
        };

        let path = entry.path();
        let body = fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })?;
        builder.add(&parsed, body)?;
    }

    builder.build()
}
