//! SQL 文件迁移
//!
//! 迁移目录中每个版本由 `<version>_<name>.up.sql` 和可选的
//! `<version>_<name>.down.sql` 组成，版本号按字符串排序，建议补零。

pub mod error;
pub mod loader;
pub mod runner;
pub mod store;
pub mod version;

pub use error::{LoadError, MigrationError};
pub use loader::{MigrationSetBuilder, load_all};
pub use runner::Migrator;
pub use store::SchemaStore;
pub use version::{Direction, MigrationVersion};
