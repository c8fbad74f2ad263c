//! 已应用迁移记录表 `schema_migrations`

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

pub mod schema_migrations {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "schema_migrations")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub version: String,
        pub applied_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version VARCHAR(255) PRIMARY KEY,
    applied_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
)";

/// 迁移记录存储
///
/// 所有方法对连接类型泛型，既可以直接用数据库连接，也可以放进事务里。
pub struct SchemaStore;

impl SchemaStore {
    /// 建表（幂等，每次启动都可以调用）
    pub async fn ensure_table<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
        conn.execute_unprepared(CREATE_TABLE_SQL).await?;
        Ok(())
    }

    /// 记录已应用版本；版本已存在时什么也不做
    pub async fn record_applied<C: ConnectionTrait>(
        conn: &C,
        version: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let record = schema_migrations::ActiveModel {
            version: Set(version.to_string()),
            applied_at: Set(applied_at.into()),
        };

        schema_migrations::Entity::insert(record)
            .on_conflict(
                OnConflict::column(schema_migrations::Column::Version)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// 版本号 -> 应用时间
    pub async fn list_applied<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<BTreeMap<String, DateTime<FixedOffset>>, DbErr> {
        let rows = schema_migrations::Entity::find()
            .order_by_asc(schema_migrations::Column::Version)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.version, row.applied_at))
            .collect())
    }

    /// 删除记录（仅回滚时使用），返回删除的行数
    pub async fn remove_applied<C: ConnectionTrait>(conn: &C, version: &str) -> Result<u64, DbErr> {
        let result = schema_migrations::Entity::delete_by_id(version.to_string())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
