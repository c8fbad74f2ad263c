use sea_orm::entity::prelude::*;

use crate::models::Role;

/// 被邀请但还没和 bot 说过话的用户使用的占位 telegram_id
pub const PLACEHOLDER_TELEGRAM_ID: i64 = 0;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub telegram_id: i64,
    pub username: String,
    pub role: String,
    pub invited_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::visits::Entity")]
    Visits,
}

impl Related<super::visits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Visits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 数据库里的角色字符串无法识别时返回 None
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn is_placeholder(&self) -> bool {
        self.telegram_id == PLACEHOLDER_TELEGRAM_ID
    }
}
