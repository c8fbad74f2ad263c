use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entities::{users, visits};
use crate::errors::AppError;
use crate::models::Role;

/// 用户仓储
///
/// 每个方法都是一次独立的数据库操作，并发安全完全依赖数据库本身。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 按 telegram_id 查找用户，不存在则按角色策略创建
    async fn fetch_or_create(&self, telegram_id: i64, username: &str)
    -> Result<users::Model, AppError>;

    /// 把占位的被邀请用户绑定到真实 telegram_id（显式步骤）
    async fn claim_invitation(
        &self,
        telegram_id: i64,
        username: &str,
    ) -> Result<Option<users::Model>, AppError>;

    async fn update_role(&self, telegram_id: i64, role: Role) -> Result<(), AppError>;

    /// 创建被邀请用户（角色 client，尚无 telegram_id）
    async fn create_invited(&self, username: &str, invited_by: i32)
    -> Result<users::Model, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, AppError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<users::Model>, AppError>;

    /// 某个用户邀请的全部 client
    async fn list_clients_of(&self, referrer_id: i32) -> Result<Vec<users::Model>, AppError>;

    async fn find_client_of(
        &self,
        referrer_id: i32,
        username: &str,
    ) -> Result<Option<users::Model>, AppError>;
}

/// 预约仓储
#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn create_visit(
        &self,
        user_id: i32,
        visit_date: DateTime<Utc>,
    ) -> Result<visits::Model, AppError>;

    /// `now` 之后且仍为 scheduled 的预约，按时间升序
    async fn list_upcoming_visits(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<visits::Model>, AppError>;

    /// 时间最晚的 scheduled 预约
    async fn latest_scheduled_visit(&self, user_id: i32)
    -> Result<Option<visits::Model>, AppError>;
}
