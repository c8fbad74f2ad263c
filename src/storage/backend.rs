use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::policy::{FixedRolePolicy, RolePolicy};
use crate::models::Role;

/// SeaORM 存储后端
///
/// 数据库连接在构造时注入，进程内不保存任何业务数据的副本。
pub struct SeaOrmBackend {
    pub(super) db: Arc<DatabaseConnection>,
    pub(super) role_policy: Arc<dyn RolePolicy>,
    pub(super) reconcile_invites: bool,
}

impl SeaOrmBackend {
    /// 默认策略：所有新用户都是 customer，不认领邀请
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            role_policy: Arc::new(FixedRolePolicy(Role::Customer)),
            reconcile_invites: false,
        }
    }

    pub fn with_role_policy(mut self, policy: Arc<dyn RolePolicy>) -> Self {
        self.role_policy = policy;
        self
    }

    pub fn with_invite_reconciliation(mut self, enabled: bool) -> Self {
        self.reconcile_invites = enabled;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}
