//! 新用户初始角色策略
//!
//! 两种历史行为（按保留用户名 / 首个用户提升角色，或者统一使用固定角色）
//! 都实现为可替换的策略，仓储代码本身不关心具体规则。

use std::sync::Arc;

use crate::config::{BootstrapConfig, RolePolicyKind};
use crate::models::Role;

/// 即将创建的用户
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub telegram_id: i64,
    pub username: &'a str,
    /// 创建时 users 表为空
    pub is_first: bool,
}

pub trait RolePolicy: Send + Sync {
    fn initial_role(&self, user: &NewUser<'_>) -> Role;
}

/// 保留用户名 -> admin，第一个用户 -> `first_user_role`，其余 -> `default_role`
#[derive(Debug, Clone)]
pub struct PromotingPolicy {
    pub admin_username: Option<String>,
    pub first_user_role: Role,
    pub default_role: Role,
}

impl RolePolicy for PromotingPolicy {
    fn initial_role(&self, user: &NewUser<'_>) -> Role {
        if self
            .admin_username
            .as_deref()
            .is_some_and(|name| name == user.username)
        {
            Role::Admin
        } else if user.is_first {
            self.first_user_role
        } else {
            self.default_role
        }
    }
}

/// 所有新用户使用同一个角色
#[derive(Debug, Clone, Copy)]
pub struct FixedRolePolicy(pub Role);

impl RolePolicy for FixedRolePolicy {
    fn initial_role(&self, _user: &NewUser<'_>) -> Role {
        self.0
    }
}

/// 根据配置构造策略
pub fn policy_from_config(config: &BootstrapConfig) -> Arc<dyn RolePolicy> {
    match config.policy {
        RolePolicyKind::Promote => Arc::new(PromotingPolicy {
            admin_username: config.admin_username.clone(),
            first_user_role: config.first_user_role,
            default_role: config.default_role,
        }),
        RolePolicyKind::Fixed => Arc::new(FixedRolePolicy(config.default_role)),
    }
}
