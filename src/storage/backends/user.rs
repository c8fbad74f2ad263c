use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::errors::AppError;
use crate::models::Role;
use crate::storage::entities::users::PLACEHOLDER_TELEGRAM_ID;
use crate::storage::entities::{prelude::*, *};
use crate::storage::policy::NewUser;
use crate::storage::repository::UserRepository;

use super::super::backend::SeaOrmBackend;

impl SeaOrmBackend {
    async fn find_by_telegram_id<C: ConnectionTrait>(
        conn: &C,
        telegram_id: i64,
    ) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::TelegramId.eq(telegram_id))
            .order_by_asc(users::Column::Id)
            .one(conn)
            .await
    }

    /// 插入新用户；唯一索引冲突（并发请求已插入同一身份）时读取已有记录
    pub(crate) async fn register(
        &self,
        telegram_id: i64,
        username: &str,
    ) -> Result<users::Model, AppError> {
        match self.insert_user(telegram_id, username).await {
            Ok(user) => Ok(user),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(telegram_id, "User registered concurrently, re-reading");
                Self::find_by_telegram_id(self.db.as_ref(), telegram_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!("User {} vanished after conflict", telegram_id))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_user(&self, telegram_id: i64, username: &str) -> Result<users::Model, DbErr> {
        // 判断是否首个用户和插入放在同一事务里
        let txn = self.db.begin().await?;
        let is_first = Users::find().count(&txn).await? == 0;
        let role = self.role_policy.initial_role(&NewUser {
            telegram_id,
            username,
            is_first,
        });

        let user = users::ActiveModel {
            telegram_id: Set(telegram_id),
            username: Set(username.to_string()),
            role: Set(role.as_str().to_string()),
            invited_by: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(
            user_id = user.id,
            telegram_id,
            role = %role,
            "New user registered: @{}",
            username
        );
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for SeaOrmBackend {
    async fn fetch_or_create(
        &self,
        telegram_id: i64,
        username: &str,
    ) -> Result<users::Model, AppError> {
        if let Some(user) = Self::find_by_telegram_id(self.db.as_ref(), telegram_id).await? {
            return Ok(user);
        }

        if self.reconcile_invites
            && let Some(user) = self.claim_invitation(telegram_id, username).await?
        {
            return Ok(user);
        }

        self.register(telegram_id, username).await
    }

    async fn claim_invitation(
        &self,
        telegram_id: i64,
        username: &str,
    ) -> Result<Option<users::Model>, AppError> {
        if username.is_empty() || telegram_id == PLACEHOLDER_TELEGRAM_ID {
            return Ok(None);
        }

        let txn = self.db.begin().await?;

        // 这个身份已经有自己的记录，不再绑定占位记录
        if Self::find_by_telegram_id(&txn, telegram_id).await?.is_some() {
            return Ok(None);
        }

        let placeholder = Users::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::TelegramId.eq(PLACEHOLDER_TELEGRAM_ID))
            .order_by_asc(users::Column::Id)
            .one(&txn)
            .await?;
        let Some(placeholder) = placeholder else {
            return Ok(None);
        };

        // 条件里再带上占位 id，另一个请求抢先认领时这里更新 0 行
        let result = Users::update_many()
            .col_expr(users::Column::TelegramId, Expr::value(telegram_id))
            .filter(users::Column::Id.eq(placeholder.id))
            .filter(users::Column::TelegramId.eq(PLACEHOLDER_TELEGRAM_ID))
            .exec(&txn)
            .await;
        let rows_affected = match result {
            Ok(result) => result.rows_affected,
            // 并发请求已用这个身份注册
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => 0,
            Err(e) => return Err(e.into()),
        };
        if rows_affected == 0 {
            return Ok(None);
        }

        let claimed = Users::find_by_id(placeholder.id).one(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            user_id = placeholder.id,
            telegram_id,
            "Invitation claimed by @{}",
            username
        );
        Ok(claimed)
    }

    async fn update_role(&self, telegram_id: i64, role: Role) -> Result<(), AppError> {
        // 占位 id 被所有未认领的邀请共用
        if telegram_id == PLACEHOLDER_TELEGRAM_ID {
            return Err(AppError::Validation(
                "Cannot change the role of an invited user before they join".into(),
            ));
        }

        let result = Users::update_many()
            .col_expr(users::Column::Role, Expr::value(role.as_str()))
            .filter(users::Column::TelegramId.eq(telegram_id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "No user with telegram id {}",
                telegram_id
            )));
        }
        Ok(())
    }

    async fn create_invited(
        &self,
        username: &str,
        invited_by: i32,
    ) -> Result<users::Model, AppError> {
        let user = users::ActiveModel {
            telegram_id: Set(PLACEHOLDER_TELEGRAM_ID),
            username: Set(username.to_string()),
            role: Set(Role::Client.as_str().to_string()),
            invited_by: Set(Some(invited_by)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let result = user.insert(self.db.as_ref()).await?;
        Ok(result)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, AppError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .order_by_asc(users::Column::Id)
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<users::Model>, AppError> {
        let users = Users::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .order_by_asc(users::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(users)
    }

    async fn list_clients_of(&self, referrer_id: i32) -> Result<Vec<users::Model>, AppError> {
        let clients = Users::find()
            .filter(users::Column::Role.eq(Role::Client.as_str()))
            .filter(users::Column::InvitedBy.eq(referrer_id))
            .order_by_asc(users::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(clients)
    }

    async fn find_client_of(
        &self,
        referrer_id: i32,
        username: &str,
    ) -> Result<Option<users::Model>, AppError> {
        let client = Users::find()
            .filter(users::Column::Role.eq(Role::Client.as_str()))
            .filter(users::Column::InvitedBy.eq(referrer_id))
            .filter(users::Column::Username.eq(username))
            .order_by_asc(users::Column::Id)
            .one(self.db.as_ref())
            .await?;
        Ok(client)
    }
}
