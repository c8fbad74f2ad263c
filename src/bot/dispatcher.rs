use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_attributes::instrument;

use super::commands::{ClientsCommand, InviteClientCommand, StartCommand, VisitCommand};
use crate::errors::AppError;
use crate::storage::entities::users;
use crate::storage::{SeaOrmBackend, UserRepository};

pub const UNKNOWN_COMMAND_REPLY: &str = "Unknown command. Use /start or start for help.";
pub const GENERIC_FAILURE_REPLY: &str = "Something went wrong, please try again later";

/// 与传输层无关的入站消息
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub sender_id: i64,
    pub username: String,
    pub text: String,
}

/// 单次命令处理的上下文
pub struct CommandContext<'a> {
    pub storage: &'a SeaOrmBackend,
    /// 发送者对应的用户记录（已 fetch-or-create）
    pub caller: &'a users::Model,
    pub utc_offset: FixedOffset,
    pub now: DateTime<Utc>,
}

/// 命令处理器
///
/// `handle` 返回的 `Ok` 文本直接作为回复；`Validation` / `NotFound` 错误的文本也会原样回复，
/// 其余错误记录日志后回复 `failure_reply()`。
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// 命令名（不含前导 `/`）
    fn name(&self) -> &'static str;

    fn failure_reply(&self) -> &'static str {
        GENERIC_FAILURE_REPLY
    }

    async fn handle(&self, ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, AppError>;
}

/// 命令路由表：命令名 -> 处理器
pub struct CommandRouter {
    storage: Arc<SeaOrmBackend>,
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
    utc_offset: FixedOffset,
}

impl CommandRouter {
    /// 空路由表
    pub fn new(storage: Arc<SeaOrmBackend>, utc_offset: FixedOffset) -> Self {
        Self {
            storage,
            handlers: HashMap::new(),
            utc_offset,
        }
    }

    /// 注册 start / inviteclient / clients / visit
    pub fn with_default_commands(storage: Arc<SeaOrmBackend>, utc_offset: FixedOffset) -> Self {
        let mut router = Self::new(storage, utc_offset);
        router.register(Box::new(StartCommand));
        router.register(Box::new(InviteClientCommand));
        router.register(Box::new(ClientsCommand));
        router.register(Box::new(VisitCommand));
        router
    }

    /// 注册处理器，同名处理器会被替换
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 处理一条入站消息并返回回复文本，永远不会失败
    #[instrument(skip_all, fields(chat_id = message.chat_id, sender_id = message.sender_id))]
    pub async fn dispatch(&self, message: &InboundMessage) -> String {
        self.dispatch_at(message, Utc::now()).await
    }

    pub async fn dispatch_at(&self, message: &InboundMessage, now: DateTime<Utc>) -> String {
        let caller = match self
            .storage
            .fetch_or_create(message.sender_id, &message.username)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Error getting user: {}", e.format_simple());
                return GENERIC_FAILURE_REPLY.to_string();
            }
        };

        let Some((name, args)) = split_command(&message.text) else {
            return UNKNOWN_COMMAND_REPLY.to_string();
        };
        let Some(handler) = self.handlers.get(name) else {
            tracing::debug!(command = name, "Unknown command");
            return UNKNOWN_COMMAND_REPLY.to_string();
        };

        let ctx = CommandContext {
            storage: self.storage.as_ref(),
            caller: &caller,
            utc_offset: self.utc_offset,
            now,
        };

        match handler.handle(&ctx, &args).await {
            Ok(reply) => reply,
            Err(e) if e.is_user_facing() => {
                tracing::debug!(command = name, "Rejected: {}", e);
                e.to_string()
            }
            Err(e) => {
                tracing::error!(command = name, "Command failed: {}", e.format_simple());
                handler.failure_reply().to_string()
            }
        }
    }
}

/// 拆出命令名与参数：去掉前导 `/` 和 `@botname` 后缀
fn split_command(text: &str) -> Option<(&str, Vec<&str>)> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    let first = first.strip_prefix('/').unwrap_or(first);
    let name = first.split_once('@').map_or(first, |(name, _)| name);
    if name.is_empty() {
        return None;
    }
    Some((name, tokens.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("start"), Some(("start", vec![])));
        assert_eq!(split_command("/start"), Some(("start", vec![])));
        assert_eq!(
            split_command("/inviteclient@barber_bot  @bob"),
            Some(("inviteclient", vec!["@bob"]))
        );
        assert_eq!(
            split_command("visit 2030-01-02 10:30 @bob"),
            Some(("visit", vec!["2030-01-02", "10:30", "@bob"]))
        );
    }

    #[test]
    fn test_split_command_empty() {
        assert_eq!(split_command(""), None);
        assert_eq!(split_command("   "), None);
        assert_eq!(split_command("/"), None);
        assert_eq!(split_command("/@barber_bot"), None);
    }

    #[test]
    fn test_split_command_is_case_sensitive() {
        assert_eq!(split_command("/Start"), Some(("Start", vec![])));
    }
}
