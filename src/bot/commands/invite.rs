use async_trait::async_trait;

use super::parse_username;
use crate::bot::dispatcher::{CommandContext, CommandHandler};
use crate::errors::AppError;
use crate::storage::UserRepository;

/// `/inviteclient @username`：为调用者登记一个客户
pub struct InviteClientCommand;

#[async_trait]
impl CommandHandler for InviteClientCommand {
    fn name(&self) -> &'static str {
        "inviteclient"
    }

    fn failure_reply(&self) -> &'static str {
        "Error inviting client"
    }

    async fn handle(&self, ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, AppError> {
        let Some(token) = args.first() else {
            return Err(AppError::Validation("Usage: /inviteclient @username".into()));
        };
        let username = parse_username(token)?;

        if ctx
            .storage
            .find_client_of(ctx.caller.id, username)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(format!(
                "Client {} is already invited",
                username
            )));
        }

        let invited = ctx.storage.create_invited(username, ctx.caller.id).await?;
        tracing::info!(
            user_id = invited.id,
            invited_by = ctx.caller.id,
            "Client invited: @{}",
            username
        );

        Ok(format!("Client {} invited successfully", username))
    }
}
