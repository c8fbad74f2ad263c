use async_trait::async_trait;

use super::format_visit_time;
use crate::bot::dispatcher::{CommandContext, CommandHandler};
use crate::errors::AppError;
use crate::storage::{UserRepository, VisitRepository};

pub struct ClientsCommand;

#[async_trait]
impl CommandHandler for ClientsCommand {
    fn name(&self) -> &'static str {
        "clients"
    }

    fn failure_reply(&self) -> &'static str {
        "Error retrieving clients"
    }

    async fn handle(&self, ctx: &CommandContext<'_>, _args: &[&str]) -> Result<String, AppError> {
        let clients = ctx.storage.list_clients_of(ctx.caller.id).await?;
        if clients.is_empty() {
            return Ok("No clients found".to_string());
        }

        let mut reply = String::from("Your clients:\n");
        for client in &clients {
            reply.push_str(&format!("- @{}", client.username));
            if let Some(visit) = ctx.storage.latest_scheduled_visit(client.id).await? {
                reply.push_str(&format!(
                    " (visit: {})",
                    format_visit_time(&visit.visit_date, ctx.utc_offset)
                ));
            }
            reply.push('\n');
        }

        Ok(reply)
    }
}
