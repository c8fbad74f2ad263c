use async_trait::async_trait;

use super::format_visit_time;
use crate::bot::dispatcher::{CommandContext, CommandHandler};
use crate::errors::AppError;
use crate::storage::VisitRepository;

const WELCOME: &str = "Welcome to the Barbershop Bot!
Use /inviteclient @username to save a client.
Use /clients to get the list of your clients.
Use /visit YYYY-MM-DD HH:MM @username to schedule a visit.
";

pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    fn name(&self) -> &'static str {
        "start"
    }

    async fn handle(&self, ctx: &CommandContext<'_>, _args: &[&str]) -> Result<String, AppError> {
        let mut reply = String::from(WELCOME);

        let upcoming = ctx
            .storage
            .list_upcoming_visits(ctx.caller.id, ctx.now)
            .await?;
        if !upcoming.is_empty() {
            reply.push_str("\nYour upcoming visits:\n");
            for visit in &upcoming {
                reply.push_str(&format!(
                    "- {}\n",
                    format_visit_time(&visit.visit_date, ctx.utc_offset)
                ));
            }
        }

        Ok(reply)
    }
}
