use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use super::{format_visit_time, parse_username};
use crate::bot::dispatcher::{CommandContext, CommandHandler};
use crate::errors::AppError;
use crate::storage::{UserRepository, VisitRepository};

const USAGE: &str = "Usage: /visit YYYY-MM-DD HH:MM @username";
const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// `/visit YYYY-MM-DD HH:MM @username`：为自己的客户安排一次到店
pub struct VisitCommand;

/// 把本地日期和时间解析为 UTC 时间点
fn parse_visit_time(date: &str, time: &str, offset: FixedOffset) -> Result<DateTime<Utc>, AppError> {
    let invalid = || AppError::Validation(format!("Invalid date or time. {}", USAGE));

    let local = NaiveDateTime::parse_from_str(&format!("{} {}", date, time), INPUT_FORMAT)
        .map_err(|_| invalid())?;
    let at = offset.from_local_datetime(&local).single().ok_or_else(invalid)?;
    Ok(at.with_timezone(&Utc))
}

#[async_trait]
impl CommandHandler for VisitCommand {
    fn name(&self) -> &'static str {
        "visit"
    }

    fn failure_reply(&self) -> &'static str {
        "Error scheduling visit"
    }

    async fn handle(&self, ctx: &CommandContext<'_>, args: &[&str]) -> Result<String, AppError> {
        let &[date, time, target] = args else {
            return Err(AppError::Validation(USAGE.into()));
        };
        let username = parse_username(target)?;
        let at = parse_visit_time(date, time, ctx.utc_offset)?;
        if at <= ctx.now {
            return Err(AppError::Validation(
                "Visit time must be in the future".into(),
            ));
        }

        let Some(client) = ctx.storage.find_client_of(ctx.caller.id, username).await? else {
            // 区分“不存在”和“不是你的客户”
            let known = ctx.storage.find_by_username(username).await?.is_some();
            return Err(if known {
                AppError::Validation(format!("@{} is not your client", username))
            } else {
                AppError::NotFound(format!("User @{} not found", username))
            });
        };

        let visit = ctx.storage.create_visit(client.id, at).await?;
        tracing::info!(
            visit_id = visit.id,
            client_id = client.id,
            scheduled_by = ctx.caller.id,
            "Visit scheduled"
        );

        Ok(format!(
            "Visit for @{} scheduled on {}",
            username,
            format_visit_time(&visit.visit_date, ctx.utc_offset)
        ))
    }
}
