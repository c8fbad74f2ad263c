mod clients;
mod invite;
mod start;
mod visit;

pub use clients::ClientsCommand;
pub use invite::InviteClientCommand;
pub use start::StartCommand;
pub use visit::VisitCommand;

use chrono::FixedOffset;
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::errors::AppError;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// `@bob` / `bob` -> `bob`
fn parse_username(token: &str) -> Result<&str, AppError> {
    let name = token.strip_prefix('@').unwrap_or(token);
    if name.is_empty() || name.contains('@') {
        return Err(AppError::Validation("Invalid username".into()));
    }
    Ok(name)
}

/// 按配置的时区显示时间
fn format_visit_time(at: &DateTimeWithTimeZone, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(DISPLAY_FORMAT).to_string()
}
