pub mod commands;
pub mod dispatcher;
pub mod telegram;


pub use dispatcher::{CommandContext, CommandHandler, CommandRouter, InboundMessage};
pub use telegram::run_polling;
