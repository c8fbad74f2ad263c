pub mod modes;
pub mod shutdown;
pub mod startup;

pub use modes::{build_router, rollback, run_bot, run_migrations};
pub use shutdown::listen_for_shutdown;
pub use startup::{StartupContext, prepare};
